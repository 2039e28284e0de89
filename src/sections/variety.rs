//! Character variety section - checks how many character classes are present.

use secrecy::{ExposeSecret, SecretString};
use super::SectionResult;
use crate::classes::CharacterClasses;

/// Checks if the password contains at least `min_classes` character classes.
///
/// # Returns
/// - `Some(reason)` if too few classes are present, naming the missing ones
/// - `None` if the requirement is met
pub fn character_variety_section(password: &SecretString, min_classes: u8) -> SectionResult {
    let classes = CharacterClasses::of(password.expose_secret());
    let count = classes.count();

    if count < min_classes {
        return Some(format!(
            "Needs {} character types, has {}/4 (missing: {})",
            min_classes,
            count,
            classes.missing().join(", ")
        ));
    }
    None
}
