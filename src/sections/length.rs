//! Length section - checks password minimum length.

use secrecy::{ExposeSecret, SecretString};
use super::SectionResult;

/// Checks if the password meets the profile's minimum length.
///
/// Length is counted in characters.
///
/// # Returns
/// - `Some(reason)` if password is too short
/// - `None` if password has sufficient length
pub fn length_section(password: &SecretString, min_length: usize) -> SectionResult {
    let length = password.expose_secret().chars().count();
    if length < min_length {
        return Some(format!(
            "Password must be at least {} characters (has {})",
            min_length, length
        ));
    }
    None
}
