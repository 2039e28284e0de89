//! Denylist section - checks if password is a known common password.

use crate::denylist::Denylist;
use secrecy::{ExposeSecret, SecretString};
use super::SectionResult;

/// Checks if the password is on the profile's denylist, ignoring case.
///
/// # Returns
/// - `Some(reason)` if password is denylisted
/// - `None` if password is not on the denylist
pub fn denylist_section(password: &SecretString, denylist: &Denylist) -> SectionResult {
    if denylist.contains(password.expose_secret()) {
        return Some("Password is a known common password".to_string());
    }
    None
}
