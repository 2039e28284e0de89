//! Policy evaluation sections
//!
//! Each section checks one requirement of a policy profile.

mod denylist;
mod length;
mod variety;

pub use denylist::denylist_section;
pub use length::length_section;
pub use variety::character_variety_section;

/// Result type for section evaluation functions.
/// - `Some(reason)` - Section failed with reason
/// - `None` - Section passed
pub type SectionResult = Option<String>;
