//! Character classes shared by the strength scorer and the policy engine.

/// Presence flags for the four character classes.
///
/// Both [`crate::score_password_strength`] and [`crate::evaluate_policy`]
/// count classes through this type, so their counts always agree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharacterClasses {
    pub lowercase: bool,
    pub uppercase: bool,
    pub digit: bool,
    pub symbol: bool,
}

impl CharacterClasses {
    /// Scans a password once and records which classes appear.
    ///
    /// Letters and digits are ASCII only; every other character,
    /// including non-ASCII letters, counts as a symbol.
    pub fn of(password: &str) -> Self {
        password.chars().fold(Self::default(), |mut classes, c| {
            if c.is_ascii_lowercase() {
                classes.lowercase = true;
            } else if c.is_ascii_uppercase() {
                classes.uppercase = true;
            } else if c.is_ascii_digit() {
                classes.digit = true;
            } else {
                classes.symbol = true;
            }
            classes
        })
    }

    /// Number of classes present, 0 to 4.
    pub fn count(&self) -> u8 {
        [self.lowercase, self.uppercase, self.digit, self.symbol]
            .iter()
            .filter(|&&present| present)
            .count() as u8
    }

    /// Human-readable names of the classes that are absent.
    pub fn missing(&self) -> Vec<&'static str> {
        vec![
            if !self.uppercase { Some("uppercase") } else { None },
            if !self.lowercase { Some("lowercase") } else { None },
            if !self.digit { Some("numbers") } else { None },
            if !self.symbol { Some("special characters") } else { None },
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
