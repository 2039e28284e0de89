//! Strength scorer - entropy, composite score and classification.

use std::collections::BTreeMap;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use strum::{Display, EnumString};

use crate::classes::CharacterClasses;
use crate::config::ScoringConfig;

const MAX_SCORE: u64 = 100;

/// Strength bands, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrengthFinding {
    /// Length in characters, not bytes.
    pub length: usize,
    /// Shannon entropy of the password's own character distribution.
    ///
    /// This measures how varied the characters are, it is not a
    /// brute-force keyspace estimate.
    pub entropy_bits: f64,
    pub class_count: u8,
    pub score: u8,
    pub classification: Classification,
}

impl StrengthFinding {
    /// Same finding with the classification forced to `WEAK`, score untouched.
    pub fn downgraded(self) -> Self {
        Self {
            classification: Classification::Weak,
            ..self
        }
    }
}

/// Shannon entropy in bits over the character frequencies of `password`.
///
/// Returns 0 for an empty password or a single repeated character.
pub fn shannon_entropy(password: &str) -> f64 {
    // BTreeMap keeps the summation order, and so the result, deterministic.
    let mut counts: BTreeMap<char, usize> = BTreeMap::new();
    let mut length = 0usize;
    for c in password.chars() {
        *counts.entry(c).or_default() += 1;
        length += 1;
    }
    if length == 0 {
        return 0.0;
    }

    let length = length as f64;
    counts.values().fold(0.0, |entropy, &count| {
        let probability = count as f64 / length;
        entropy - probability * probability.log2()
    })
}

impl ScoringConfig {
    /// Composite score, clamped to 0..=100.
    pub fn composite_score(&self, length: usize, class_count: u8) -> u8 {
        let length_points = (length as u64).saturating_mul(u64::from(self.length_weight));
        let class_points = u64::from(class_count) * u64::from(self.class_weight);
        length_points.saturating_add(class_points).min(MAX_SCORE) as u8
    }

    pub fn classify(&self, score: u8) -> Classification {
        let t = &self.thresholds;
        if score >= t.very_strong {
            Classification::VeryStrong
        } else if score >= t.strong {
            Classification::Strong
        } else if score >= t.moderate {
            Classification::Moderate
        } else {
            Classification::Weak
        }
    }
}

/// Scores a password. Total and side-effect free.
pub fn score_password_strength(password: &SecretString, config: &ScoringConfig) -> StrengthFinding {
    let pwd = password.expose_secret();

    let length = pwd.chars().count();
    let class_count = CharacterClasses::of(pwd).count();
    let score = config.composite_score(length, class_count);

    StrengthFinding {
        length,
        entropy_bits: shannon_entropy(pwd),
        class_count,
        score,
        classification: config.classify(score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrengthThresholds;

    fn secret(s: &str) -> SecretString {
        SecretString::new(s.to_string().into())
    }

    fn score(s: &str) -> StrengthFinding {
        score_password_strength(&secret(s), &ScoringConfig::default())
    }

    #[test]
    fn test_score_empty_password() {
        let finding = score("");
        assert_eq!(finding.length, 0);
        assert_eq!(finding.entropy_bits, 0.0);
        assert_eq!(finding.score, 0);
        assert_eq!(finding.classification, Classification::Weak);
    }

    #[test]
    fn test_entropy_values() {
        assert_eq!(shannon_entropy("aaaa"), 0.0);
        assert!((shannon_entropy("ab") - 1.0).abs() < 1e-12);
        assert!((shannon_entropy("abcd") - 2.0).abs() < 1e-12);
        // "aab": -(2/3 log2 2/3 + 1/3 log2 1/3)
        assert!((shannon_entropy("aab") - 0.918_295_834_054_489_6).abs() < 1e-12);
    }

    #[test]
    fn test_entropy_counts_characters_not_bytes() {
        assert!((shannon_entropy("éa") - 1.0).abs() < 1e-12);
        assert_eq!(score("éé").length, 2);
    }

    #[test]
    fn test_score_weak_common_password() {
        let finding = score("password");
        assert_eq!(finding.class_count, 1);
        assert_eq!(finding.score, 47);
        assert_eq!(finding.classification, Classification::Moderate);
    }

    #[test]
    fn test_score_short_password() {
        let finding = score("abc");
        assert_eq!(finding.score, 27);
        assert_eq!(finding.classification, Classification::Weak);
    }

    #[test]
    fn test_score_clamped_at_100() {
        let finding = score("Tr0ub4dor&3xyz!");
        assert_eq!(finding.length, 15);
        assert_eq!(finding.class_count, 4);
        assert_eq!(finding.score, 100);
        assert_eq!(finding.classification, Classification::VeryStrong);

        let huge = ScoringConfig {
            length_weight: u32::MAX,
            ..ScoringConfig::default()
        };
        assert_eq!(huge.composite_score(usize::MAX, 4), 100);
    }

    #[test]
    fn test_classification_thresholds() {
        let config = ScoringConfig::default();
        assert_eq!(config.classify(0), Classification::Weak);
        assert_eq!(config.classify(39), Classification::Weak);
        assert_eq!(config.classify(40), Classification::Moderate);
        assert_eq!(config.classify(59), Classification::Moderate);
        assert_eq!(config.classify(60), Classification::Strong);
        assert_eq!(config.classify(79), Classification::Strong);
        assert_eq!(config.classify(80), Classification::VeryStrong);
        assert_eq!(config.classify(100), Classification::VeryStrong);
    }

    #[test]
    fn test_custom_weights_and_thresholds() {
        let config = ScoringConfig {
            length_weight: 2,
            class_weight: 10,
            thresholds: StrengthThresholds {
                very_strong: 90,
                strong: 70,
                moderate: 30,
            },
            denylisted_is_weak: true,
        };
        let finding = score_password_strength(&secret("Password1"), &config);
        assert_eq!(finding.score, 9 * 2 + 3 * 10);
        assert_eq!(finding.classification, Classification::Moderate);
    }

    #[test]
    fn test_score_monotonic_in_length_and_classes() {
        let config = ScoringConfig::default();
        for classes in 0..=4u8 {
            for length in 0..40usize {
                let here = config.composite_score(length, classes);
                assert!(here <= 100);
                assert!(config.composite_score(length + 1, classes) >= here);
                if classes < 4 {
                    assert!(config.composite_score(length, classes + 1) >= here);
                }
            }
        }
    }

    #[test]
    fn test_classification_display() {
        assert_eq!(Classification::VeryStrong.to_string(), "VERY_STRONG");
        assert_eq!("WEAK".parse::<Classification>(), Ok(Classification::Weak));
        assert!(Classification::VeryStrong > Classification::Strong);
    }
}
