//! Policy engine - evaluates a password against a named profile.

use std::collections::BTreeMap;

use secrecy::SecretString;
use serde::Serialize;
use thiserror::Error;

use crate::denylist::Denylist;
use crate::sections::{character_variety_section, denylist_section, length_section};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Unknown policy profile '{0}'")]
    UnknownProfile(String),
}

/// Named set of minimum requirements. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyProfile {
    name: String,
    min_length: usize,
    min_classes: u8,
    denylist: Denylist,
}

impl PolicyProfile {
    /// Builds a profile. `min_classes` above 4 is clamped to 4.
    pub fn new(name: impl Into<String>, min_length: usize, min_classes: u8, denylist: Denylist) -> Self {
        Self {
            name: name.into(),
            min_length,
            min_classes: min_classes.min(4),
            denylist,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn min_classes(&self) -> u8 {
        self.min_classes
    }

    pub fn denylist(&self) -> &Denylist {
        &self.denylist
    }

    /// NIST-style baseline: 8 characters, 3 character types.
    pub fn nist() -> Self {
        Self::new("NIST", 8, 3, Denylist::common())
    }

    /// PCI DSS: 7 characters, all 4 character types.
    pub fn pci() -> Self {
        Self::new("PCI", 7, 4, Denylist::common())
    }

    /// Strict in-house profile: 12 characters, all 4 character types.
    pub fn custom() -> Self {
        Self::new("Custom", 12, 4, Denylist::common())
    }

    /// Profile applied when none is named: 12 characters, 3 character types.
    pub fn default_profile() -> Self {
        Self::new(PolicyCatalog::DEFAULT_PROFILE, 12, 3, Denylist::common())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyFinding {
    pub profile_name: String,
    pub length_satisfied: bool,
    pub class_count_satisfied: bool,
    pub is_denylisted: bool,
    pub overall_pass: bool,
    /// One entry per failed section.
    pub reasons: Vec<String>,
}

/// Evaluates `password` against `profile`. Pure, never touches disk or network.
pub fn evaluate_policy(password: &SecretString, profile: &PolicyProfile) -> PolicyFinding {
    let length = length_section(password, profile.min_length);
    let variety = character_variety_section(password, profile.min_classes);
    let denylist = denylist_section(password, &profile.denylist);

    let length_satisfied = length.is_none();
    let class_count_satisfied = variety.is_none();
    let is_denylisted = denylist.is_some();

    PolicyFinding {
        profile_name: profile.name.clone(),
        length_satisfied,
        class_count_satisfied,
        is_denylisted,
        overall_pass: length_satisfied && class_count_satisfied && !is_denylisted,
        reasons: [denylist, length, variety].into_iter().flatten().collect(),
    }
}

/// Profiles available for selection by name.
#[derive(Debug, Clone, Default)]
pub struct PolicyCatalog {
    profiles: BTreeMap<String, PolicyProfile>,
}

impl PolicyCatalog {
    pub const DEFAULT_PROFILE: &'static str = "Default";

    /// `NIST`, `PCI`, `Custom` and `Default`.
    pub fn builtin() -> Self {
        let mut catalog = Self::default();
        catalog.insert(PolicyProfile::nist());
        catalog.insert(PolicyProfile::pci());
        catalog.insert(PolicyProfile::custom());
        catalog.insert(PolicyProfile::default_profile());
        catalog
    }

    /// Adds a profile, replacing any existing one with the same name.
    pub fn insert(&mut self, profile: PolicyProfile) {
        let _ = self.profiles.insert(profile.name.clone(), profile);
    }

    pub fn get(&self, name: &str) -> Result<&PolicyProfile, PolicyError> {
        self.profiles
            .get(name)
            .ok_or_else(|| PolicyError::UnknownProfile(name.to_string()))
    }

    /// Looks up `name`, or the `Default` profile when no name is given.
    pub fn resolve(&self, name: Option<&str>) -> Result<&PolicyProfile, PolicyError> {
        self.get(name.unwrap_or(Self::DEFAULT_PROFILE))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}
