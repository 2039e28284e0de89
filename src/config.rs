//! Configuration for scoring, policy profiles and the crack-test harness.
//!
//! Every value has a documented default. A TOML document may override any
//! of them, and a small set of environment variables can override harness
//! settings per deployment.
//!
//! ```toml
//! [scoring]
//! length_weight = 4
//! class_weight = 15
//!
//! [harness]
//! engine = "/usr/bin/hashcat"
//! wordlist = "/usr/share/wordlists/rockyou.txt"
//! digest = "md5"
//! timeout_ms = 30000
//! max_concurrent_cracks = 2
//!
//! [profiles.Internal]
//! min_length = 14
//! min_classes = 3
//! denylist = ["company", "welcome1"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::denylist::{Denylist, DenylistError};
use crate::harness::DigestAlgorithm;
use crate::policy::{PolicyCatalog, PolicyProfile};

pub const ENV_ENGINE: &str = "PWD_AUDIT_ENGINE";
pub const ENV_WORDLIST: &str = "PWD_AUDIT_WORDLIST";
pub const ENV_DIGEST: &str = "PWD_AUDIT_DIGEST";
pub const ENV_TIMEOUT_MS: &str = "PWD_AUDIT_TIMEOUT_MS";
pub const ENV_ARTIFACT_DIR: &str = "PWD_AUDIT_ARTIFACT_DIR";
pub const ENV_MAX_CONCURRENCY: &str = "PWD_AUDIT_MAX_CONCURRENCY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Profile '{profile}' requires {min_classes} character classes, at most 4 exist")]
    InvalidClassCount { profile: String, min_classes: u8 },
    #[error("Strength thresholds must satisfy moderate <= strong <= very_strong <= 100")]
    InvalidThresholds,
    #[error("max_concurrent_cracks must be at least 1")]
    InvalidConcurrency,
    #[error("Environment variable {name} has invalid value '{value}'")]
    InvalidEnv { name: &'static str, value: String },
    #[error("Profile '{profile}': {source}")]
    Denylist {
        profile: String,
        #[source]
        source: DenylistError,
    },
}

/// Score cut-offs for each classification, inclusive lower bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrengthThresholds {
    pub very_strong: u8,
    pub strong: u8,
    pub moderate: u8,
}

impl Default for StrengthThresholds {
    fn default() -> Self {
        Self {
            very_strong: 80,
            strong: 60,
            moderate: 40,
        }
    }
}

/// Weights of the composite strength score.
///
/// `score = clamp(length * length_weight + class_count * class_weight, 0, 100)`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    /// Points per character. Default: 4.
    pub length_weight: u32,
    /// Points per character class present. Default: 15.
    pub class_weight: u32,
    pub thresholds: StrengthThresholds,
    /// Classify denylisted passwords as `WEAK` whatever their score. Default: true.
    pub denylisted_is_weak: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            length_weight: 4,
            class_weight: 15,
            thresholds: StrengthThresholds::default(),
            denylisted_is_weak: true,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        if t.moderate <= t.strong && t.strong <= t.very_strong && t.very_strong <= 100 {
            Ok(())
        } else {
            Err(ConfigError::InvalidThresholds)
        }
    }
}

/// Settings for driving the external cracking engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Engine binary, resolved through `PATH` when relative. Default: `hashcat`.
    pub engine: PathBuf,
    /// Dictionary used by the attack. Default: `/usr/share/wordlists/rockyou.txt`.
    pub wordlist: PathBuf,
    pub digest: DigestAlgorithm,
    /// Flags placed before the mode/attack arguments of the attack run.
    pub attack_args: Vec<String>,
    /// Flags placed before the mode argument of the recovered-credential query.
    pub show_args: Vec<String>,
    /// Dedicated potfile, so crack state stays out of the operator's default one.
    pub potfile: Option<PathBuf>,
    /// Where hash artifacts are created. Default: the system temp directory.
    pub artifact_dir: Option<PathBuf>,
    /// Budget for the attack run. Default: 5000.
    pub timeout_ms: u64,
    /// Budget for the recovered-credential query. Default: 10000.
    pub show_timeout_ms: u64,
    /// Upper bound on engine runs in flight during batch assessment. Default: 1.
    pub max_concurrent_cracks: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            engine: PathBuf::from("hashcat"),
            wordlist: PathBuf::from("/usr/share/wordlists/rockyou.txt"),
            digest: DigestAlgorithm::default(),
            attack_args: vec!["--quiet".to_string(), "--force".to_string()],
            show_args: vec!["--show".to_string(), "--force".to_string()],
            potfile: None,
            artifact_dir: None,
            timeout_ms: 5_000,
            show_timeout_ms: 10_000,
            max_concurrent_cracks: 1,
        }
    }
}

impl HarnessConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn show_timeout(&self) -> Duration {
        Duration::from_millis(self.show_timeout_ms)
    }

    pub fn artifact_dir(&self) -> PathBuf {
        self.artifact_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_cracks == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        Ok(())
    }

    /// Applies `PWD_AUDIT_*` environment overrides on top of the current values.
    ///
    /// Priority:
    /// 1. Environment variable
    /// 2. Config file
    /// 3. Built-in default
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(engine) = env_value(ENV_ENGINE) {
            self.engine = PathBuf::from(engine);
        }
        if let Some(wordlist) = env_value(ENV_WORDLIST) {
            self.wordlist = PathBuf::from(wordlist);
        }
        if let Some(dir) = env_value(ENV_ARTIFACT_DIR) {
            self.artifact_dir = Some(PathBuf::from(dir));
        }
        if let Some(digest) = env_value(ENV_DIGEST) {
            self.digest = digest
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { name: ENV_DIGEST, value: digest })?;
        }
        if let Some(timeout) = env_value(ENV_TIMEOUT_MS) {
            self.timeout_ms = timeout
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { name: ENV_TIMEOUT_MS, value: timeout })?;
        }
        if let Some(limit) = env_value(ENV_MAX_CONCURRENCY) {
            self.max_concurrent_cracks = limit.parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_MAX_CONCURRENCY,
                value: limit,
            })?;
        }
        Ok(())
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// A profile as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    pub min_length: usize,
    pub min_classes: u8,
    /// Inline entries. When neither this nor `denylist_path` is given,
    /// the built-in common-password list applies.
    #[serde(default)]
    pub denylist: Option<Vec<String>>,
    /// Newline-separated file of entries, merged with `denylist`.
    #[serde(default)]
    pub denylist_path: Option<PathBuf>,
}

impl ProfileConfig {
    pub fn build(&self, name: &str) -> Result<PolicyProfile, ConfigError> {
        if self.min_classes > 4 {
            return Err(ConfigError::InvalidClassCount {
                profile: name.to_string(),
                min_classes: self.min_classes,
            });
        }

        let denylist = match (&self.denylist, &self.denylist_path) {
            (None, None) => Denylist::common(),
            (inline, path) => {
                let mut entries: Vec<String> = inline.clone().unwrap_or_default();
                if let Some(path) = path {
                    let loaded = Denylist::from_path(path).map_err(|source| ConfigError::Denylist {
                        profile: name.to_string(),
                        source,
                    })?;
                    entries.extend(loaded.iter().map(str::to_string));
                }
                Denylist::from_entries(entries)
            }
        };

        Ok(PolicyProfile::new(name, self.min_length, self.min_classes, denylist))
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    pub scoring: ScoringConfig,
    pub harness: HarnessConfig,
    pub profiles: BTreeMap<String, ProfileConfig>,
}

impl AuditConfig {
    /// Parses and validates a TOML document. Environment overrides are not applied.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Loads the file when given, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        config.harness.apply_env()?;
        config.validate()?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Audit config loaded: engine {:?}, digest {}, timeout {}ms, {} custom profiles",
            config.harness.engine,
            config.harness.digest,
            config.harness.timeout_ms,
            config.profiles.len()
        );

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()?;
        self.harness.validate()?;
        for (name, profile) in &self.profiles {
            if profile.min_classes > 4 {
                return Err(ConfigError::InvalidClassCount {
                    profile: name.clone(),
                    min_classes: profile.min_classes,
                });
            }
        }
        Ok(())
    }

    /// Built-in profiles with the configured ones layered on top.
    pub fn catalog(&self) -> Result<PolicyCatalog, ConfigError> {
        let mut catalog = PolicyCatalog::builtin();
        for (name, profile) in &self.profiles {
            catalog.insert(profile.build(name)?);
        }
        Ok(catalog)
    }
}
