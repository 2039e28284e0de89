//! Password audit library
//!
//! This library assesses candidate passwords in three ways:
//! an entropy-based strength score, a check against an organizational
//! policy profile, and an empirical dictionary attack run by an external
//! hashcat-compatible engine.
//!
//! # Features
//!
//! - `tracing` (default): Enables logging via tracing crate
//!
//! # Environment Variables
//!
//! - `PWD_AUDIT_ENGINE`: Cracking engine binary (default: `hashcat`)
//! - `PWD_AUDIT_WORDLIST`: Dictionary for the attack
//!   (default: `/usr/share/wordlists/rockyou.txt`)
//! - `PWD_AUDIT_DIGEST`: `md5`, `sha1` or `sha256` (default: `md5`)
//! - `PWD_AUDIT_TIMEOUT_MS`: Attack budget per password (default: `5000`)
//! - `PWD_AUDIT_ARTIFACT_DIR`: Where hash artifacts are written
//!   (default: system temp directory)
//! - `PWD_AUDIT_MAX_CONCURRENCY`: Engine runs allowed at once (default: `1`)
//!
//! # Example
//!
//! ```rust,no_run
//! use pwd_audit::{AuditConfig, Assessor, AssessmentReport};
//! use secrecy::SecretString;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AuditConfig::load(None)?;
//! let assessor = Assessor::from_config(&config)?;
//!
//! let password = SecretString::new("MyP@ssw0rd!".to_string().into());
//! let result = assessor
//!     .assess_named(&password, Some("NIST"), config.harness.timeout())
//!     .await?;
//!
//! println!("Strength: {}", result.strength.classification);
//! println!("Policy pass: {}", result.policy.overall_pass);
//! println!("Cracked: {}", result.crack.cracked);
//!
//! let report = AssessmentReport::from_results(vec![result]);
//! println!("{}", report.to_json()?);
//! # Ok(())
//! # }
//! ```

mod assessor;
mod classes;
mod config;
mod denylist;
mod harness;
mod policy;
mod report;
mod scorer;
mod sections;

// Public API
pub use assessor::{AssessError, AssessOptions, AssessmentResult, Assessor, RequestId};
pub use classes::CharacterClasses;
pub use config::{AuditConfig, ConfigError, HarnessConfig, ProfileConfig, ScoringConfig, StrengthThresholds};
pub use denylist::{COMMON_PASSWORDS, Denylist, DenylistError};
pub use harness::{CrackHarness, CrackOutcome, CrackTester, DigestAlgorithm, FailureReason};
pub use policy::{PolicyCatalog, PolicyError, PolicyFinding, PolicyProfile, evaluate_policy};
pub use report::{AssessmentReport, ReportSummary};
pub use scorer::{Classification, StrengthFinding, score_password_strength, shannon_entropy};
