//! Assessment coordinator - scorer, policy engine and crack test in one call.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::config::{AuditConfig, ConfigError, ScoringConfig};
use crate::harness::{CrackHarness, CrackOutcome, CrackTester};
use crate::policy::{PolicyCatalog, PolicyError, PolicyFinding, PolicyProfile, evaluate_policy};
use crate::scorer::{StrengthFinding, score_password_strength};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssessError {
    #[error("Password must not be empty")]
    EmptyPassword,
    #[error("Password must not contain control characters")]
    MalformedPassword,
    #[error("Unknown policy profile '{0}'")]
    UnknownProfile(String),
    #[error("Assessment task failed: {0}")]
    TaskFailed(String),
}

impl From<PolicyError> for AssessError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::UnknownProfile(name) => Self::UnknownProfile(name),
        }
    }
}

/// Opaque key of one assessment. Never derived from the password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssessOptions {
    /// Copy the plaintext password into the result for report display.
    pub echo_password: bool,
}

/// Everything learned about one password.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentResult {
    pub request_id: RequestId,
    pub strength: StrengthFinding,
    pub policy: PolicyFinding,
    pub crack: CrackOutcome,
    /// Only present when the caller opted in through [`AssessOptions`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub echoed_password: Option<String>,
}

struct Inner<T> {
    scoring: ScoringConfig,
    catalog: PolicyCatalog,
    tester: T,
    crack_permits: Semaphore,
}

/// Runs assessments. Cheap to clone; clones share the crack concurrency limit.
pub struct Assessor<T = CrackHarness> {
    inner: Arc<Inner<T>>,
    options: AssessOptions,
}

impl<T> Clone for Assessor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            options: self.options,
        }
    }
}

impl<T> fmt::Debug for Assessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assessor")
            .field("scoring", &self.inner.scoring)
            .field("available_crack_permits", &self.inner.crack_permits.available_permits())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Assessor<CrackHarness> {
    /// Builds an assessor driving the configured cracking engine.
    pub fn from_config(config: &AuditConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_tester(
            config.scoring.clone(),
            config.catalog()?,
            CrackHarness::new(config.harness.clone()),
            config.harness.max_concurrent_cracks,
        ))
    }
}

impl<T: CrackTester> Assessor<T> {
    /// `max_concurrent_cracks` below 1 is raised to 1.
    pub fn with_tester(scoring: ScoringConfig, catalog: PolicyCatalog, tester: T, max_concurrent_cracks: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                scoring,
                catalog,
                tester,
                crack_permits: Semaphore::new(max_concurrent_cracks.max(1)),
            }),
            options: AssessOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AssessOptions) -> Self {
        self.options = options;
        self
    }

    pub fn catalog(&self) -> &PolicyCatalog {
        &self.inner.catalog
    }

    /// Scores, checks policy and crack-tests one password.
    ///
    /// The crack test waits for a free slot before it starts, so `timeout`
    /// only bounds the engine run itself.
    ///
    /// # Errors
    ///
    /// [`AssessError::EmptyPassword`] or [`AssessError::MalformedPassword`]
    /// before any work is done.
    pub async fn assess(
        &self,
        password: &SecretString,
        profile: &PolicyProfile,
        timeout: Duration,
    ) -> Result<AssessmentResult, AssessError> {
        let pwd = password.expose_secret();
        if pwd.is_empty() {
            return Err(AssessError::EmptyPassword);
        }
        if pwd.chars().any(char::is_control) {
            return Err(AssessError::MalformedPassword);
        }

        let request_id = RequestId::new();

        #[cfg(feature = "tracing")]
        tracing::info!("Assessment {} started against profile {}", request_id, profile.name());

        let policy = evaluate_policy(password, profile);
        let mut strength = score_password_strength(password, &self.inner.scoring);
        if policy.is_denylisted && self.inner.scoring.denylisted_is_weak {
            strength = strength.downgraded();
        }

        let crack = {
            let _permit = match self.inner.crack_permits.acquire().await {
                Ok(permit) => permit,
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Assessment {} aborted: crack limiter closed", request_id);
                    return Err(AssessError::TaskFailed("crack concurrency limiter closed".to_string()));
                }
            };
            self.inner.tester.attempt_crack(password, timeout).await
        };

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Assessment {} finished: {} (score {}), policy {}, cracked {}{}",
            request_id,
            strength.classification,
            strength.score,
            if policy.overall_pass { "PASS" } else { "FAIL" },
            crack.cracked,
            crack
                .failure_reason
                .as_ref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default()
        );

        Ok(AssessmentResult {
            request_id,
            strength,
            policy,
            crack,
            echoed_password: self
                .options
                .echo_password
                .then(|| password.expose_secret().to_string()),
        })
    }

    /// Like [`Self::assess`], resolving the profile by name.
    ///
    /// `None` selects the `Default` profile.
    pub async fn assess_named(
        &self,
        password: &SecretString,
        profile_name: Option<&str>,
        timeout: Duration,
    ) -> Result<AssessmentResult, AssessError> {
        let profile = self.inner.catalog.resolve(profile_name)?;
        self.assess(password, profile, timeout).await
    }
}

impl<T: CrackTester + 'static> Assessor<T> {
    /// Assesses every password on its own task.
    ///
    /// Returns exactly one entry per input, in input order. A failure
    /// affects only its own entry.
    pub async fn assess_batch(
        &self,
        passwords: Vec<SecretString>,
        profile: &PolicyProfile,
        timeout: Duration,
    ) -> Vec<Result<AssessmentResult, AssessError>> {
        let total = passwords.len();
        let profile = Arc::new(profile.clone());

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Batch of {} passwords started, at most {} crack tests at once",
            total,
            self.inner.crack_permits.available_permits()
        );

        let mut tasks = JoinSet::new();
        for (index, password) in passwords.into_iter().enumerate() {
            let assessor = self.clone();
            let profile = Arc::clone(&profile);
            let _ = tasks.spawn(async move { (index, assessor.assess(&password, &profile, timeout).await) });
        }

        let mut slots: Vec<Option<Result<AssessmentResult, AssessError>>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Assessment task failed: {}", _e);
                }
            }
        }

        slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| Err(AssessError::TaskFailed("task did not complete".to_string()))))
            .collect()
    }
}
