//! Crack-test harness
//!
//! Drives an external, hashcat-compatible engine through a short protocol:
//!
//! 1. **Prepare** - digest the password and write a private hash artifact
//! 2. **Invoke** - run a bounded dictionary attack against the artifact
//! 3. **Collect** - ask the engine which credentials it has recovered
//! 4. **Cleanup** - delete the artifact, on every exit path
//!
//! The attack's exit status is recorded but never interpreted: the engine
//! exits non-zero when it merely exhausts the dictionary, so only the
//! recovered-credential query decides whether the password was cracked.

mod artifact;
mod digest;
mod engine;

use std::ffi::OsString;
use std::future::Future;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::config::HarnessConfig;

use artifact::HashArtifact;
pub use digest::DigestAlgorithm;
use engine::{RunError, run_with_timeout};

/// Why a crack test did not produce a definitive answer.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The attack outlived its budget. Inconclusive, not proof of resistance.
    #[error("timed out before the dictionary was exhausted")]
    Timeout,
    #[error("cracking engine unavailable: {detail}")]
    EngineUnavailable { detail: String },
    #[error("wordlist not found: {path}")]
    WordlistMissing { path: String },
    #[error("hash artifact I/O failed: {detail}")]
    ArtifactIo { detail: String },
    #[error("cracking engine failed: {detail}")]
    EngineFailed { detail: String },
    #[error("recovered-credential query failed: {detail}")]
    RecoveryQueryFailed { detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrackOutcome {
    /// False when the engine could not even be started.
    pub attempted: bool,
    pub cracked: bool,
    /// Exit code of the attack run, when it finished on its own.
    pub engine_exit_status: Option<i32>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub failure_reason: Option<FailureReason>,
    /// Set when the artifact could not be deleted.
    pub cleanup_error: Option<String>,
}

impl CrackOutcome {
    pub fn not_attempted(reason: FailureReason) -> Self {
        Self {
            attempted: false,
            cracked: false,
            engine_exit_status: None,
            elapsed: Duration::ZERO,
            failure_reason: Some(reason),
            cleanup_error: None,
        }
    }

    fn attempted(engine_exit_status: Option<i32>) -> Self {
        Self {
            attempted: true,
            cracked: false,
            engine_exit_status,
            elapsed: Duration::ZERO,
            failure_reason: None,
            cleanup_error: None,
        }
    }

    pub fn timed_out(&self) -> bool {
        self.failure_reason == Some(FailureReason::Timeout)
    }

    /// The engine ran the whole dictionary and recovered nothing.
    pub fn resisted(&self) -> bool {
        self.attempted && !self.cracked && self.failure_reason.is_none()
    }
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

/// Anything able to crack-test a single password.
///
/// Implementations never fail: environment problems are reported
/// through [`CrackOutcome::failure_reason`].
pub trait CrackTester: Send + Sync {
    fn attempt_crack(&self, password: &SecretString, timeout: Duration) -> impl Future<Output = CrackOutcome> + Send;
}

/// Production [`CrackTester`] backed by an external engine binary.
#[derive(Debug, Clone)]
pub struct CrackHarness {
    config: HarnessConfig,
}

impl CrackHarness {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    fn common_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-m".into(), self.config.digest.hashcat_mode().to_string().into()];
        if let Some(potfile) = &self.config.potfile {
            args.push("--potfile-path".into());
            args.push(potfile.into());
        }
        args
    }

    fn attack_args(&self, artifact: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.config.attack_args.iter().map(Into::into).collect();
        args.extend(self.common_args());
        args.push("-a".into());
        args.push("0".into());
        args.push(artifact.into());
        args.push(self.config.wordlist.clone().into());
        args
    }

    fn show_args(&self, artifact: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.config.show_args.iter().map(Into::into).collect();
        args.extend(self.common_args());
        args.push(artifact.into());
        args
    }

    /// Runs one crack test. The artifact never outlives this call.
    pub async fn attempt_crack(&self, password: &SecretString, timeout: Duration) -> CrackOutcome {
        let started = Instant::now();

        if !self.config.wordlist.is_file() {
            #[cfg(feature = "tracing")]
            tracing::warn!("Crack test skipped: wordlist {:?} not found", self.config.wordlist);
            return finish(
                CrackOutcome::not_attempted(FailureReason::WordlistMissing {
                    path: self.config.wordlist.display().to_string(),
                }),
                started,
            );
        }

        let digest = self.config.digest.hex_digest(password.expose_secret().as_bytes());
        let created = HashArtifact::create_blocking(self.config.artifact_dir(), digest.clone(), password.clone()).await;
        let artifact = match created {
            Ok(artifact) => artifact,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Crack test skipped: cannot write hash artifact: {}", e);
                return finish(
                    CrackOutcome::not_attempted(FailureReason::ArtifactIo { detail: e.to_string() }),
                    started,
                );
            }
        };

        let mut outcome = self.run_protocol(artifact.path(), &digest, timeout).await;

        if let Err(e) = artifact.dispose().await {
            #[cfg(feature = "tracing")]
            tracing::error!("SECURITY: hash artifact could not be deleted and may remain on disk: {}", e);
            outcome.cleanup_error = Some(e.to_string());
        }

        finish(outcome, started)
    }

    async fn run_protocol(&self, artifact: &Path, digest: &str, timeout: Duration) -> CrackOutcome {
        let engine = &self.config.engine;

        let exit_status = match run_with_timeout(engine, &self.attack_args(artifact), timeout).await {
            Ok(run) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    "Attack run finished: exit {:?}, {} bytes stdout, {} bytes stderr",
                    run.status.code(),
                    run.stdout.len(),
                    run.stderr.len()
                );
                run.status.code()
            }
            Err(RunError::Spawn(e)) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Crack test skipped: cannot start {:?}: {}", engine, e);
                return CrackOutcome::not_attempted(spawn_failure(engine, &e));
            }
            Err(RunError::Wait(e)) => {
                return CrackOutcome {
                    failure_reason: Some(FailureReason::EngineFailed { detail: e.to_string() }),
                    ..CrackOutcome::attempted(None)
                };
            }
            Err(RunError::TimedOut) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Attack run killed after {}ms budget", timeout.as_millis());
                return CrackOutcome {
                    failure_reason: Some(FailureReason::Timeout),
                    ..CrackOutcome::attempted(None)
                };
            }
        };

        let mut outcome = CrackOutcome::attempted(exit_status);
        match run_with_timeout(engine, &self.show_args(artifact), self.config.show_timeout()).await {
            Ok(run) => {
                outcome.cracked = reports_recovered(&run.stdout, digest);
            }
            Err(e) => {
                outcome.failure_reason = Some(FailureReason::RecoveryQueryFailed {
                    detail: match e {
                        RunError::Spawn(e) | RunError::Wait(e) => e.to_string(),
                        RunError::TimedOut => format!("no answer within {}ms", self.config.show_timeout_ms),
                    },
                });
            }
        }
        outcome
    }
}

impl CrackTester for CrackHarness {
    fn attempt_crack(&self, password: &SecretString, timeout: Duration) -> impl Future<Output = CrackOutcome> + Send {
        Self::attempt_crack(self, password, timeout)
    }
}

fn finish(mut outcome: CrackOutcome, started: Instant) -> CrackOutcome {
    outcome.elapsed = started.elapsed();
    outcome
}

fn spawn_failure(engine: &Path, e: &io::Error) -> FailureReason {
    let detail = format!("{}: {}", engine.display(), e);
    match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => FailureReason::EngineUnavailable { detail },
        _ => FailureReason::EngineFailed { detail },
    }
}

/// True when any output line is a `digest:plaintext` pair for `digest`.
fn reports_recovered(output: &[u8], digest: &str) -> bool {
    let marker = format!("{digest}:");
    String::from_utf8_lossy(output).lines().any(|line| {
        line.trim_start()
            .get(..marker.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(&marker))
    })
}


#[cfg(all(test, unix))]
mod protocol_tests {
    use super::*;
    use serial_test::serial;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Scratch layout: a stub engine, a wordlist and an artifact directory.
    struct Sandbox {
        dir: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            std::fs::create_dir(dir.path().join("artifacts")).expect("artifact dir");
            std::fs::write(dir.path().join("words.txt"), "password\n123456\n").expect("wordlist");
            Self { dir }
        }

        fn engine(&self, body: &str) -> PathBuf {
            let path = self.dir.path().join("fake-engine");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write stub");
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
            path
        }

        fn config(&self, engine: PathBuf) -> HarnessConfig {
            HarnessConfig {
                engine,
                wordlist: self.dir.path().join("words.txt"),
                artifact_dir: Some(self.artifact_dir()),
                ..HarnessConfig::default()
            }
        }

        fn artifact_dir(&self) -> PathBuf {
            self.dir.path().join("artifacts")
        }

        fn leftover_artifacts(&self) -> usize {
            std::fs::read_dir(self.artifact_dir()).expect("read artifact dir").count()
        }
    }

    // The stub answers `--show` by echoing the artifact back, which is
    // exactly what the engine prints for a recovered credential.
    const CRACKING_ENGINE: &str = r#"case "$1" in
  --show) for arg in "$@"; do last="$arg"; done; cat "$last" ;;
  *) exit 1 ;;
esac"#;

    fn secret(s: &str) -> SecretString {
        SecretString::new(s.to_string().into())
    }

    #[tokio::test]
    #[serial]
    async fn test_cracked_despite_nonzero_exit() {
        let sandbox = Sandbox::new();
        let harness = CrackHarness::new(sandbox.config(sandbox.engine(CRACKING_ENGINE)));

        let outcome = harness.attempt_crack(&secret("password"), Duration::from_secs(5)).await;

        assert!(outcome.attempted);
        assert!(outcome.cracked);
        assert_eq!(outcome.engine_exit_status, Some(1));
        assert_eq!(outcome.failure_reason, None);
        assert_eq!(outcome.cleanup_error, None);
        assert_eq!(sandbox.leftover_artifacts(), 0);
    }

    #[tokio::test]
    #[serial]
    async fn test_not_cracked_despite_zero_exit() {
        let sandbox = Sandbox::new();
        let harness = CrackHarness::new(sandbox.config(sandbox.engine("exit 0")));

        let outcome = harness.attempt_crack(&secret("Tr0ub4dor&3xyz!"), Duration::from_secs(5)).await;

        assert!(outcome.attempted);
        assert!(!outcome.cracked);
        assert_eq!(outcome.engine_exit_status, Some(0));
        assert!(outcome.resisted());
        assert_eq!(sandbox.leftover_artifacts(), 0);
    }

    #[tokio::test]
    #[serial]
    async fn test_timeout_kills_engine_and_cleans_up() {
        let sandbox = Sandbox::new();
        let harness = CrackHarness::new(sandbox.config(sandbox.engine("exec sleep 30")));

        let started = Instant::now();
        let outcome = harness.attempt_crack(&secret("password"), Duration::from_millis(200)).await;

        assert!(started.elapsed() <= Duration::from_millis(500), "took {:?}", started.elapsed());
        assert!(outcome.attempted);
        assert!(!outcome.cracked);
        assert_eq!(outcome.failure_reason, Some(FailureReason::Timeout));
        assert!(!outcome.resisted());
        assert_eq!(sandbox.leftover_artifacts(), 0);
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_engine_degrades() {
        let sandbox = Sandbox::new();
        let harness = CrackHarness::new(sandbox.config(sandbox.dir.path().join("no-such-engine")));

        let outcome = harness.attempt_crack(&secret("password"), Duration::from_secs(5)).await;

        assert!(!outcome.attempted);
        assert!(!outcome.cracked);
        assert!(matches!(outcome.failure_reason, Some(FailureReason::EngineUnavailable { .. })));
        assert_eq!(sandbox.leftover_artifacts(), 0);
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_wordlist_degrades() {
        let sandbox = Sandbox::new();
        let config = HarnessConfig {
            wordlist: sandbox.dir.path().join("missing.txt"),
            ..sandbox.config(sandbox.engine(CRACKING_ENGINE))
        };

        let outcome = CrackHarness::new(config)
            .attempt_crack(&secret("password"), Duration::from_secs(5))
            .await;

        assert!(!outcome.attempted);
        assert!(matches!(outcome.failure_reason, Some(FailureReason::WordlistMissing { .. })));
        assert_eq!(sandbox.leftover_artifacts(), 0);
    }

    #[tokio::test]
    #[serial]
    async fn test_unwritable_artifact_dir_degrades() {
        let sandbox = Sandbox::new();
        let config = HarnessConfig {
            artifact_dir: Some(sandbox.dir.path().join("missing")),
            ..sandbox.config(sandbox.engine(CRACKING_ENGINE))
        };

        let outcome = CrackHarness::new(config)
            .attempt_crack(&secret("password"), Duration::from_secs(5))
            .await;

        assert!(!outcome.attempted);
        assert!(matches!(outcome.failure_reason, Some(FailureReason::ArtifactIo { .. })));
    }

    #[tokio::test]
    #[serial]
    async fn test_hanging_recovery_query() {
        let sandbox = Sandbox::new();
        let engine = sandbox.engine(r#"case "$1" in --show) exec sleep 30 ;; *) exit 0 ;; esac"#);
        let config = HarnessConfig {
            show_timeout_ms: 200,
            ..sandbox.config(engine)
        };

        let outcome = CrackHarness::new(config)
            .attempt_crack(&secret("password"), Duration::from_secs(5))
            .await;

        assert!(outcome.attempted);
        assert!(!outcome.cracked);
        assert!(matches!(outcome.failure_reason, Some(FailureReason::RecoveryQueryFailed { .. })));
        assert_eq!(sandbox.leftover_artifacts(), 0);
    }

    #[tokio::test]
    #[serial]
    async fn test_engine_receives_expected_invocation() {
        let sandbox = Sandbox::new();
        let log = sandbox.dir.path().join("calls.log");
        let engine = sandbox.engine(&format!(
            r#"printf '%s\n' "$*" >> "{log}"
for arg in "$@"; do last="$arg"; done
case "$1" in --show) cat "$last" >> "{log}" ;; esac"#,
            log = log.display()
        ));

        let outcome = CrackHarness::new(sandbox.config(engine))
            .attempt_crack(&secret("password"), Duration::from_secs(5))
            .await;
        assert!(outcome.attempted);

        let calls = std::fs::read_to_string(&log).expect("call log");
        let lines: Vec<&str> = calls.lines().collect();
        assert_eq!(lines.len(), 3, "unexpected calls: {calls}");
        assert!(lines[0].starts_with("--quiet --force -m 0 -a 0 "));
        assert!(lines[0].ends_with("words.txt"));
        assert!(lines[1].starts_with("--show --force -m 0 "));
        assert_eq!(lines[2], "5f4dcc3b5aa765d61d8327deb882cf99:password");
    }

    #[tokio::test]
    #[serial]
    async fn test_concurrent_attempts_use_distinct_artifacts() {
        let sandbox = Sandbox::new();
        let harness = CrackHarness::new(sandbox.config(sandbox.engine(CRACKING_ENGINE)));

        let (first_pw, second_pw) = (secret("password"), secret("123456"));
        let (first, second) = tokio::join!(
            harness.attempt_crack(&first_pw, Duration::from_secs(5)),
            harness.attempt_crack(&second_pw, Duration::from_secs(5)),
        );

        assert!(first.cracked);
        assert!(second.cracked);
        assert_eq!(sandbox.leftover_artifacts(), 0);
    }

    #[tokio::test]
    #[serial]
    async fn test_dropped_attempt_cleans_up() {
        let sandbox = Sandbox::new();
        let harness = CrackHarness::new(sandbox.config(sandbox.engine("exec sleep 30")));
        let password = secret("password");

        let abandoned = tokio::time::timeout(
            Duration::from_millis(100),
            harness.attempt_crack(&password, Duration::from_secs(30)),
        )
        .await;

        assert!(abandoned.is_err());
        assert_eq!(sandbox.leftover_artifacts(), 0);
    }

    #[tokio::test]
    #[serial]
    async fn test_line_break_password_never_reaches_engine() {
        let sandbox = Sandbox::new();
        let log = sandbox.dir.path().join("calls.log");
        let engine = sandbox.engine(&format!(r#"printf '%s\n' "$*" >> "{}""#, log.display()));

        let outcome = CrackHarness::new(sandbox.config(engine))
            .attempt_crack(&secret("pass\nword"), Duration::from_secs(5))
            .await;

        assert!(!outcome.attempted);
        assert!(matches!(outcome.failure_reason, Some(FailureReason::ArtifactIo { .. })));
        assert!(!log.exists());
        assert_eq!(sandbox.leftover_artifacts(), 0);
    }
}
