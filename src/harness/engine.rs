//! Bounded subprocess runs of the cracking engine.

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// Extra time allowed for draining pipes after the process has exited.
const OUTPUT_GRACE: Duration = Duration::from_millis(500);

/// A finished engine run. Output may contain recovered plaintext and must not be logged.
#[derive(Debug)]
pub struct EngineRun {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

#[derive(Debug)]
pub enum RunError {
    /// The process never started.
    Spawn(io::Error),
    /// The process started but waiting on it failed.
    Wait(io::Error),
    /// The budget elapsed; the process was killed.
    TimedOut,
}

/// Runs `program` with `args`, killing it if it outlives `budget`.
///
/// Both output streams are captured. The exit status is returned as-is.
pub async fn run_with_timeout(program: &Path, args: &[OsString], budget: Duration) -> Result<EngineRun, RunError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(RunError::Spawn)?;

    let stdout_task = tokio::spawn(drain(child.stdout.take()));
    let stderr_task = tokio::spawn(drain(child.stderr.take()));

    match tokio::time::timeout(budget, child.wait()).await {
        Ok(Ok(status)) => Ok(EngineRun {
            status,
            stdout: collect(stdout_task).await,
            stderr: collect(stderr_task).await,
        }),
        Ok(Err(e)) => {
            stdout_task.abort();
            stderr_task.abort();
            Err(RunError::Wait(e))
        }
        Err(_) => {
            // Kill and reap before returning so no engine run outlives its budget.
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(RunError::TimedOut)
        }
    }
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    buf
}

async fn collect(task: JoinHandle<Vec<u8>>) -> Vec<u8> {
    let abort = task.abort_handle();
    match tokio::time::timeout(OUTPUT_GRACE, task).await {
        Ok(Ok(buf)) => buf,
        Ok(Err(_)) => Vec::new(),
        Err(_) => {
            // A grandchild still holds the pipe open.
            abort.abort();
            Vec::new()
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::time::Instant;

    fn sh(script: &str) -> Vec<OsString> {
        vec!["-c".into(), script.into()]
    }

    #[tokio::test]
    #[serial]
    async fn test_run_captures_both_streams() {
        let run = run_with_timeout(Path::new("/bin/sh"), &sh("echo out; echo err >&2; exit 3"), Duration::from_secs(5))
            .await
            .expect("run");

        assert_eq!(run.status.code(), Some(3));
        assert_eq!(run.stdout, b"out\n");
        assert_eq!(run.stderr, b"err\n");
    }

    #[tokio::test]
    #[serial]
    async fn test_run_times_out() {
        let started = Instant::now();
        let result = run_with_timeout(Path::new("/bin/sh"), &sh("exec sleep 30"), Duration::from_millis(200)).await;

        assert!(matches!(result, Err(RunError::TimedOut)));
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    #[serial]
    async fn test_run_missing_program() {
        let result = run_with_timeout(Path::new("/nonexistent/engine"), &[], Duration::from_secs(1)).await;

        match result {
            Err(RunError::Spawn(e)) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("Expected spawn error, got {other:?}"),
        }
    }
}
