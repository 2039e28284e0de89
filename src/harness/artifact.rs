//! Temporary hash artifact handed to the cracking engine.
//!
//! The file holds `digest:password`, so it is created exclusively with a
//! random name (mode 0600 on unix) and removed when the owning
//! [`HashArtifact`] is disposed of or dropped.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

pub const ARTIFACT_PREFIX: &str = "pwd-audit-";
pub const ARTIFACT_SUFFIX: &str = ".hash";

const CLEANUP_RETRY_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub struct HashArtifact {
    path: PathBuf,
    removed: bool,
}

impl HashArtifact {
    /// Creates a uniquely named artifact in `dir` containing `digest:password`.
    ///
    /// Blocks on file I/O; async callers go through [`Self::create_blocking`].
    pub fn create(dir: &Path, digest: &str, password: &SecretString) -> io::Result<Self> {
        if password.expose_secret().contains(['\n', '\r']) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "password contains a line break",
            ));
        }

        let mut file = tempfile::Builder::new()
            .prefix(ARTIFACT_PREFIX)
            .suffix(ARTIFACT_SUFFIX)
            .tempfile_in(dir)?;

        // On error the NamedTempFile is dropped and deletes itself.
        writeln!(file, "{}:{}", digest, password.expose_secret())?;
        file.as_file().sync_all()?;

        let (_, path) = file.keep().map_err(|e| e.error)?;

        #[cfg(feature = "tracing")]
        tracing::debug!("Hash artifact created: {:?}", path);

        Ok(Self {
            path,
            removed: false,
        })
    }

    /// [`Self::create`] on the blocking thread pool.
    pub async fn create_blocking(dir: PathBuf, digest: String, password: SecretString) -> io::Result<Self> {
        tokio::task::spawn_blocking(move || Self::create(&dir, &digest, &password))
            .await
            .map_err(io::Error::other)?
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the artifact, retrying once after a short pause.
    ///
    /// A file that is already gone counts as removed.
    /// If this future is dropped midway, `Drop` still removes the file.
    pub async fn dispose(mut self) -> io::Result<()> {
        if remove_blocking(self.path.clone()).await.is_ok() {
            self.removed = true;
            return Ok(());
        }

        tokio::time::sleep(CLEANUP_RETRY_DELAY).await;
        let result = remove_blocking(self.path.clone()).await;
        self.removed = true;
        result
    }
}

impl Drop for HashArtifact {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        // Reached on panics, dropped futures and early returns.
        if let Err(_e) = remove_if_present(&self.path) {
            #[cfg(feature = "tracing")]
            tracing::error!("Failed to remove hash artifact {:?} on drop: {}", self.path, _e);
        }
    }
}

async fn remove_blocking(path: PathBuf) -> io::Result<()> {
    tokio::task::spawn_blocking(move || remove_if_present(&path))
        .await
        .map_err(io::Error::other)?
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
