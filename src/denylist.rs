//! Denylist of passwords that are rejected regardless of their strength.
//!
//! Entries are normalized to trimmed lowercase so lookups are
//! case-insensitive. A denylist is immutable once built and is owned by the
//! [`crate::PolicyProfile`] that uses it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Passwords rejected by every built-in profile.
pub const COMMON_PASSWORDS: [&str; 4] = ["password", "123456", "qwerty", "admin"];

#[derive(Error, Debug)]
pub enum DenylistError {
    #[error("Denylist file not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Failed to read denylist file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Denylist file is empty")]
    EmptyFile,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Denylist {
    entries: HashSet<String>,
}

impl Denylist {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { entries }
    }

    /// The built-in list of common passwords.
    pub fn common() -> Self {
        Self::from_entries(COMMON_PASSWORDS)
    }

    /// Loads a newline-separated denylist file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File does not exist
    /// - File cannot be read
    /// - File has no entries
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DenylistError> {
        let path = path.as_ref();

        if !path.exists() {
            #[cfg(feature = "tracing")]
            tracing::error!("Denylist loading FAILED: FileNotFound {:?}", path);
            return Err(DenylistError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;

        if content.trim().is_empty() {
            #[cfg(feature = "tracing")]
            tracing::error!("Denylist loading FAILED: Empty file {:?}", path);
            return Err(DenylistError::EmptyFile);
        }

        let denylist = Self::from_entries(content.lines());

        #[cfg(feature = "tracing")]
        tracing::info!("Denylist loaded: {} passwords from {:?}", denylist.len(), path);

        Ok(denylist)
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, password: &str) -> bool {
        self.entries.contains(&password.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}
