//! Persisted API credential.
//!
//! A single key survives across runs as a small JSON record under the user
//! config directory. It is read once at startup to pre-fill the credential
//! and overwritten whenever the user submits a new value; the loaded value
//! is then threaded explicitly through the components that need it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// On-disk shape of the credential record.
#[derive(Debug, Serialize, Deserialize)]
struct CredentialRecord {
    key: String,
}

/// Store for the persisted API key.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store at the default location
    /// (`~/.config/gemini-pdf-translator/credentials.json`).
    pub fn open_default() -> Self {
        let path = crate::util::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gemini-pdf-translator")
            .join("credentials.json");
        Self { path }
    }

    /// Store at an explicit location (used by tests).
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved key. A missing file or an unreadable record both read
    /// as "no credential".
    pub fn load(&self) -> Option<String> {
        let content = fs::read_to_string(&self.path).ok()?;
        let record: CredentialRecord = serde_json::from_str(&content).ok()?;
        if record.key.is_empty() {
            return None;
        }
        debug!("Loaded credential from {}", self.path.display());
        Some(record.key)
    }

    /// Overwrite the saved key with a newly submitted value.
    pub fn save(&self, key: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::CredentialStore(format!(
                    "Failed to create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let record = CredentialRecord {
            key: key.to_string(),
        };
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| Error::CredentialStore(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| {
            Error::CredentialStore(format!("Failed to write {}: {}", self.path.display(), e))
        })?;

        debug!("Saved credential to {}", self.path.display());
        Ok(())
    }
}
