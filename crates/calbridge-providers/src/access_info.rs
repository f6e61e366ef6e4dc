//! Per-account access-info storage.
//!
//! A user's provider credentials live in one JSON array document of
//! [`AccessInfoEntry`] records keyed logically by (source type, account
//! name). The collection is not unique-indexed: resolution is a first-match
//! linear scan, and a token refresh updates the first match only before the
//! whole collection is written back. Duplicate entries are tolerated, not
//! repaired; last writer of the document wins under concurrent refreshes.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use calbridge_core::SourceType;

use crate::error::{SyncError, SyncResult};

/// Stored credentials and configuration for one (provider, account) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessInfoEntry {
    /// Provider wire name ("Google", "Office365", "EWS").
    pub src_type: String,
    /// Account name within the provider.
    pub src_account_name: String,
    /// Current OAuth access token (Google/Office365).
    pub access_token: String,
    /// OAuth refresh token (Google/Office365).
    pub refresh_token: String,
    /// Provider calendar identifier (Google).
    pub calendar_id: String,
    /// Account password (EWS only).
    pub pw: String,
    /// Provider endpoint override (EWS only).
    pub src_url: String,
}

impl AccessInfoEntry {
    /// Returns true if this entry belongs to the given provider and account.
    pub fn matches(&self, src_type: SourceType, account: &str) -> bool {
        self.src_type == src_type.as_str() && self.src_account_name == account
    }
}

/// First-match resolution over the loaded collection.
pub fn resolve<'a>(
    entries: &'a [AccessInfoEntry],
    src_type: SourceType,
    account: &str,
) -> Option<&'a AccessInfoEntry> {
    entries.iter().find(|entry| entry.matches(src_type, account))
}

/// File-backed access-info repository.
///
/// The document is cached in memory behind an `RwLock`; a successful token
/// refresh mutates the first matching entry and rewrites the whole document
/// with a temp-file + rename, restrictive permissions on Unix.
#[derive(Debug)]
pub struct AccessInfoStore {
    path: PathBuf,
    entries: RwLock<Vec<AccessInfoEntry>>,
}

impl AccessInfoStore {
    /// Opens the repository, loading the document if it exists.
    pub fn open(path: impl Into<PathBuf>) -> SyncResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                SyncError::configuration(format!("failed to read access info: {e}"))
            })?;
            let loaded: Vec<AccessInfoEntry> = serde_json::from_str(&content).map_err(|e| {
                SyncError::configuration(format!("failed to parse access info: {e}"))
            })?;
            info!(path = %path.display(), entries = loaded.len(), "loaded access info");
            loaded
        } else {
            debug!(path = %path.display(), "no access info document");
            Vec::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Creates an in-memory repository seeded with entries (tests, embedding).
    ///
    /// `path` is still used if a refresh persists the collection.
    pub fn with_entries(path: impl Into<PathBuf>, entries: Vec<AccessInfoEntry>) -> Self {
        Self {
            path: path.into(),
            entries: RwLock::new(entries),
        }
    }

    /// Returns the document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves by raw wire strings, first match wins.
    ///
    /// Matching on the raw `srcType` string lets the dispatcher distinguish
    /// "no credentials for this pair" from "provider not supported" the way
    /// callers expect: an unknown provider with no entry reports the missing
    /// entry, not the unsupported provider.
    pub fn resolve_raw(&self, src_type: &str, account: &str) -> Option<AccessInfoEntry> {
        self.entries
            .read()
            .unwrap()
            .iter()
            .find(|e| e.src_type == src_type && e.src_account_name == account)
            .cloned()
    }

    /// Resolves the first entry matching the given provider and account.
    pub fn resolve_entry(
        &self,
        src_type: SourceType,
        account: &str,
    ) -> Option<AccessInfoEntry> {
        resolve(&self.entries.read().unwrap(), src_type, account).cloned()
    }

    /// Stores a refreshed access token into the first matching entry and
    /// persists the whole collection.
    ///
    /// Persistence is unconditional once called: a later failure of the
    /// retried remote call must still leave the refreshed token stored.
    pub fn update_access_token(
        &self,
        src_type: SourceType,
        account: &str,
        access_token: &str,
    ) -> SyncResult<()> {
        let mut entries = self.entries.write().unwrap();
        match entries.iter_mut().find(|e| e.matches(src_type, account)) {
            Some(entry) => entry.access_token = access_token.to_string(),
            None => {
                return Err(SyncError::configuration(format!(
                    "no access info entry for {src_type}/{account}"
                )));
            }
        }
        self.persist(&entries)
    }

    fn persist(&self, entries: &[AccessInfoEntry]) -> SyncResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SyncError::configuration(format!("failed to create access info directory: {e}"))
            })?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| SyncError::internal(format!("failed to serialize access info: {e}")))?;

        fs::write(&temp_path, &content).map_err(|e| {
            SyncError::configuration(format!("failed to write access info: {e}"))
        })?;
        fs::rename(&temp_path, &self.path).map_err(|e| {
            SyncError::configuration(format!("failed to rename access info: {e}"))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            let _ = fs::set_permissions(&self.path, perms);
        }

        debug!(path = %self.path.display(), "persisted access info");
        Ok(())
    }
}
