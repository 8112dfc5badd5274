//! Whole-library result cache
//!
//! A single JSON array of raw entitlement records at a fixed path. The
//! cache has no expiry: once present it is used unconditionally until the
//! file is removed externally. It is only ever written after a fully
//! successful sync, as a full replacement.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::entitlements::Entitlement;
use crate::error::{Error, Result};

/// Fixed-path cache for the synced entitlement list.
pub struct LibraryCache {
    path: PathBuf,
}

impl LibraryCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the cached list when the cache file exists.
    ///
    /// `Ok(None)` means no cache; a present-but-unreadable file is an
    /// error so a corrupt cache is noticed rather than silently refetched
    /// over.
    pub async fn load(&self) -> Result<Option<Vec<Entitlement>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        debug!(path = %self.path.display(), "returning cached library");
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::Cache(format!("reading cache file: {e}")))?;
        let games = serde_json::from_str(&contents)
            .map_err(|e| Error::Cache(format!("parsing cache file: {e}")))?;
        Ok(Some(games))
    }

    /// Replace the cache with the given list.
    pub async fn store(&self, games: &[Entitlement]) -> Result<()> {
        let json = serde_json::to_string(games)
            .map_err(|e| Error::Cache(format!("serializing cache: {e}")))?;
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| Error::Cache(format!("creating cache directory: {e}")))?;
        }
        tokio::fs::write(&self.path, json.as_bytes())
            .await
            .map_err(|e| Error::Cache(format!("writing cache file: {e}")))?;
        debug!(path = %self.path.display(), count = games.len(), "cached library");
        Ok(())
    }
}
