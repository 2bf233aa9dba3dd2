//! File-backed watermark store.
//!
//! The watermark is kept as `{"last_seen": "<rfc3339>"}`. Writes go to a
//! sibling temp file first and are renamed into place, so a reader sees either
//! the old value or the new one.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use octoping_common::error::StateError;
use octoping_common::types::Watermark;

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    last_seen: String,
}

/// Loads and saves the watermark at a fixed path.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted watermark. `None` when no state file exists yet.
    pub async fn load(&self) -> Result<Option<Watermark>, StateError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let state: StateFile = serde_json::from_slice(&bytes).map_err(|e| StateError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let watermark = DateTime::parse_from_rfc3339(&state.last_seen)
            .map_err(|e| StateError::Corrupt {
                path: self.path.clone(),
                reason: format!("last_seen '{}' is not a timestamp: {}", state.last_seen, e),
            })?
            .with_timezone(&Utc);

        tracing::debug!(path = %self.path.display(), watermark = %watermark, "Loaded watermark");
        Ok(Some(watermark))
    }

    /// Persist `watermark`, replacing any previous value.
    pub async fn save(&self, watermark: Watermark) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let body = serde_json::to_vec(&StateFile {
            last_seen: watermark.to_rfc3339_opts(SecondsFormat::AutoSi, false),
        })?;

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &body).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::debug!(path = %self.path.display(), watermark = %watermark, "Saved watermark");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
