//! JSON file checkpoint store.

use async_trait::async_trait;
use lh_error::{CheckpointError, Result};
use lh_traits::CheckpointStore;
use lh_types::ResumeState;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Persists [`ResumeState`] as pretty-printed JSON.
///
/// Writes go to a sibling `.tmp` file that is then renamed over the target,
/// so a crash mid-write leaves the previous checkpoint intact.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    /// Create a store backed by `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the checkpoint file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(&self) -> Result<Option<ResumeState>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No checkpoint file");
                return Ok(None);
            }
            Err(e) => {
                return Err(CheckpointError::Io(format!(
                    "Failed to read '{}': {e}",
                    self.path.display()
                ))
                .into());
            }
        };

        let state = serde_json::from_slice(&bytes).map_err(|e| {
            CheckpointError::Format(format!("Failed to parse '{}': {e}", self.path.display()))
        })?;

        Ok(Some(state))
    }

    async fn save(&self, state: &ResumeState) -> Result<()> {
        let json = serde_json::to_vec_pretty(state)
            .map_err(|e| CheckpointError::Format(format!("Failed to encode checkpoint: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                CheckpointError::Io(format!("Failed to create '{}': {e}", parent.display()))
            })?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, &json).await.map_err(|e| {
            CheckpointError::Io(format!("Failed to write '{}': {e}", temp.display()))
        })?;
        tokio::fs::rename(&temp, &self.path).await.map_err(|e| {
            CheckpointError::Io(format!(
                "Failed to move checkpoint into '{}': {e}",
                self.path.display()
            ))
        })?;

        debug!(
            path = %self.path.display(),
            watermark = %state.watermark,
            objects = state.offsets.len(),
            "Saved checkpoint"
        );
        Ok(())
    }
}
