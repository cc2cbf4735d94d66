//! File-based Checkpoint Store Adapter
//!
//! Stores each session's turn state as a YAML file on disk:
//! `{base_path}/{session_id}/state.yaml`. Readable by hand, which is most of
//! the point when debugging a stuck conversation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::dialogue::TurnState;
use crate::domain::foundation::SessionId;
use crate::ports::{CheckpointError, CheckpointStore};

/// File-based checkpoint storage
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    base_path: PathBuf,
}

impl FileCheckpointStore {
    /// Create a new file store rooted at `base_path`
    ///
    /// # Example
    /// ```ignore
    /// let store = FileCheckpointStore::new("./data/sessions");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn session_dir(&self, session_id: SessionId) -> PathBuf {
        self.base_path.join(session_id.to_string())
    }

    /// Path of a session's checkpoint file
    pub fn state_file_path(&self, session_id: SessionId) -> PathBuf {
        self.session_dir(session_id).join("state.yaml")
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn save(&self, session_id: SessionId, state: &TurnState) -> Result<(), CheckpointError> {
        fs::create_dir_all(self.session_dir(session_id)).await?;

        let file_path = self.state_file_path(session_id);
        let yaml = serde_yaml::to_string(state)?;

        // Write then rename so a reader never sees a half-written file
        let temp_path = file_path.with_extension("yaml.tmp");
        fs::write(&temp_path, yaml).await?;
        fs::rename(&temp_path, &file_path).await?;

        Ok(())
    }

    async fn load(&self, session_id: SessionId) -> Result<Option<TurnState>, CheckpointError> {
        let file_path = self.state_file_path(session_id);

        let yaml = match fs::read_to_string(&file_path).await {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_yaml::from_str(&yaml)?))
    }

    async fn delete(&self, session_id: SessionId) -> Result<(), CheckpointError> {
        match fs::remove_dir_all(self.session_dir(session_id)).await {
            Ok(()) => Ok(()),
            // Not an error - idempotent delete
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
