//! Checkpoint stores
//!
//! Adapters persist conversation state per thread id so that a later call
//! with the same session id resumes where the previous one stopped. A store
//! is owned by exactly one agent handle; every access goes through the
//! store's own mutex.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{AgentError, Result};

/// Saved state for one thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub thread_id: String,
    pub state: Value,
    pub updated_at: DateTime<Utc>,
}

/// Storage interface for per-thread checkpoints
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the latest checkpoint for a thread
    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>>;

    /// Replace the checkpoint for a thread
    async fn save(&self, thread_id: &str, state: Value) -> Result<Checkpoint>;

    /// Release the underlying resources. Safe to call more than once.
    async fn close(&self) -> Result<()>;
}

/// Where an adapter keeps its checkpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckpointSettings {
    #[default]
    Memory,
    File {
        path: PathBuf,
    },
}

impl CheckpointSettings {
    /// Open the configured store
    pub async fn open(&self) -> Result<Arc<dyn CheckpointStore>> {
        match self {
            Self::Memory => Ok(Arc::new(MemoryCheckpointStore::new())),
            Self::File { path } => Ok(Arc::new(FileCheckpointStore::open(path.clone()).await?)),
        }
    }
}

fn store_closed() -> AgentError {
    AgentError::execution("checkpoint store is closed")
}

#[derive(Default)]
struct StoreState {
    checkpoints: HashMap<String, Checkpoint>,
    closed: bool,
}

/// Process-local checkpoint store
#[derive(Default)]
pub struct MemoryCheckpointStore {
    state: Mutex<StoreState>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        let state = self.state.lock().await;
        if state.closed {
            return Err(store_closed());
        }
        Ok(state.checkpoints.get(thread_id).cloned())
    }

    async fn save(&self, thread_id: &str, value: Value) -> Result<Checkpoint> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(store_closed());
        }
        let checkpoint = Checkpoint {
            thread_id: thread_id.to_string(),
            state: value,
            updated_at: Utc::now(),
        };
        state
            .checkpoints
            .insert(thread_id.to_string(), checkpoint.clone());
        Ok(checkpoint)
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.closed = true;
        state.checkpoints.clear();
        Ok(())
    }
}

/// Checkpoint store backed by a JSON file
///
/// Every save is written through to disk while the store mutex is held, so
/// concurrent requests never interleave partial writes.
pub struct FileCheckpointStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl FileCheckpointStore {
    /// Open the store, loading existing checkpoints if the file exists
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let checkpoints = if tokio::fs::try_exists(&path).await? {
            let content = tokio::fs::read_to_string(&path).await?;
            let saved: Vec<Checkpoint> = serde_json::from_str(&content)?;
            saved
                .into_iter()
                .map(|c| (c.thread_id.clone(), c))
                .collect()
        } else {
            HashMap::new()
        };

        info!(
            "Opened checkpoint file {:?} with {} thread(s)",
            path,
            checkpoints.len()
        );

        Ok(Self {
            path,
            state: Mutex::new(StoreState {
                checkpoints,
                closed: false,
            }),
        })
    }

    async fn persist(&self, checkpoints: &HashMap<String, Checkpoint>) -> Result<()> {
        let mut saved: Vec<&Checkpoint> = checkpoints.values().collect();
        saved.sort_by(|a, b| a.thread_id.cmp(&b.thread_id));
        let content = serde_json::to_string_pretty(&saved)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        let state = self.state.lock().await;
        if state.closed {
            return Err(store_closed());
        }
        Ok(state.checkpoints.get(thread_id).cloned())
    }

    async fn save(&self, thread_id: &str, value: Value) -> Result<Checkpoint> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(store_closed());
        }
        let checkpoint = Checkpoint {
            thread_id: thread_id.to_string(),
            state: value,
            updated_at: Utc::now(),
        };
        state
            .checkpoints
            .insert(thread_id.to_string(), checkpoint.clone());
        self.persist(&state.checkpoints).await?;
        debug!("Saved checkpoint for thread {}", thread_id);
        Ok(checkpoint)
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Ok(());
        }
        self.persist(&state.checkpoints).await?;
        state.closed = true;
        info!("Closed checkpoint file {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_store_save_and_load() {
        let store = MemoryCheckpointStore::new();
        assert!(store.load("t1").await.unwrap().is_none());

        store.save("t1", json!({"count": 1})).await.unwrap();
        let loaded = store.load("t1").await.unwrap().unwrap();
        assert_eq!(loaded.state, json!({"count": 1}));
        assert!(store.load("t2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_rejects_use_after_close() {
        let store = MemoryCheckpointStore::new();
        store.close().await.unwrap();
        store.close().await.unwrap();
        assert!(store.save("t1", json!(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("checkpoints.json");

        let store = FileCheckpointStore::open(&path).await.unwrap();
        store.save("s1", json!({"count": 2})).await.unwrap();
        store.close().await.unwrap();

        let reopened = FileCheckpointStore::open(&path).await.unwrap();
        let loaded = reopened.load("s1").await.unwrap().unwrap();
        assert_eq!(loaded.state["count"], 2);
    }

    #[tokio::test]
    async fn test_settings_default_to_memory() {
        let settings: CheckpointSettings = serde_json::from_value(json!({"kind": "memory"})).unwrap();
        assert_eq!(settings, CheckpointSettings::default());

        let file: CheckpointSettings =
            serde_json::from_value(json!({"kind": "file", "path": "/tmp/x.json"})).unwrap();
        assert!(matches!(file, CheckpointSettings::File { .. }));
    }
}
