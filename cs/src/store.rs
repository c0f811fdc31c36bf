//! TaskStore trait and in-memory implementation

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::task::{NewTask, Task, TaskId};

/// Errors returned by task storage backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store rejected task: {0}")]
    Rejected(String),

    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Capability for creating and listing calendar tasks
///
/// Implementations own persistence; callers only see opaque task IDs.
/// A failed create must surface as an error, never be swallowed.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a new task, returning its ID
    async fn create_task(&self, task: NewTask) -> Result<TaskId, StoreError>;

    /// List all stored tasks
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError>;
}

/// In-memory task store
///
/// Default backend for the CLI and tests. Tasks live for the process
/// lifetime only.
pub struct MemoryStore {
    tasks: Mutex<Vec<Task>>,
    /// When set, every create is rejected with this message (test hook)
    reject_with: Mutex<Option<String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            reject_with: Mutex::new(None),
        }
    }

    /// Make every subsequent create fail with the given message
    pub fn reject_creates(&self, message: impl Into<String>) {
        *self.reject_with.lock().unwrap() = Some(message.into());
    }

    /// Stop rejecting creates
    pub fn accept_creates(&self) {
        *self.reject_with.lock().unwrap() = None;
    }

    /// Number of stored tasks
    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, task: NewTask) -> Result<TaskId, StoreError> {
        if let Some(message) = self.reject_with.lock().unwrap().clone() {
            debug!(%task.title, "create_task: rejected by test hook");
            return Err(StoreError::Rejected(message));
        }

        if task.title.trim().is_empty() {
            return Err(StoreError::InvalidTask("title is empty".to_string()));
        }
        if task.end <= task.start {
            return Err(StoreError::InvalidTask(format!(
                "end {} is not after start {}",
                task.end, task.start
            )));
        }

        let id = Uuid::now_v7().to_string();
        let stored = Task {
            id: id.clone(),
            title: task.title,
            start: task.start,
            end: task.end,
            priority: task.priority,
            created_at: chrono::Utc::now().timestamp_millis(),
        };

        debug!(%id, %stored.title, "create_task: stored");
        self.tasks.lock().unwrap().push(stored);
        Ok(id)
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.tasks.lock().unwrap().clone())
    }
}
