//! Task materialization
//!
//! Turns a confirmed proposal payload into calls against the task-creation
//! capability. Plans are created best-effort in order: a failure on one
//! sub-task does not roll back the ones already created, and the report
//! says exactly what happened.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::TaskDraft;
use calstore::{NewTask, StoreError, TaskId, TaskStore};

/// Outcome of materializing one confirmed proposal
#[derive(Debug)]
pub struct MaterializeReport {
    pub created: Vec<TaskId>,
    pub failed: Vec<(String, StoreError)>,
}

impl MaterializeReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty() && !self.created.is_empty()
    }

    /// Count-aware user-facing summary
    pub fn summary_message(&self, titles: &[String]) -> String {
        if self.failed.is_empty() {
            return match self.created.len() {
                1 => format!("Done! Scheduled \"{}\".", titles.first().map(String::as_str).unwrap_or("your task")),
                n => format!("Done! Scheduled {} tasks.", n),
            };
        }

        let failures = self
            .failed
            .iter()
            .map(|(title, error)| format!("\"{}\" ({})", title, error))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Scheduled {} of {} tasks. Could not schedule: {}",
            self.created.len(),
            self.created.len() + self.failed.len(),
            failures
        )
    }
}

/// Translates confirmed drafts into task-creation calls
pub struct Materializer {
    store: Arc<dyn TaskStore>,
}

impl Materializer {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Create each draft in order, collecting successes and failures
    ///
    /// Callers validate drafts before confirming; an invalid draft that
    /// still reaches this point is reported as a failure, not skipped
    /// silently.
    pub async fn materialize(&self, drafts: &[TaskDraft]) -> MaterializeReport {
        let mut report = MaterializeReport {
            created: Vec::new(),
            failed: Vec::new(),
        };

        for draft in drafts {
            let Some((start, end)) = draft.parse_window() else {
                warn!(%draft.title, "materialize: draft window no longer parseable");
                report.failed.push((
                    draft.title.clone(),
                    StoreError::InvalidTask("unparseable start/end".to_string()),
                ));
                continue;
            };

            let task = NewTask {
                title: draft.title.clone(),
                start,
                end,
                priority: draft.priority,
            };

            match self.store.create_task(task).await {
                Ok(id) => {
                    debug!(%id, %draft.title, "materialize: task created");
                    report.created.push(id);
                }
                Err(e) => {
                    warn!(%draft.title, error = %e, "materialize: create failed");
                    report.failed.push((draft.title.clone(), e));
                }
            }
        }

        report
    }
}
