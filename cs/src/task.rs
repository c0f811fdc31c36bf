//! Task domain types

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Unique identifier for a stored task
pub type TaskId = String;

/// Priority level for calendar tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// A task to be created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    /// Task title
    pub title: String,

    /// Scheduled start (local clock, no timezone)
    pub start: NaiveDateTime,

    /// Scheduled end
    pub end: NaiveDateTime,

    /// Priority level
    pub priority: Priority,
}

/// A stored calendar task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task ID
    pub id: TaskId,

    /// Task title
    pub title: String,

    /// Scheduled start
    pub start: NaiveDateTime,

    /// Scheduled end
    pub end: NaiveDateTime,

    /// Priority level
    pub priority: Priority,

    /// Creation timestamp (unix ms)
    pub created_at: i64,
}
