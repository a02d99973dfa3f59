//! Caller-supplied task payloads.

use super::{Task, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User-controlled task fields as received from an external caller.
///
/// Identity and timestamps are not part of the payload; storage assigns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskDraft {
    /// Task name.
    pub name: String,
    /// Optional task details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Optional resolution timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl TaskDraft {
    /// Parses a draft from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns the [`serde_json::Error`] when the body is not a valid draft.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Builds a transient task ready for insertion.
    #[must_use]
    pub fn into_task(self) -> Task {
        self.into_task_with_id(TaskId::UNASSIGNED)
    }

    /// Builds a task addressing the record with the given identifier.
    #[must_use]
    pub fn into_task_with_id(self, id: TaskId) -> Task {
        let mut task = Task::with_id(id, self.name);
        task.set_details(self.details);
        task.set_resolved_at(self.resolved_at);
        task
    }
}
