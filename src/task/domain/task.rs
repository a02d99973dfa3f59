//! Task entity and its sanitize/validate/compare pipeline.

use super::{TaskId, ValidationError, validation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The single persisted record managed by the service.
///
/// Identity and the `created_at`/`updated_at` timestamps are owned by the
/// storage layer. Callers construct transient tasks with [`Task::new`] and
/// address existing records for update with [`Task::with_id`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    name: String,
    details: Option<String>,
    resolved_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted name.
    pub name: String,
    /// Persisted details, if any.
    pub details: Option<String>,
    /// Persisted resolution timestamp, if any.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Persisted update timestamp, if the record was ever updated.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a transient task that has not been persisted.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TaskId::UNASSIGNED,
            name: name.into(),
            details: None,
            resolved_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Creates a task addressing an existing record by identifier.
    #[must_use]
    pub fn with_id(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            id,
            ..Self::new(name)
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            details: data.details,
            resolved_at: data.resolved_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Sets the task details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Sets the resolution timestamp.
    #[must_use]
    pub const fn with_resolved_at(mut self, resolved_at: DateTime<Utc>) -> Self {
        self.resolved_at = Some(resolved_at);
        self
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the task details, if any.
    #[must_use]
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns the resolution timestamp, if any.
    #[must_use]
    pub const fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    /// Returns the creation timestamp; absent until the task is persisted.
    #[must_use]
    pub const fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Returns the last update timestamp; absent until the task is updated.
    #[must_use]
    pub const fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Replaces the task name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Replaces or clears the task details.
    pub fn set_details(&mut self, details: Option<String>) {
        self.details = details;
    }

    /// Replaces or clears the resolution timestamp.
    pub const fn set_resolved_at(&mut self, resolved_at: Option<DateTime<Utc>>) {
        self.resolved_at = resolved_at;
    }

    /// Normalizes the task so that it is internally consistent.
    ///
    /// Clears `updated_at` on tasks without identity and collapses empty
    /// details to absent. Timestamps are UTC by construction. Applying the
    /// pass more than once has no further effect.
    pub fn sanitize(&mut self) {
        if self.id.is_unassigned() {
            self.updated_at = None;
        }
        if self.details.as_deref().is_some_and(str::is_empty) {
            self.details = None;
        }
    }

    /// Checks every field constraint, stopping at the first violation.
    ///
    /// Rules run in order: name, details, then `updated_at` consistency.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] for the first rule that fails.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::check_name(self)?;
        validation::check_details(self)?;
        validation::check_updated_at(self)
    }

    /// Compares two tasks field by field at second precision.
    ///
    /// Unlike `==`, sub-second differences in timestamps are ignored, which
    /// matches what survives a round trip through storage.
    #[must_use]
    pub fn compare(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.details == other.details
            && same_second(self.resolved_at, other.resolved_at)
            && same_second(self.created_at, other.created_at)
            && same_second(self.updated_at, other.updated_at)
    }

    /// Records the identity and creation time assigned by storage.
    pub(crate) const fn mark_inserted(&mut self, id: TaskId, created_at: DateTime<Utc>) {
        self.id = id;
        self.created_at = Some(created_at);
        self.updated_at = None;
    }

    /// Records the update time assigned by storage.
    pub(crate) const fn mark_updated(&mut self, updated_at: DateTime<Utc>) {
        self.updated_at = Some(updated_at);
    }
}

fn same_second(left: Option<DateTime<Utc>>, right: Option<DateTime<Utc>>) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(left_at), Some(right_at)) => left_at.timestamp() == right_at.timestamp(),
        _ => false,
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{id: {}, name: {}, details: {}, resolved_at: {}, created_at: {}, updated_at: {}}}",
            self.id,
            self.name,
            Rendered(self.details.as_deref()),
            Rendered(self.resolved_at),
            Rendered(self.created_at),
            Rendered(self.updated_at),
        )
    }
}

/// Renders an optional value, using `<none>` when absent.
struct Rendered<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for Rendered<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(value) = &self.0 else {
            return f.write_str("<none>");
        };
        write!(f, "{value}")
    }
}
