//! Diesel row models for task persistence.

use super::schema::tasks;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: i64,
    /// Task name.
    pub name: String,
    /// Optional details.
    pub details: Option<String>,
    /// Resolution timestamp.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert model for task records; the identifier comes from the sequence.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Task name.
    pub name: String,
    /// Optional details.
    pub details: Option<String>,
    /// Resolution timestamp.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Always unset on insert.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Update model for task records.
///
/// `treat_none_as_null` lets callers clear `details` and `resolved_at`.
/// `created_at` is absent; updates never touch it.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskChangeset {
    /// Task name.
    pub name: String,
    /// Optional details.
    pub details: Option<String>,
    /// Resolution timestamp.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}
