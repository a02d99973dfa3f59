//! Error types for task validation.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Constraint violations reported by [`super::Task::validate`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The name is empty, too long, or contains disallowed characters.
    #[error(
        "name '{0}' must be 1 to {max} characters of letters, numbers, spaces, hyphens and colons",
        max = super::validation::NAME_MAX_LEN
    )]
    InvalidName(String),

    /// The details are too long or contain disallowed characters.
    #[error(
        "details '{0}' must be at most {max} characters of letters, numbers, spaces, hyphens and colons",
        max = super::validation::DETAILS_MAX_LEN
    )]
    InvalidDetails(String),

    /// An update timestamp is present on a task without an identity.
    #[error("updated_at '{0}' must be absent when the task has no assigned id")]
    UpdatedWithoutIdentity(DateTime<Utc>),

    /// The update timestamp precedes the creation timestamp.
    #[error("updated_at '{updated_at}' must not precede created_at '{created_at}'")]
    UpdatedBeforeCreated {
        /// Creation timestamp of the task.
        created_at: DateTime<Utc>,
        /// Offending update timestamp.
        updated_at: DateTime<Utc>,
    },
}
