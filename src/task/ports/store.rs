//! Storage port: transactional task persistence and schema lifecycle.

use crate::task::domain::{Task, TaskId, ValidationError};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Result type for task store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Shared, type-erased backend error.
pub type BackendError = Arc<dyn std::error::Error + Send + Sync>;

/// Schema change requested through [`TaskStore::prepare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaChange {
    /// Apply every pending migration.
    Up,
    /// Revert the most recently applied migration.
    Down,
    /// Erase every schema object, migration bookkeeping included.
    Drop,
}

impl SchemaChange {
    /// Returns the canonical lowercase name of the change.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Drop => "drop",
        }
    }
}

impl TryFrom<&str> for SchemaChange {
    type Error = StoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "drop" => Ok(Self::Drop),
            _ => Err(StoreError::UnknownSchemaChange(value.to_owned())),
        }
    }
}

impl fmt::Display for SchemaChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task persistence contract.
///
/// Implementations are the only components allowed to mutate persisted
/// state. Every data operation runs in its own transaction which is
/// committed on success and rolled back on failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Establishes and verifies the backend connection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] when the backend is unreachable.
    async fn open(&self, parameters: &str) -> StoreResult<()>;

    /// Releases the backend connection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotOpen`] when the store was never opened.
    async fn close(&self) -> StoreResult<()>;

    /// Applies a schema change using migrations found at `source`.
    ///
    /// A change with nothing to do succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidSchemaSource`] when `source` cannot be
    /// read or [`StoreError::Schema`] when the backend rejects the change.
    async fn prepare(&self, change: SchemaChange, source: &str) -> StoreResult<()>;

    /// Persists a new task, assigning its identifier and `created_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IllAdvisedInsert`] when the task already carries
    /// an identifier and [`StoreError::Validation`] when it fails validation.
    async fn insert(&self, cancel: &CancellationToken, task: &mut Task) -> StoreResult<()>;

    /// Persists changes to an existing task, stamping `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record has the task's
    /// identifier and [`StoreError::Validation`] when it fails validation.
    async fn update(&self, cancel: &CancellationToken, task: &mut Task) -> StoreResult<()>;

    /// Reads a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the task does not exist.
    async fn read(&self, cancel: &CancellationToken, id: TaskId) -> StoreResult<Task>;

    /// Removes a task and returns its final persisted state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the task does not exist.
    async fn delete(&self, cancel: &CancellationToken, id: TaskId) -> StoreResult<Task>;

    /// Lists up to `limit` tasks in ascending identifier order after
    /// skipping `offset` of them. A `limit` of zero yields no tasks.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cancelled`] when `cancel` fires first.
    async fn list(
        &self,
        cancel: &CancellationToken,
        limit: u64,
        offset: u64,
    ) -> StoreResult<Vec<Task>>;
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Insert was called with a task that already has an identifier.
    #[error(
        "inserting a task with a non-zero id is inadvisable; pass a fresh task or update the existing record"
    )]
    IllAdvisedInsert,

    /// The task failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No task has the requested identifier.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The operation was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,

    /// The store has not been opened or was already closed.
    #[error("store is not open")]
    NotOpen,

    /// The backend could not be reached.
    #[error("connection error: {0}")]
    Connection(BackendError),

    /// The schema source could not be read.
    #[error("invalid schema source '{0}'")]
    InvalidSchemaSource(String),

    /// The schema change name is not recognised.
    #[error("unknown schema change '{0}', expected up, down or drop")]
    UnknownSchemaChange(String),

    /// The backend rejected a schema change.
    #[error("schema {change} failed: {cause}")]
    Schema {
        /// The change being applied.
        change: SchemaChange,
        /// The backend failure.
        cause: BackendError,
    },

    /// The backend rejected a statement.
    #[error("persistence error: {0}")]
    Backend(BackendError),

    /// A transaction was aborted; carries the rollback failure when the
    /// rollback itself failed.
    #[error("{}", describe_transaction(.original, .rollback.as_ref()))]
    Transaction {
        /// The failure that aborted the transaction.
        original: Box<Self>,
        /// The failure raised while rolling back, if any.
        rollback: Option<BackendError>,
    },
}

fn describe_transaction(original: &StoreError, rollback: Option<&BackendError>) -> String {
    rollback.map_or_else(
        || format!("transaction aborted ({original})"),
        |failure| format!("transaction aborted ({original}) and rollback failed ({failure})"),
    )
}

impl StoreError {
    /// Wraps a backend error.
    #[must_use]
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }

    /// Wraps a connection error.
    #[must_use]
    pub fn connection(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Connection(Arc::new(err))
    }

    /// Wraps a schema change failure.
    #[must_use]
    pub const fn schema(change: SchemaChange, err: BackendError) -> Self {
        Self::Schema { change, cause: err }
    }

    /// Combines a transaction failure with the outcome of its rollback.
    #[must_use]
    pub fn aborted(original: Self, rollback: Option<BackendError>) -> Self {
        Self::Transaction {
            original: Box::new(original),
            rollback,
        }
    }

    /// Returns `true` when the error, or the failure that aborted its
    /// transaction, is [`StoreError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Transaction { original, .. } => original.is_not_found(),
            _ => false,
        }
    }

    /// Returns `true` when the error stems from caller cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Transaction { original, .. } => original.is_cancelled(),
            _ => false,
        }
    }
}
