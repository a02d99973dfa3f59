//! Service port: the public task contract shared by every layer.

use super::StoreError;
use crate::task::domain::{Task, TaskId};
use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Result type for task service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Public task contract.
///
/// The core service and every middleware implement this trait, so callers
/// cannot tell how many decorators sit in front of the store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Creates a task; on success the task carries its assigned identity.
    ///
    /// # Errors
    ///
    /// Propagates the store failure unchanged.
    async fn create(&self, cancel: &CancellationToken, task: &mut Task) -> ServiceResult<()>;

    /// Updates a task; on success the task carries its new `updated_at`.
    ///
    /// # Errors
    ///
    /// Propagates the store failure unchanged.
    async fn update(&self, cancel: &CancellationToken, task: &mut Task) -> ServiceResult<()>;

    /// Reads a task by identifier.
    ///
    /// # Errors
    ///
    /// Propagates the store failure unchanged.
    async fn read(&self, cancel: &CancellationToken, id: TaskId) -> ServiceResult<Task>;

    /// Deletes a task, returning its final persisted state.
    ///
    /// # Errors
    ///
    /// Propagates the store failure unchanged.
    async fn delete(&self, cancel: &CancellationToken, id: TaskId) -> ServiceResult<Task>;

    /// Lists a page of tasks ordered by identifier.
    ///
    /// # Errors
    ///
    /// Propagates the store failure unchanged.
    async fn list(
        &self,
        cancel: &CancellationToken,
        limit: u64,
        offset: u64,
    ) -> ServiceResult<Vec<Task>>;

    /// Releases the resources held by the service.
    ///
    /// # Errors
    ///
    /// Propagates the store failure unchanged.
    async fn shutdown(&self) -> ServiceResult<()>;
}

/// Errors surfaced through the service contract.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The caller's payload could not be parsed into a task.
    #[error("malformed input: {0}")]
    MalformedInput(#[from] serde_json::Error),

    /// Storage failure, passed through unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse classification used by transport adapters to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The request could not be parsed.
    BadRequest,
    /// The request was understood but violates a constraint.
    UnprocessableEntity,
    /// The addressed task does not exist.
    NotFound,
    /// Any other failure.
    Internal,
}

impl ServiceError {
    /// Classifies the error for transport mapping.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MalformedInput(_) => ErrorClass::BadRequest,
            Self::Store(StoreError::Validation(_) | StoreError::IllAdvisedInsert) => {
                ErrorClass::UnprocessableEntity
            }
            Self::Store(err) if err.is_not_found() => ErrorClass::NotFound,
            Self::Store(_) => ErrorClass::Internal,
        }
    }

    /// Returns the underlying store error, if any.
    #[must_use]
    pub const fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Store(err) => Some(err),
            Self::MalformedInput(_) => None,
        }
    }
}
