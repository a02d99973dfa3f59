//! Core task service: the innermost layer of every chain.

use crate::task::{
    domain::{Task, TaskId},
    ports::{ServiceResult, TaskService, TaskStore},
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Service that forwards each call to a [`TaskStore`] unchanged.
pub struct CoreTaskService<S>
where
    S: TaskStore + ?Sized,
{
    store: Arc<S>,
}

impl<S> CoreTaskService<S>
where
    S: TaskStore + ?Sized,
{
    /// Creates a service backed by `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S> Clone for CoreTaskService<S>
where
    S: TaskStore + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

#[async_trait]
impl<S> TaskService for CoreTaskService<S>
where
    S: TaskStore + ?Sized,
{
    async fn create(&self, cancel: &CancellationToken, task: &mut Task) -> ServiceResult<()> {
        Ok(self.store.insert(cancel, task).await?)
    }

    async fn update(&self, cancel: &CancellationToken, task: &mut Task) -> ServiceResult<()> {
        Ok(self.store.update(cancel, task).await?)
    }

    async fn read(&self, cancel: &CancellationToken, id: TaskId) -> ServiceResult<Task> {
        Ok(self.store.read(cancel, id).await?)
    }

    async fn delete(&self, cancel: &CancellationToken, id: TaskId) -> ServiceResult<Task> {
        Ok(self.store.delete(cancel, id).await?)
    }

    async fn list(
        &self,
        cancel: &CancellationToken,
        limit: u64,
        offset: u64,
    ) -> ServiceResult<Vec<Task>> {
        Ok(self.store.list(cancel, limit, offset).await?)
    }

    async fn shutdown(&self) -> ServiceResult<()> {
        Ok(self.store.close().await?)
    }
}
