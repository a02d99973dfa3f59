//! Structured request logging for task service calls.

use super::middleware::{BoxedTaskService, Middleware};
use crate::task::{
    domain::{Task, TaskId},
    ports::{ServiceError, ServiceResult, TaskService},
};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::Dispatch;
use uuid::Uuid;

/// Middleware that records one event per service call.
///
/// Each event carries a fresh `request_id`, the `operation` name, the
/// rendered `parameters` captured before the call, and either the rendered
/// `response` (at INFO) or the `error` (at WARN). Events go to the injected
/// [`Dispatch`], not the global subscriber.
#[derive(Debug, Clone)]
pub struct LoggingMiddleware {
    dispatch: Dispatch,
}

impl LoggingMiddleware {
    /// Creates a middleware that logs to `dispatch`.
    #[must_use]
    pub const fn new(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }
}

impl Middleware for LoggingMiddleware {
    fn wrap(&self, next: BoxedTaskService) -> BoxedTaskService {
        Box::new(LoggedTaskService {
            next,
            dispatch: self.dispatch.clone(),
        })
    }
}

/// Task service decorated by [`LoggingMiddleware`].
pub struct LoggedTaskService {
    next: BoxedTaskService,
    dispatch: Dispatch,
}

impl LoggedTaskService {
    fn record(&self, operation: &str, parameters: &str, outcome: Result<String, &ServiceError>) {
        let request_id = Uuid::new_v4();
        tracing::dispatcher::with_default(&self.dispatch, || match outcome {
            Ok(response) => tracing::info!(
                request_id = %request_id,
                operation,
                parameters,
                response = response.as_str(),
                "task service call completed"
            ),
            Err(error) => tracing::warn!(
                request_id = %request_id,
                operation,
                parameters,
                error = %error,
                "task service call failed"
            ),
        });
    }
}

fn render_page(tasks: &[Task]) -> String {
    let rendered: Vec<String> = tasks.iter().map(Task::to_string).collect();
    format!("[{}]", rendered.join(", "))
}

#[async_trait]
impl TaskService for LoggedTaskService {
    async fn create(&self, cancel: &CancellationToken, task: &mut Task) -> ServiceResult<()> {
        let parameters = task.to_string();
        let result = self.next.create(cancel, task).await;
        self.record(
            "task create",
            &parameters,
            result.as_ref().map(|()| task.to_string()),
        );
        result
    }

    async fn update(&self, cancel: &CancellationToken, task: &mut Task) -> ServiceResult<()> {
        let parameters = task.to_string();
        let result = self.next.update(cancel, task).await;
        self.record(
            "task update",
            &parameters,
            result.as_ref().map(|()| task.to_string()),
        );
        result
    }

    async fn read(&self, cancel: &CancellationToken, id: TaskId) -> ServiceResult<Task> {
        let parameters = id.to_string();
        let result = self.next.read(cancel, id).await;
        self.record("task read", &parameters, result.as_ref().map(Task::to_string));
        result
    }

    async fn delete(&self, cancel: &CancellationToken, id: TaskId) -> ServiceResult<Task> {
        let parameters = id.to_string();
        let result = self.next.delete(cancel, id).await;
        self.record("task delete", &parameters, result.as_ref().map(Task::to_string));
        result
    }

    async fn list(
        &self,
        cancel: &CancellationToken,
        limit: u64,
        offset: u64,
    ) -> ServiceResult<Vec<Task>> {
        let parameters = format!("{{limit: {limit}, offset: {offset}}}");
        let result = self.next.list(cancel, limit, offset).await;
        self.record(
            "task list",
            &parameters,
            result.as_deref().map(render_page),
        );
        result
    }

    async fn shutdown(&self) -> ServiceResult<()> {
        let result = self.next.shutdown().await;
        self.record("task shutdown", "", result.as_ref().map(|()| String::new()));
        result
    }
}
