//! Decorator composition over [`TaskService`].

use super::CoreTaskService;
use crate::task::ports::{TaskService, TaskStore};
use std::sync::Arc;

/// Owned, type-erased task service.
pub type BoxedTaskService = Box<dyn TaskService>;

/// Wraps a task service in another implementing the same contract.
///
/// Any `Fn(BoxedTaskService) -> BoxedTaskService` closure is a middleware.
pub trait Middleware: Send + Sync {
    /// Returns a service that decorates `next`.
    fn wrap(&self, next: BoxedTaskService) -> BoxedTaskService;
}

impl<F> Middleware for F
where
    F: Fn(BoxedTaskService) -> BoxedTaskService + Send + Sync,
{
    fn wrap(&self, next: BoxedTaskService) -> BoxedTaskService {
        self(next)
    }
}

/// Applies `middlewares` around `base` so that the first entry is the
/// outermost layer: `compose([m1, m2], base)` is `m1(m2(base))`.
#[must_use]
pub fn compose(middlewares: Vec<Box<dyn Middleware>>, base: BoxedTaskService) -> BoxedTaskService {
    middlewares
        .into_iter()
        .rev()
        .fold(base, |next, middleware| middleware.wrap(next))
}

/// Builds a [`CoreTaskService`] over `store` and wraps it in `middlewares`.
#[must_use]
pub fn new_service<S>(middlewares: Vec<Box<dyn Middleware>>, store: Arc<S>) -> BoxedTaskService
where
    S: TaskStore + ?Sized + 'static,
{
    compose(middlewares, Box::new(CoreTaskService::new(store)))
}
