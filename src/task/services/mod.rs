//! Application services for task management.
//!
//! [`CoreTaskService`] forwards to a store; [`Middleware`] layers such as
//! [`LoggingMiddleware`] decorate it while keeping the same contract.

mod core_service;
mod logging;
mod middleware;

pub use core_service::CoreTaskService;
pub use logging::{LoggedTaskService, LoggingMiddleware};
pub use middleware::{BoxedTaskService, Middleware, compose, new_service};
