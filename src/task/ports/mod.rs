//! Port contracts for task management.
//!
//! Ports define infrastructure-agnostic interfaces: [`TaskStore`] for
//! persistence and [`TaskService`] for the public contract that the core
//! service and its middleware share.

pub mod service;
pub mod store;

pub use service::{ErrorClass, ServiceError, ServiceResult, TaskService};
pub use store::{BackendError, SchemaChange, StoreError, StoreResult, TaskStore};

#[cfg(test)]
pub use service::MockTaskService;
#[cfg(test)]
pub use store::MockTaskStore;
