//! Task service: CRUD management of task records.
//!
//! Callers talk to a [`TaskService`](task::ports::TaskService) built from a
//! core service over a transactional [`TaskStore`](task::ports::TaskStore),
//! optionally wrapped in middleware such as structured request logging.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: the task model with its sanitize and validate pipeline
//! - **Ports**: the store and service contracts
//! - **Adapters**: `PostgreSQL` and in-memory stores
//! - **Services**: the core service and its middleware chain
//!
//! # Modules
//!
//! - [`task`]: task model, storage and service layers
//! - [`config`]: environment-driven configuration
//! - [`telemetry`]: log dispatcher construction

pub mod config;
pub mod task;
pub mod telemetry;
