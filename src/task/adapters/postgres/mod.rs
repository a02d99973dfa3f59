//! `PostgreSQL` adapter for task persistence.

mod migrations;
mod models;
mod schema;
mod store;
mod transaction;

pub use store::{PostgresTaskStore, TaskPgPool};
