//! Storage adapters for the task module.
//!
//! - [`memory::InMemoryTaskStore`]: thread-safe in-memory storage
//! - [`postgres::PostgresTaskStore`]: `PostgreSQL` persistence using Diesel
//!
//! Both resolve schema locations through [`MigrationSource`].

mod migration_source;
pub mod memory;
pub mod postgres;

pub use migration_source::MigrationSource;
