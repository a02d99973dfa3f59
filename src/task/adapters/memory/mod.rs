//! In-memory adapter for tests and local development.

mod task;

pub use task::InMemoryTaskStore;
