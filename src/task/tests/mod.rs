//! Unit tests for the task module.
//!
//! Tests are organised by layer: the domain model, the in-memory store, the
//! core service, and the middleware chain.
