//! Domain model for the task entity.
//!
//! The domain defines the record shape and the sanitize/validate pipeline
//! that every write passes through. Identity and timestamps are assigned by
//! storage adapters, never by callers.

mod draft;
mod error;
mod ids;
mod task;
mod validation;

pub use draft::TaskDraft;
pub use error::ValidationError;
pub use ids::TaskId;
pub use task::{PersistedTaskData, Task};
pub use validation::{DETAILS_MAX_LEN, NAME_MAX_LEN};
