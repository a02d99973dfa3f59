//! Field rules enforced before a task is written.

use super::{Task, ValidationError};
use regex::Regex;
use std::sync::LazyLock;

/// Maximum length of a task name.
pub const NAME_MAX_LEN: usize = 50;

/// Maximum length of task details.
pub const DETAILS_MAX_LEN: usize = 512;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| pattern(1, NAME_MAX_LEN));
static DETAILS_PATTERN: LazyLock<Regex> = LazyLock::new(|| pattern(0, DETAILS_MAX_LEN));

#[expect(
    clippy::expect_used,
    reason = "the pattern is built from constants and is covered by tests"
)]
fn pattern(min: usize, max: usize) -> Regex {
    Regex::new(&format!(r"\A[a-zA-Z0-9 \-:]{{{min},{max}}}\z"))
        .expect("task field pattern should compile")
}

pub(super) fn check_name(task: &Task) -> Result<(), ValidationError> {
    if NAME_PATTERN.is_match(task.name()) {
        return Ok(());
    }
    Err(ValidationError::InvalidName(task.name().to_owned()))
}

pub(super) fn check_details(task: &Task) -> Result<(), ValidationError> {
    let Some(details) = task.details() else {
        return Ok(());
    };
    if DETAILS_PATTERN.is_match(details) {
        return Ok(());
    }
    Err(ValidationError::InvalidDetails(details.to_owned()))
}

pub(super) fn check_updated_at(task: &Task) -> Result<(), ValidationError> {
    let Some(updated_at) = task.updated_at() else {
        return Ok(());
    };
    if task.id().is_unassigned() {
        return Err(ValidationError::UpdatedWithoutIdentity(updated_at));
    }
    if let Some(created_at) = task.created_at()
        && created_at.timestamp() > updated_at.timestamp()
    {
        return Err(ValidationError::UpdatedBeforeCreated {
            created_at,
            updated_at,
        });
    }
    Ok(())
}
