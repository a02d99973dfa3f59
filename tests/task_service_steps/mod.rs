//! Step definitions for task service scenarios.


mod given;
mod when;
