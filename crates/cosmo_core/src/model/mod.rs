//! Domain model for groups (galaxies/systems) and planets (contacts).
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep the two-level group hierarchy expressed in the type system.
//!
//! # Invariants
//! - Identifiers are client-generated and never reused.
//! - Timestamps are epoch milliseconds.
//! - Deletion is immediate; there are no tombstones.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub mod group;
pub mod planet;

/// Validation failures detected before any write reaches storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Planet `full_name` is empty after trim.
    EmptyFullName,
    /// Group `name` is empty after trim.
    EmptyGroupName,
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyFullName => write!(f, "planet full_name must not be blank"),
            Self::EmptyGroupName => write!(f, "group name must not be blank"),
        }
    }
}

impl Error for ModelValidationError {}

/// Generates a fresh client-side identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
