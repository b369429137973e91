//! Error types for zoned-range operations.
//!
//! Only caller-input and environment failures live here. Constraint
//! violations found by [`RangeValidator`](crate::validator::RangeValidator)
//! are ordinary values ([`ValidationError`](crate::validator::ValidationError)),
//! not errors.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Invalid civil date-time: {0}")]
    InvalidCivilDateTime(String),

    #[error("Invalid time of day: {0}")]
    InvalidTimeOfDay(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Instant out of range: {0} ms")]
    InstantOutOfRange(i64),

    #[error("Nonexistent local time: {0}")]
    NonexistentLocalTime(String),

    #[error("Invalid constraints: {0}")]
    InvalidConstraints(String),

    #[error("Invalid constraint config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RangeError>;
