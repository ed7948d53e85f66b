//! Identity and clock sources for new aggregates.
//!
//! The value types in [`crate::models::todo`] never generate ids or timestamps
//! on their own; whoever builds a new value calls these functions explicitly.

use chrono::Utc;

/// Fresh random identifier, used for both todo items and subtasks.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Timestamp for a write that follows one stamped `previous`.
///
/// Always strictly greater than `previous`, even when the clock has not moved
/// or went backwards.
pub fn next_millis(previous: i64) -> i64 {
    now_millis().max(previous.saturating_add(1))
}
