//! Retry classification.
//!
//! # Responsibilities
//! - Decide whether a failed attempt is worth retrying
//! - Caller/client errors (auth, permission, missing rows, malformed input)
//!   fail fast; everything else is assumed transient
//!
//! # Design Decisions
//! - Classification is by case-insensitive substring on the error message,
//!   matching how the backend client reports these conditions
//! - Timeouts are transient; admission refusals are never retried here

use crate::error::Error;

/// Message fragments that identify a caller/client error. Retrying these
/// cannot succeed, so they abort the attempt loop immediately.
const NON_RETRYABLE_FRAGMENTS: &[&str] =
    &["unauthorized", "forbidden", "not found", "invalid input syntax"];

/// Whether a failed attempt should be retried (budget permitting).
pub fn is_retryable(error: &Error) -> bool {
    match error {
        Error::Timeout => true,
        Error::CircuitOpen | Error::KeyTypeConflict(_) => false,
        Error::Upstream(message) => {
            let message = message.to_lowercase();
            !NON_RETRYABLE_FRAGMENTS
                .iter()
                .any(|fragment| message.contains(fragment))
        }
    }
}
