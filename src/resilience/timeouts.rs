//! Per-attempt deadline enforcement.
//!
//! Uses Tokio's timeout facility; the losing future is dropped, so a timed
//! out attempt cannot leak its timer or keep running inside this layer.

use std::future::Future;
use std::time::Duration;

use crate::error::Error;

/// Race `operation` against `limit`, mapping expiry to [`Error::Timeout`].
pub async fn with_deadline<T, F>(limit: Duration, operation: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout),
    }
}
