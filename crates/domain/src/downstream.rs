//! Bounded peer calls.
//!
//! Every call from one component into another goes through [`call`]. A call
//! that does not finish within its timeout is abandoned and surfaces as
//! [`DomainError::DownstreamUnavailable`]; it is never retried.

use std::future::Future;
use std::time::Duration;

use crate::error::DomainError;

/// Per-call timeout used when none is configured.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(3);

/// Runs `fut` against `peer`, failing with `DownstreamUnavailable` on timeout.
pub async fn call<T, E, F>(peer: &'static str, timeout: Duration, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<DomainError>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            metrics::counter!("downstream_timeouts_total", "peer" => peer).increment(1);
            tracing::warn!(peer, timeout_ms = timeout.as_millis() as u64, "peer call timed out");
            Err(DomainError::DownstreamUnavailable {
                peer,
                reason: format!("timed out after {}ms", timeout.as_millis()),
            }
            .into())
        }
    }
}
