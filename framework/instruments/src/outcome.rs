use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// The timed result of a single dispatched request.
///
/// Dispatch failures are data, not errors: a timeout or connection failure still produces an
/// outcome, with the sentinel status `0` and the failure recorded in [RequestOutcome::error].
/// The VU loop always continues to its next iteration.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    /// HTTP status code, or `0` when the request never produced a response.
    pub status: u16,
    /// Wall-clock time from send to full response receipt, including connection setup.
    pub latency: Duration,
    pub body: Bytes,
    /// Wall-clock time the request was started.
    pub timestamp: DateTime<Utc>,
    /// The dispatch-level failure, when there was one.
    pub error: Option<String>,
}

impl RequestOutcome {
    pub fn new(status: u16, latency: Duration, body: Bytes, timestamp: DateTime<Utc>) -> Self {
        Self {
            status,
            latency,
            body,
            timestamp,
            error: None,
        }
    }

    pub fn dispatch_failure(latency: Duration, timestamp: DateTime<Utc>, error: String) -> Self {
        Self {
            status: 0,
            latency,
            body: Bytes::new(),
            timestamp,
            error: Some(error),
        }
    }

    pub fn is_dispatch_failure(&self) -> bool {
        self.status == 0
    }

    pub fn body_len(&self) -> usize {
        self.body.len()
    }
}
