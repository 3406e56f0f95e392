//! Retry policy for the document upload side-channel.

use std::time::Duration;

use reqwest::header::HeaderMap;

pub(crate) const RETRY_ATTEMPT_HEADER: &str = "x-esg-retry-attempt";

/// A server asking for a longer pause than this is treated as a final failure
/// rather than stalling the session's upload note.
const MAX_RETRY_AFTER_SECS: u64 = 60;
const MAX_BACKOFF_EXPONENT: u32 = 5;
const ERROR_BODY_EXCERPT_CHARS: usize = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UploadRetryPolicy {
    max_attempts: usize,
    base_delay_ms: u64,
}

impl UploadRetryPolicy {
    pub(crate) fn new(max_attempts: usize, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms: base_delay_ms.max(1),
        }
    }

    /// Delay before retrying after `attempt` (1-based) got `status`, or `None`
    /// when the response is final.
    pub(crate) fn after_status(
        &self,
        attempt: usize,
        status: u16,
        headers: &HeaderMap,
    ) -> Option<Duration> {
        if attempt >= self.max_attempts || !(status == 429 || (500..600).contains(&status)) {
            return None;
        }
        match retry_after_seconds(headers) {
            Some(seconds) if seconds > MAX_RETRY_AFTER_SECS => None,
            Some(seconds) => Some(Duration::from_secs(seconds)),
            None => Some(self.backoff(attempt)),
        }
    }

    /// Connect failures and timeouts are retried. A request the client could
    /// not even build is not.
    pub(crate) fn after_transport_error(
        &self,
        attempt: usize,
        error: &reqwest::Error,
    ) -> Option<Duration> {
        if attempt >= self.max_attempts || !(error.is_connect() || error.is_timeout()) {
            return None;
        }
        Some(self.backoff(attempt))
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let exponent = u32::try_from(attempt.saturating_sub(1))
            .unwrap_or(MAX_BACKOFF_EXPONENT)
            .min(MAX_BACKOFF_EXPONENT);
        Duration::from_millis(self.base_delay_ms.saturating_mul(1_u64 << exponent))
    }
}

fn retry_after_seconds(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Collapses an error page to one line short enough for a transcript note.
pub(crate) fn error_body_excerpt(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= ERROR_BODY_EXCERPT_CHARS {
        return collapsed;
    }
    let mut excerpt = collapsed
        .chars()
        .take(ERROR_BODY_EXCERPT_CHARS)
        .collect::<String>();
    excerpt.push_str("...");
    excerpt
}
