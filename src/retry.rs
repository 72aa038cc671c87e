use crate::types::{NotifierError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Attempts made per operation before a rate limit becomes fatal.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Wait used when the rate-limit signal carries no usable hint.
pub const FALLBACK_WAIT: Duration = Duration::from_secs(45);

/// Hinted waits shorter than this are treated as unusable.
pub const MIN_WAIT: Duration = Duration::from_secs(10);

static RETRY_IN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)retry in (\d+(?:\.\d+)?)\s*s").expect("retry pattern is valid"));

/// Parse a suggested wait out of a rate-limit message, matching the
/// service's free-text "retry in N s" hint. The parsed value is rounded up
/// by one whole second. Returns None when no hint is present.
pub fn parse_retry_after(message: &str) -> Option<Duration> {
    let captures = RETRY_IN_RE.captures(message)?;
    let seconds: f64 = captures.get(1)?.as_str().parse().ok()?;
    Some(Duration::from_secs(seconds as u64 + 1))
}

/// Wait to apply for a given rate-limit message: the parsed hint when it is
/// present and at least the floor, the fixed fallback otherwise.
pub fn wait_for(message: &str) -> Duration {
    match parse_retry_after(message) {
        Some(wait) if wait >= MIN_WAIT => wait,
        _ => FALLBACK_WAIT,
    }
}

/// Run `op` up to `max_attempts` times, sleeping between attempts when it
/// fails with a rate-limit error. Any other error propagates immediately.
/// Exhausting the attempt budget re-raises the last rate-limit error.
pub async fn with_retry<T, F, Fut>(max_attempts: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(NotifierError::RateLimited { message }) => {
                if attempt < max_attempts {
                    let wait = wait_for(&message);
                    warn!(
                        "Rate limited, retrying in {}s ({}/{})",
                        wait.as_secs(),
                        attempt,
                        max_attempts
                    );
                    last_error = Some(NotifierError::RateLimited { message });
                    tokio::time::sleep(wait).await;
                } else {
                    last_error = Some(NotifierError::RateLimited { message });
                }
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or(NotifierError::RateLimited {
        message: "retries exhausted".to_string(),
    }))
}
