//! Bounded polling for an accepted submission.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::{CodeHubError, Result};

/// Call `probe` up to `attempts` times, `interval` apart, until it yields a value.
///
/// Errors from the probe stop the loop immediately.
pub async fn poll_until<T, F, Fut>(interval: Duration, attempts: u32, mut probe: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    for attempt in 1..=attempts {
        if let Some(found) = probe().await? {
            return Ok(found);
        }
        debug!(attempt, attempts, "Nothing yet");
        if attempt < attempts {
            tokio::time::sleep(interval).await;
        }
    }

    Err(CodeHubError::SubmissionNotFound { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_found_on_third_attempt() {
        let calls = AtomicU32::new(0);
        let found = poll_until(Duration::ZERO, 10, || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok((n == 3).then_some(n)) }
        })
        .await
        .unwrap();

        assert_eq!(found, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = poll_until(Duration::ZERO, 10, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(None) }
        })
        .await;

        assert!(matches!(result, Err(CodeHubError::SubmissionNotFound { attempts: 10 })));
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_probe_error_stops_polling() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = poll_until(Duration::ZERO, 10, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CodeHubError::SubmissionIncomplete("code")) }
        })
        .await;

        assert!(matches!(result, Err(CodeHubError::SubmissionIncomplete("code"))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
