//! Failure kinds shared by the embedding and text-generation adapters, and
//! the bounded-timeout wrapper applied around every provider call.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by an external embedding or generation provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered with a client error that a retry cannot fix.
    #[error("Provider rejected request: {0}")]
    Rejected(String),

    #[error("Provider timed out after {0:?}")]
    Timeout(Duration),

    #[error("Provider config error: {0}")]
    Config(String),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Provider returned an empty response")]
    EmptyResponse,

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl ProviderError {
    /// Whether the failure was the call exceeding its time budget.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout(_))
    }

    /// Whether another attempt of the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Unavailable(_))
    }
}

/// Classify a non-success HTTP response: 429 and 5xx are transient,
/// any other status is a rejection.
pub(crate) fn status_error(
    context: &str,
    status: reqwest::StatusCode,
    body: &str,
) -> ProviderError {
    let message = format!("{context}: {status} {body}");
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        ProviderError::Unavailable(message)
    } else {
        ProviderError::Rejected(message)
    }
}

/// Run a provider call under a time budget.
///
/// Expiry surfaces as [`ProviderError::Timeout`], distinct from
/// [`ProviderError::Unavailable`].
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_result_within_budget() {
        let value = with_timeout(Duration::from_secs(1), async { Ok::<_, ProviderError>(7) })
            .await
            .expect("within budget");
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn passes_through_inner_error() {
        let err = with_timeout(Duration::from_secs(1), async {
            Err::<(), _>(ProviderError::Unavailable("down".into()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
        assert!(!err.is_timeout());
    }

    #[test]
    fn only_throttling_and_server_errors_are_retryable() {
        use reqwest::StatusCode;

        for status in [StatusCode::TOO_MANY_REQUESTS, StatusCode::BAD_GATEWAY] {
            assert!(status_error("call", status, "").is_retryable(), "{status}");
        }
        for status in [StatusCode::BAD_REQUEST, StatusCode::UNAUTHORIZED] {
            let err = status_error("call", status, "invalid key");
            assert!(matches!(err, ProviderError::Rejected(_)), "{status}");
            assert!(!err.is_retryable());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_is_reported_as_timeout() {
        let err = with_timeout(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, ProviderError>(())
        })
        .await
        .unwrap_err();
        assert!(err.is_timeout());
    }
}
