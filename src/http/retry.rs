//! Classification of HTTP failures into retryable and permanent ones.

use reqwest::StatusCode;

/// Maximum number of attempts for a network operation.
pub(crate) const MAX_RETRIES: usize = 3;

/// Delay between attempts in milliseconds.
pub(crate) const RETRY_DELAY_MS: u64 = 1000;

/// HTTP failures that will not succeed on a second try.
#[derive(Debug, Clone, PartialEq)]
pub enum NonRetryableError {
    /// HTTP 429, or 403 carrying a rate-limit message
    RateLimited { url: String },
    /// HTTP 401
    Unauthorized { url: String },
    /// HTTP 403 without a rate-limit message
    Forbidden { url: String },
    /// HTTP 404
    NotFound { url: String },
    /// Any other 4xx status
    ClientError { url: String, status: u16 },
}

impl std::fmt::Display for NonRetryableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonRetryableError::RateLimited { url } => write!(
                f,
                "rate limit exceeded for {}; try again later or configure a GitHub token",
                url
            ),
            NonRetryableError::Unauthorized { url } => {
                write!(f, "authentication failed for {}; check the GitHub token", url)
            }
            NonRetryableError::Forbidden { url } => write!(f, "access to {} is forbidden", url),
            NonRetryableError::NotFound { url } => write!(f, "{} was not found (HTTP 404)", url),
            NonRetryableError::ClientError { url, status } => {
                write!(f, "request to {} failed with HTTP {}", url, status)
            }
        }
    }
}

impl std::error::Error for NonRetryableError {}

/// Classifies an error as retryable (`Ok`) or permanent (`Err`).
fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    let Some(status) = error.status() else {
        // Connection errors, timeouts, etc.
        return Ok(());
    };

    let url = error
        .url()
        .map(|u| u.to_string())
        .unwrap_or_else(|| "<unknown url>".to_string());

    match status {
        StatusCode::UNAUTHORIZED => Err(NonRetryableError::Unauthorized { url }),
        StatusCode::FORBIDDEN => {
            if error.to_string().contains("rate limit") {
                Err(NonRetryableError::RateLimited { url })
            } else {
                Err(NonRetryableError::Forbidden { url })
            }
        }
        StatusCode::TOO_MANY_REQUESTS => Err(NonRetryableError::RateLimited { url }),
        StatusCode::NOT_FOUND => Err(NonRetryableError::NotFound { url }),
        s if s.is_client_error() => Err(NonRetryableError::ClientError {
            url,
            status: s.as_u16(),
        }),
        // 5xx
        _ => Ok(()),
    }
}

/// Maps an error from `error_for_status()` to an `anyhow::Error`, wrapping
/// permanent failures in [`NonRetryableError`] so the retry loop stops.
pub(crate) fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn status_error(status: usize) -> reqwest::Error {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/page")
            .with_status(status)
            .create_async()
            .await;

        let response = reqwest::Client::new()
            .get(format!("{}/page", server.url()))
            .send()
            .await
            .unwrap();
        response.error_for_status().unwrap_err()
    }

    #[test]
    fn test_display_mentions_url() {
        let err = NonRetryableError::NotFound {
            url: "https://example.com/x".into(),
        };
        assert!(err.to_string().contains("https://example.com/x"));
        assert!(err.to_string().contains("404"));

        let err = NonRetryableError::ClientError {
            url: "https://example.com/y".into(),
            status: 410,
        };
        assert!(err.to_string().contains("HTTP 410"));
        assert!(err.to_string().contains("https://example.com/y"));
    }

    #[tokio::test]
    async fn test_classify_client_errors() {
        assert!(matches!(
            classify_error(&status_error(401).await),
            Err(NonRetryableError::Unauthorized { .. })
        ));
        assert!(matches!(
            classify_error(&status_error(403).await),
            Err(NonRetryableError::Forbidden { .. })
        ));
        assert!(matches!(
            classify_error(&status_error(429).await),
            Err(NonRetryableError::RateLimited { .. })
        ));
        assert!(matches!(
            classify_error(&status_error(404).await),
            Err(NonRetryableError::NotFound { .. })
        ));
        assert!(matches!(
            classify_error(&status_error(400).await),
            Err(NonRetryableError::ClientError { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn test_classify_server_error_is_retryable() {
        assert!(classify_error(&status_error(503).await).is_ok());
    }

    #[tokio::test]
    async fn test_check_retryable_wraps_permanent_failures() {
        let err = check_retryable(status_error(404).await);
        match err.downcast_ref::<NonRetryableError>() {
            Some(NonRetryableError::NotFound { url }) => assert!(url.ends_with("/page")),
            other => panic!("unexpected error: {:?}", other),
        }

        let err = check_retryable(status_error(500).await);
        assert!(err.downcast_ref::<NonRetryableError>().is_none());
    }
}
