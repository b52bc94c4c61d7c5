//! HTTP client with built-in retry logic and error handling.

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;
use std::io::Write;

use super::retry::{MAX_RETRIES, NonRetryableError, RETRY_DELAY_MS, check_retryable};

/// Default User-Agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "keepup/",
    env!("KEEPUP_VERSION"),
    " (host package updater; +https://github.com/keepup)"
);

/// HTTP client with built-in retry logic for network operations.
///
/// Every response with a status of 400 or above is an error.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client with the given User-Agent and optional GitHub token.
    pub fn build(user_agent: &str, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();

        if let Some(token) = token {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
                .context("GitHub token contains invalid characters")?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("HTTP client configured with authentication");
        }

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::new(client))
    }

    /// Performs a GET request with query parameters and deserializes the JSON response.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        debug!("GET JSON from {} with query {:?}...", url, query);

        self.with_retry("GET JSON", || async {
            let response = self
                .client
                .get(url)
                .query(query)
                .send()
                .await
                .with_context(|| format!("Failed to send request to {}", url))?;

            let response = response.error_for_status().map_err(check_retryable)?;

            response
                .json::<T>()
                .await
                .with_context(|| format!("Failed to parse JSON response from {}", url))
        })
        .await
    }

    /// Performs a GET request and returns the body as text.
    #[tracing::instrument(skip(self))]
    pub async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}...", url);

        self.with_retry("GET page", || async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .with_context(|| format!("Failed to send request to {}", url))?;

            let response = response.error_for_status().map_err(check_retryable)?;

            response
                .text()
                .await
                .with_context(|| format!("Failed to read response body from {}", url))
        })
        .await
    }

    /// Streams the body of `url` into the writer produced by `create_writer`.
    /// The writer is only created once the server has answered successfully.
    #[tracing::instrument(skip(self, create_writer))]
    pub async fn download_file<W, F>(&self, url: &str, create_writer: F) -> Result<u64>
    where
        W: Write,
        F: Fn() -> Result<W>,
    {
        debug!("Downloading file from {}...", url);

        let create_writer = &create_writer;
        self.with_retry("Download", move || self.download_file_once(url, create_writer))
            .await
    }

    async fn download_file_once<W, F>(&self, url: &str, create_writer: &F) -> Result<u64>
    where
        W: Write,
        F: Fn() -> Result<W>,
    {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to start download from {}", url))?;

        let mut response = response.error_for_status().map_err(check_retryable)?;

        let mut writer = create_writer()?;
        let mut downloaded_bytes: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .context("Failed to read chunk from download stream")?
        {
            writer
                .write_all(&chunk)
                .context("Failed to write chunk to file")?;
            downloaded_bytes += chunk.len() as u64;
        }
        writer.flush().context("Failed to flush downloaded file")?;

        debug!(
            "Downloaded {:.2} MB",
            downloaded_bytes as f64 / (1024.0 * 1024.0)
        );

        Ok(downloaded_bytes)
    }

    /// Executes an async operation, retrying transient failures.
    async fn with_retry<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.downcast_ref::<NonRetryableError>().is_some() => {
                    debug!("{}: non-retryable error: {}", operation_name, e);
                    return Err(e);
                }
                Err(e) if attempt >= MAX_RETRIES => return Err(e),
                Err(e) => {
                    warn!(
                        "{}: attempt {}/{} failed ({:#}), retrying in {}ms...",
                        operation_name, attempt, MAX_RETRIES, e, RETRY_DELAY_MS
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(RETRY_DELAY_MS)).await;
                    attempt += 1;
                }
            }
        }
    }
}
