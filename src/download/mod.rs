use crate::http::HttpClient;
use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// Downloads `url` into `dest` through the runtime's file abstraction.
#[tracing::instrument(skip(runtime, dest, http_client))]
pub async fn download_file<R: Runtime + ?Sized>(
    runtime: &R,
    url: &str,
    dest: &Path,
    http_client: &HttpClient,
) -> Result<u64> {
    info!("Downloading {}...", url);

    let bytes = http_client
        .download_file(url, || {
            runtime
                .create_file(dest)
                .with_context(|| format!("Failed to create {:?}", dest))
        })
        .await?;

    info!("Downloaded {} bytes to {:?}", bytes, dest);
    Ok(bytes)
}
