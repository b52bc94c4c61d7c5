//! CLI command implementations.

mod services;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};

use crate::application::{InstallUseCase, UpdateReport, UpdateUseCase};
use crate::config::Config;
use crate::runtime::Runtime;

pub use services::{build_api_client, build_checker, build_web_client};

/// Locate and load the configuration. `api_url` overrides the configured
/// release API endpoint.
pub fn load_config<R: Runtime + ?Sized>(
    runtime: &R,
    config_path: Option<PathBuf>,
    api_url: Option<String>,
) -> Result<Config> {
    let path = Config::locate(runtime, config_path)?;
    let mut config = Config::load(runtime, &path)?;
    if let Some(api_url) = api_url {
        config.github_api_url = api_url;
    }
    Ok(config)
}

/// Check the configured packages (or those in `names`) and update any that
/// are behind. Only configuration problems are errors.
#[tracing::instrument(skip(runtime, config_path, api_url))]
pub async fn update<R: Runtime + 'static>(
    runtime: R,
    config_path: Option<PathBuf>,
    api_url: Option<String>,
    names: &[String],
) -> Result<UpdateReport> {
    let config = load_config(&runtime, config_path, api_url)?;
    if config.packages.is_empty() {
        warn!("No packages configured");
    }

    let checker = build_checker(Arc::new(runtime), &config)?;
    let use_case = UpdateUseCase::new(Arc::new(checker), config.packages);
    let report = use_case.update(names).await;

    info!(
        "{} updated, {} up to date, {} not installed, {} failed",
        report.updated.len(),
        report.up_to_date.len(),
        report.skipped.len(),
        report.failed.len()
    );
    Ok(report)
}

/// Install a configured package that is not installed yet.
#[tracing::instrument(skip(runtime, config_path, api_url))]
pub async fn install<R: Runtime + 'static>(
    runtime: R,
    config_path: Option<PathBuf>,
    api_url: Option<String>,
    name: &str,
) -> Result<()> {
    let config = load_config(&runtime, config_path, api_url)?;
    let checker = build_checker(Arc::new(runtime), &config)?;
    let version = InstallUseCase::new(Arc::new(checker), config.packages)
        .install(name)
        .await?;
    println!("{} {} installed", name, version);
    Ok(())
}
