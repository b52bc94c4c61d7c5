//! Service factory for building application dependencies.
//!
//! Services are built from configuration values but are not part of the
//! configuration itself.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use log::debug;

use crate::application::PackageChecker;
use crate::config::Config;
use crate::http::HttpClient;
use crate::install::Installer;
use crate::provider::GitHubProvider;
use crate::resolve::Resolver;
use crate::runtime::Runtime;

/// Client for the release API. Carries the token, if any.
pub fn build_api_client(config: &Config) -> Result<HttpClient> {
    HttpClient::build(&config.user_agent, config.github_token.as_deref())
}

/// Client for vendor pages and downloads. Never carries the token.
pub fn build_web_client(config: &Config) -> Result<HttpClient> {
    HttpClient::build(&config.user_agent, None)
}

/// Build the per-package checker shared by every task of a run.
pub fn build_checker<R: Runtime + ?Sized>(
    runtime: Arc<R>,
    config: &Config,
) -> Result<PackageChecker<R>> {
    let provider = GitHubProvider::new(build_api_client(config)?, &config.github_api_url);
    let web = build_web_client(config)?;

    let home_bin_path = runtime
        .home_dir()
        .ok_or_else(|| anyhow!("Could not determine the home directory"))?
        .join("bin");
    debug!("Installing generic files into {:?}", home_bin_path);

    Ok(PackageChecker::new(
        runtime,
        Resolver::new(web.clone(), Arc::new(provider)),
        Installer::new(web),
        home_bin_path,
    ))
}
