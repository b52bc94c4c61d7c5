//! Remote version resolution.
//!
//! Each [`SourceKind`] has one strategy. The result is the newest published
//! version and, when it can be determined, where to download it.

mod page;
mod release;

use anyhow::{Context, Result};
use log::debug;
use std::sync::Arc;

use crate::error::CheckError;
use crate::http::HttpClient;
use crate::package::{PackageSpec, SourceKind};
use crate::provider::Provider;
use crate::template::TemplateVars;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemoteRelease {
    /// Version with any leading "v" removed.
    pub version: String,
    pub download_url: Option<String>,
    /// Detached signature for `download_url`.
    pub signature_url: Option<String>,
}

pub struct Resolver {
    http_client: HttpClient,
    provider: Arc<dyn Provider>,
}

impl Resolver {
    /// `http_client` is used for pages and version probes; `provider` for
    /// hosted releases.
    pub fn new(http_client: HttpClient, provider: Arc<dyn Provider>) -> Self {
        Self {
            http_client,
            provider,
        }
    }

    /// Find the newest version of `spec`.
    ///
    /// Returns `Ok(None)` only for a page source that allows an empty result
    /// and has no matching link.
    #[tracing::instrument(skip(self, spec, vars), fields(package = %spec.name))]
    pub async fn resolve(
        &self,
        spec: &PackageSpec,
        vars: &TemplateVars,
    ) -> Result<Option<RemoteRelease>> {
        let remote = match &spec.source {
            SourceKind::HostedRelease { repo } => {
                release::resolve(self.provider.as_ref(), spec, repo, vars).await?
            }
            SourceKind::UrlSelector {
                url,
                selector,
                pattern,
            } => {
                let body = self.http_client.get_text(url).await?;
                let version = page::version_from_selector(spec, url, &body, selector, pattern)?;
                let download_url = render_download_url(spec, vars, &version)?;
                RemoteRelease {
                    version,
                    download_url,
                    signature_url: None,
                }
            }
            SourceKind::UrlRegex { url, pattern } => {
                let body = self.http_client.get_text(url).await?;
                match page::first_matching_link(url, &body, pattern)? {
                    Some(link) => RemoteRelease {
                        version: link.version,
                        download_url: Some(link.href),
                        signature_url: None,
                    },
                    None if spec.allow_empty => {
                        debug!("{}: no matching link on {}, nothing published", spec.name, url);
                        return Ok(None);
                    }
                    None => return Err(no_version(spec).into()),
                }
            }
            SourceKind::DirectDownload {
                version_url,
                version_pattern,
            } => {
                let body = self.http_client.get_text(version_url).await?;
                let version = version_pattern
                    .captures(&body)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().trim().trim_start_matches('v').to_string())
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| no_version(spec))?;
                let download_url = render_download_url(spec, vars, &version)?;
                RemoteRelease {
                    version,
                    download_url,
                    signature_url: None,
                }
            }
        };

        if remote.version.is_empty() {
            return Err(no_version(spec).into());
        }

        debug!(
            "{}: remote version {} ({})",
            spec.name,
            remote.version,
            remote.download_url.as_deref().unwrap_or("no download URL")
        );
        Ok(Some(remote))
    }
}

fn no_version(spec: &PackageSpec) -> CheckError {
    CheckError::NoVersion {
        package: spec.name.clone(),
        source: spec.source.location(),
    }
}

fn render_download_url(
    spec: &PackageSpec,
    vars: &TemplateVars,
    version: &str,
) -> Result<Option<String>> {
    spec.download_url_template
        .as_deref()
        .map(|template| {
            vars.clone()
                .with_version(version)
                .render(template)
                .with_context(|| format!("Invalid download URL template for {}", spec.name))
        })
        .transpose()
}
