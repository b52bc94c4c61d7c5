//! Hosted-release strategy.

use anyhow::{Context, Result};
use log::debug;

use crate::asset::{AssetPicker, LinuxAmd64Picker, find_deb_signature};
use crate::error::CheckError;
use crate::package::PackageSpec;
use crate::provider::{Provider, Release, RepoId};
use crate::template::TemplateVars;

use super::RemoteRelease;

/// Markers that identify a pre-release tag.
const PRERELEASE_MARKERS: &[&str] = &["rc", "beta", "alpha"];

pub(super) fn is_prerelease(release: &Release) -> bool {
    let tag = release.tag.to_lowercase();
    release.prerelease || PRERELEASE_MARKERS.iter().any(|m| tag.contains(m))
}

#[tracing::instrument(skip(provider, spec, vars))]
pub(super) async fn resolve(
    provider: &dyn Provider,
    spec: &PackageSpec,
    repo: &RepoId,
    vars: &TemplateVars,
) -> Result<RemoteRelease> {
    let releases = provider
        .list_releases(repo)
        .await
        .with_context(|| format!("Failed to list releases of {}", repo))?;

    let release = releases
        .iter()
        .find(|r| !is_prerelease(r))
        .ok_or_else(|| CheckError::NoVersion {
            package: spec.name.clone(),
            source: repo.to_string(),
        })?;

    let version = release.tag.trim_start_matches('v').to_string();
    debug!("{}: newest release of {} is {}", spec.name, repo, release.tag);

    // A configured template means the host does not publish usable assets.
    if let Some(template) = &spec.download_url_template {
        let url = vars.clone().with_version(&version).render(template)?;
        return Ok(RemoteRelease {
            version,
            download_url: Some(url),
            signature_url: None,
        });
    }

    let asset = LinuxAmd64Picker::new(spec.is_managed()).pick(&release.assets);
    if asset.is_none() {
        debug!("{}: no Linux amd64 asset in {}", spec.name, release.tag);
    }

    let signature_url = asset
        .filter(|_| spec.is_managed())
        .and_then(|deb| find_deb_signature(&release.assets, deb))
        .map(|a| a.download_url.clone());

    Ok(RemoteRelease {
        version,
        download_url: asset.map(|a| a.download_url.clone()),
        signature_url,
    })
}
