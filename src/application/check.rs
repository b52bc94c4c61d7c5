//! Check action - one package, end to end.
//!
//! Reads the local version, resolves the remote one, compares them and
//! installs the remote release when the local copy is behind.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use log::debug;

use crate::install::Installer;
use crate::package::PackageSpec;
use crate::resolve::{RemoteRelease, Resolver};
use crate::runtime::Runtime;
use crate::template::TemplateVars;
use crate::version::{LocalVersion, is_up_to_date, local_version};

/// Result of checking one package
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// Not installed on this host; nothing to do
    NotInstalled,
    /// Local version satisfies the newest remote version
    UpToDate { local: String },
    /// The source publishes nothing right now
    NothingPublished,
    /// A newer release was installed
    Updated { from: String, to: String },
}

/// Shared by every task of a run.
pub struct PackageChecker<R: Runtime + ?Sized> {
    runtime: Arc<R>,
    resolver: Resolver,
    installer: Installer,
    home_bin_path: PathBuf,
}

impl<R: Runtime + ?Sized> PackageChecker<R> {
    pub fn new(
        runtime: Arc<R>,
        resolver: Resolver,
        installer: Installer,
        home_bin_path: PathBuf,
    ) -> Self {
        Self {
            runtime,
            resolver,
            installer,
            home_bin_path,
        }
    }

    pub fn template_vars(&self, spec: &PackageSpec) -> TemplateVars {
        TemplateVars::new(&spec.name, &spec.display_name, &self.home_bin_path)
    }

    pub async fn local_version(&self, spec: &PackageSpec) -> Result<LocalVersion> {
        local_version(self.runtime.as_ref(), spec).await
    }

    pub async fn resolve(&self, spec: &PackageSpec) -> Result<Option<RemoteRelease>> {
        self.resolver.resolve(spec, &self.template_vars(spec)).await
    }

    pub async fn install(&self, spec: &PackageSpec, remote: &RemoteRelease) -> Result<()> {
        self.installer
            .install_from(self.runtime.as_ref(), spec, &self.template_vars(spec), remote)
            .await
    }

    /// Check `spec` and update it if needed.
    #[tracing::instrument(skip(self, spec), fields(package = %spec.name))]
    pub async fn check_and_update(&self, spec: &PackageSpec) -> Result<CheckOutcome> {
        let local = match self.local_version(spec).await? {
            LocalVersion::Installed(v) => v,
            LocalVersion::NotInstalled => {
                debug!("{} is not installed, skipping", spec.name);
                return Ok(CheckOutcome::NotInstalled);
            }
        };

        let Some(remote) = self.resolve(spec).await? else {
            println!("{} is up to date ({}, nothing published)", spec.display_name, local);
            return Ok(CheckOutcome::NothingPublished);
        };

        if is_up_to_date(&remote.version, &local) {
            println!("{} is up to date ({})", spec.display_name, local);
            return Ok(CheckOutcome::UpToDate { local });
        }

        println!(
            "{} needs updating: {} (local: {}, remote: {})",
            spec.display_name,
            remote.download_url.as_deref().unwrap_or("-"),
            local,
            remote.version
        );
        self.install(spec, &remote).await?;

        Ok(CheckOutcome::Updated {
            from: local,
            to: remote.version,
        })
    }
}
