//! Install action - first install of a configured package.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};

use crate::error::CheckError;
use crate::package::PackageSpec;
use crate::runtime::Runtime;
use crate::version::LocalVersion;

use super::check::PackageChecker;

pub struct InstallUseCase<R: Runtime + ?Sized> {
    checker: Arc<PackageChecker<R>>,
    packages: BTreeMap<String, PackageSpec>,
}

impl<R: Runtime + ?Sized> InstallUseCase<R> {
    pub fn new(checker: Arc<PackageChecker<R>>, packages: BTreeMap<String, PackageSpec>) -> Self {
        Self { checker, packages }
    }

    /// Install `name`, which must be configured and not yet installed.
    /// Returns the installed version.
    #[tracing::instrument(skip(self))]
    pub async fn install(&self, name: &str) -> Result<String> {
        let spec = self
            .packages
            .get(name)
            .ok_or_else(|| anyhow!("No package named '{}' is configured", name))?;

        if let LocalVersion::Installed(version) = self.checker.local_version(spec).await? {
            bail!("{} is already installed ({})", spec.display_name, version);
        }

        let remote = self
            .checker
            .resolve(spec)
            .await?
            .ok_or_else(|| CheckError::NoVersion {
                package: spec.name.clone(),
                source: spec.source.location(),
            })?;

        println!(
            "{} will be installed: {} ({})",
            spec.display_name,
            remote.download_url.as_deref().unwrap_or("-"),
            remote.version
        );
        self.checker.install(spec, &remote).await?;

        Ok(remote.version)
    }
}
