//! Reading the version of what is installed on this host.

use anyhow::{Context, Result};
use log::debug;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::error::CheckError;
use crate::package::PackageSpec;
use crate::runtime::Runtime;

/// Status string dpkg reports for a fully installed package.
const DPKG_INSTALLED: &str = "install ok installed";

const DPKG_SHOW_FORMAT: &str = r#"--showformat={"version":"${Version}","status":"${Status}"}"#;

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[\x1b\x{9b}][\[\]()#;?]*(?:(?:(?:[a-zA-Z\d]*(?:;[a-zA-Z\d]*)*)?\x07)|(?:(?:\d{1,4}(?:;\d{0,4})*)?[\dA-PRZcf-ntqry=><~]))",
    )
    .expect("ANSI escape pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalVersion {
    Installed(String),
    NotInstalled,
}

impl LocalVersion {
    pub fn as_installed(&self) -> Option<&str> {
        match self {
            LocalVersion::Installed(v) => Some(v),
            LocalVersion::NotInstalled => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DpkgRecord {
    version: String,
    status: String,
}

/// Remove terminal colour and cursor escape sequences.
pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

/// Determine the installed version of `spec`.
///
/// A missing package or executable is [`LocalVersion::NotInstalled`]. An
/// executable whose output does not match the version pattern is an error.
#[tracing::instrument(skip(runtime, spec), fields(package = %spec.name))]
pub async fn local_version<R: Runtime + ?Sized>(
    runtime: &R,
    spec: &PackageSpec,
) -> Result<LocalVersion> {
    if spec.is_managed() {
        managed_version(runtime, &spec.display_name).await
    } else {
        executable_version(runtime, spec).await
    }
}

async fn managed_version<R: Runtime + ?Sized>(runtime: &R, package: &str) -> Result<LocalVersion> {
    let args = vec![
        DPKG_SHOW_FORMAT.to_string(),
        "--show".to_string(),
        package.to_string(),
    ];
    let out = runtime
        .capture("dpkg-query", &args)
        .await
        .context("Failed to query the package database")?;

    if !out.success {
        debug!("dpkg-query does not know {}: {}", package, out.output.trim());
        return Ok(LocalVersion::NotInstalled);
    }

    let record: DpkgRecord = serde_json::from_str(out.output.trim())
        .with_context(|| format!("Unexpected dpkg-query output for {}", package))?;

    if record.status != DPKG_INSTALLED {
        debug!("{} has dpkg status '{}'", package, record.status);
        return Ok(LocalVersion::NotInstalled);
    }

    Ok(LocalVersion::Installed(record.version))
}

async fn executable_version<R: Runtime + ?Sized>(
    runtime: &R,
    spec: &PackageSpec,
) -> Result<LocalVersion> {
    let Some(path) = runtime.which(&spec.display_name) else {
        debug!("{} not found on PATH", spec.display_name);
        return Ok(LocalVersion::NotInstalled);
    };

    let program = path.to_string_lossy();
    let out = runtime
        .capture(&program, &spec.local_version_command)
        .await
        .with_context(|| format!("Failed to run {}", program))?;

    let text = strip_ansi(&out.output);
    if !out.success {
        return Err(CheckError::VersionCommand {
            package: spec.name.clone(),
            code: out.code,
            output: text,
        }
        .into());
    }

    let version = spec
        .local_version_pattern
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| CheckError::Parse {
            package: spec.name.clone(),
            pattern: spec.local_version_pattern.as_str().to_string(),
            output: text.clone(),
        })?;

    Ok(LocalVersion::Installed(version))
}
