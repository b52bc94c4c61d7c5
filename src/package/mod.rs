//! Declarative description of a tracked package.
//!
//! A [`PackageSpec`] is produced once by the configuration layer and is
//! immutable for the rest of the run.

use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::provider::RepoId;

/// Arguments passed to a binary to make it print its version.
pub const DEFAULT_VERSION_COMMAND: &[&str] = &["--version"];

/// Matches the first dotted numeric run in version output.
pub const DEFAULT_VERSION_PATTERN: &str = "([0-9.]+)";

/// Where a package's remote version comes from. Exactly one strategy runs per check.
#[derive(Debug, Clone)]
pub enum SourceKind {
    /// Releases listed by a hosted release API for `owner/repo`.
    HostedRelease { repo: RepoId },
    /// First node matching `selector` on the page at `url`; `pattern` is applied
    /// to its text and all capture groups are joined with ".".
    UrlSelector {
        url: String,
        selector: Selector,
        pattern: Regex,
    },
    /// First hyperlink on the page at `url` whose href yields a capture from `pattern`.
    UrlRegex { url: String, pattern: Regex },
    /// Version probed from `version_url`; the download URL comes from the template.
    DirectDownload {
        version_url: String,
        version_pattern: Regex,
    },
}

impl SourceKind {
    pub fn tag(&self) -> SourceTag {
        match self {
            SourceKind::HostedRelease { .. } => SourceTag::HostedRelease,
            SourceKind::UrlSelector { .. } => SourceTag::UrlSelector,
            SourceKind::UrlRegex { .. } => SourceTag::UrlRegex,
            SourceKind::DirectDownload { .. } => SourceTag::DirectDownload,
        }
    }

    /// Human readable location used in log and error messages.
    pub fn location(&self) -> String {
        match self {
            SourceKind::HostedRelease { repo } => repo.to_string(),
            SourceKind::UrlSelector { url, .. } | SourceKind::UrlRegex { url, .. } => url.clone(),
            SourceKind::DirectDownload { version_url, .. } => version_url.clone(),
        }
    }
}

/// Configuration tag selecting a [`SourceKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceTag {
    HostedRelease,
    UrlSelector,
    UrlRegex,
    DirectDownload,
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceTag::HostedRelease => "hosted-release",
            SourceTag::UrlSelector => "url-selector",
            SourceTag::UrlRegex => "url-regex",
            SourceTag::DirectDownload => "direct-download",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum InstallKind {
    /// Installed through the OS package manager (`dpkg`).
    ManagedPackage,
    /// A file placed into the user's personal binary directory.
    #[default]
    GenericFile,
}

#[derive(Debug, Clone)]
pub struct PackageSpec {
    /// Lookup key in the configuration.
    pub name: String,
    /// Executable or OS package name; defaults to `name`.
    pub display_name: String,
    pub source: SourceKind,
    pub download_url_template: Option<String>,
    pub local_version_command: Vec<String>,
    /// Has at least one capture group.
    pub local_version_pattern: Regex,
    pub install: InstallKind,
    pub pre_install_command: Option<String>,
    pub install_commands: Vec<String>,
    /// A page without a matching link means "nothing published", not a failure.
    pub allow_empty: bool,
}

impl PackageSpec {
    /// Minimal generic-file spec with default version probing. Used by tests
    /// and as the base the configuration layer fills in.
    pub fn new(name: &str, source: SourceKind) -> Self {
        Self {
            name: name.to_string(),
            display_name: name.to_string(),
            source,
            download_url_template: None,
            local_version_command: DEFAULT_VERSION_COMMAND
                .iter()
                .map(|s| s.to_string())
                .collect(),
            local_version_pattern: Regex::new(DEFAULT_VERSION_PATTERN)
                .expect("default version pattern is valid"),
            install: InstallKind::GenericFile,
            pre_install_command: None,
            install_commands: Vec::new(),
            allow_empty: false,
        }
    }

    pub fn is_managed(&self) -> bool {
        self.install == InstallKind::ManagedPackage
    }
}
