//! Configuration loading and validation.
//!
//! The YAML file is deserialized into loosely typed [`RawPackage`] records
//! which are then validated, once, into [`PackageSpec`]s. Any problem here is
//! fatal for the whole run and is reported before any package is checked.

use anyhow::{Context, Result, anyhow, bail};
use log::debug;
use regex::Regex;
use scraper::Selector;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::http::DEFAULT_USER_AGENT;
use crate::package::{
    DEFAULT_VERSION_COMMAND, DEFAULT_VERSION_PATTERN, InstallKind, PackageSpec, SourceKind,
    SourceTag,
};
use crate::provider::{DEFAULT_GITHUB_API_URL, RepoId};
use crate::runtime::Runtime;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "KEEPUP_CONFIG";

/// `\j` in a version regex stands for one version character.
const VERSION_CHAR_SHORTHAND: &str = r"\j";
const VERSION_CHAR_CLASS: &str = "[0-9.]";

/// Pattern applied to a version URL body when none is configured.
const DEFAULT_VERSION_URL_PATTERN: &str = "(.*)";

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    #[serde(default)]
    pub auth: Auth,
    pub github_api_url: Option<String>,
    pub user_agent: Option<String>,
    #[serde(default)]
    pub packages: BTreeMap<String, RawPackage>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Auth {
    #[serde(default)]
    pub github: GitHubAuth,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct GitHubAuth {
    pub token: Option<String>,
}

/// One package entry as written in the file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawPackage {
    pub source: SourceTag,
    pub name: Option<String>,
    pub repo: Option<String>,
    pub url: Option<String>,
    pub selector: Option<String>,
    pub regexp: Option<String>,
    pub version_url: Option<String>,
    pub version_url_regex: Option<String>,
    pub download_url: Option<String>,
    pub version_command: Option<Vec<String>>,
    pub version_regex: Option<String>,
    #[serde(default)]
    pub install: InstallKind,
    pub install_pre_command: Option<String>,
    #[serde(default)]
    pub install_commands: Vec<String>,
    #[serde(default)]
    pub allow_missing: bool,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub github_api_url: String,
    pub github_token: Option<String>,
    pub user_agent: String,
    pub packages: BTreeMap<String, PackageSpec>,
}

impl Config {
    /// Resolve the configuration file location: explicit path, then
    /// `KEEPUP_CONFIG`, then `<config_dir>/keepup/config.yaml`.
    pub fn locate<R: Runtime + ?Sized>(runtime: &R, explicit: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path);
        }
        if let Ok(path) = runtime.env_var(CONFIG_ENV) {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        let dir = runtime
            .config_dir()
            .ok_or_else(|| anyhow!("Could not determine the configuration directory"))?;
        Ok(dir.join("keepup").join("config.yaml"))
    }

    /// Read and validate the configuration file at `path`.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime + ?Sized>(runtime: &R, path: &Path) -> Result<Self> {
        debug!("Loading configuration from {:?}", path);
        let text = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?;
        let mut config = Self::from_yaml(&text)
            .with_context(|| format!("Invalid configuration {}", path.display()))?;

        if config.github_token.is_none() {
            config.github_token = runtime
                .env_var("GITHUB_TOKEN")
                .ok()
                .filter(|t| !t.is_empty());
        }

        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(text).context("Failed to parse YAML")?;

        let mut packages = BTreeMap::new();
        for (name, raw_package) in raw.packages {
            let spec = validate_package(&name, raw_package)
                .with_context(|| format!("Invalid package '{}'", name))?;
            packages.insert(name, spec);
        }

        Ok(Self {
            github_api_url: raw
                .github_api_url
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            github_token: raw.auth.github.token.filter(|t| !t.is_empty()),
            user_agent: raw
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            packages,
        })
    }
}

/// Compile a pattern that must contain at least one capture group.
fn capture_regex(field: &str, pattern: &str) -> Result<Regex> {
    let re = Regex::new(pattern).with_context(|| format!("{} is not a valid regex", field))?;
    // captures_len counts the implicit whole-match group
    if re.captures_len() < 2 {
        bail!("{} '{}' must contain at least one capture group", field, pattern);
    }
    Ok(re)
}

fn required(field: &str, value: Option<String>, tag: SourceTag) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("source {} requires '{}'", tag, field))
}

/// Fields that only make sense for some strategies. Setting one for a
/// different strategy is rejected rather than silently ignored.
fn reject_foreign_fields(raw: &RawPackage) -> Result<()> {
    let owners: [(&str, bool, &[SourceTag]); 6] = [
        ("repo", raw.repo.is_some(), &[SourceTag::HostedRelease]),
        (
            "url",
            raw.url.is_some(),
            &[SourceTag::UrlSelector, SourceTag::UrlRegex],
        ),
        ("selector", raw.selector.is_some(), &[SourceTag::UrlSelector]),
        (
            "regexp",
            raw.regexp.is_some(),
            &[SourceTag::UrlSelector, SourceTag::UrlRegex],
        ),
        (
            "version_url",
            raw.version_url.is_some(),
            &[SourceTag::DirectDownload],
        ),
        (
            "version_url_regex",
            raw.version_url_regex.is_some(),
            &[SourceTag::DirectDownload],
        ),
    ];

    for (field, present, allowed) in owners {
        if present && !allowed.contains(&raw.source) {
            bail!("'{}' cannot be used with source {}", field, raw.source);
        }
    }

    if raw.allow_missing && raw.source != SourceTag::UrlRegex {
        bail!("'allow_missing' only applies to source url-regex");
    }

    Ok(())
}

fn validate_package(name: &str, raw: RawPackage) -> Result<PackageSpec> {
    reject_foreign_fields(&raw)?;

    let tag = raw.source;
    let source = match tag {
        SourceTag::HostedRelease => SourceKind::HostedRelease {
            repo: required("repo", raw.repo, tag)?.parse::<RepoId>()?,
        },
        SourceTag::UrlSelector => {
            let selector_text = required("selector", raw.selector, tag)?;
            let selector = Selector::parse(&selector_text)
                .map_err(|e| anyhow!("selector '{}' is invalid: {}", selector_text, e))?;
            SourceKind::UrlSelector {
                url: required("url", raw.url, tag)?,
                selector,
                pattern: capture_regex("regexp", &required("regexp", raw.regexp, tag)?)?,
            }
        }
        SourceTag::UrlRegex => SourceKind::UrlRegex {
            url: required("url", raw.url, tag)?,
            pattern: capture_regex("regexp", &required("regexp", raw.regexp, tag)?)?,
        },
        SourceTag::DirectDownload => {
            if raw.download_url.as_deref().is_none_or(str::is_empty) {
                bail!("source {} requires 'download_url'", tag);
            }
            SourceKind::DirectDownload {
                version_url: required("version_url", raw.version_url, tag)?,
                version_pattern: capture_regex(
                    "version_url_regex",
                    raw.version_url_regex
                        .as_deref()
                        .unwrap_or(DEFAULT_VERSION_URL_PATTERN),
                )?,
            }
        }
    };

    let version_pattern = raw
        .version_regex
        .as_deref()
        .unwrap_or(DEFAULT_VERSION_PATTERN)
        .replace(VERSION_CHAR_SHORTHAND, VERSION_CHAR_CLASS);

    let local_version_command = match raw.version_command {
        Some(args) if !args.is_empty() => args,
        _ => DEFAULT_VERSION_COMMAND.iter().map(|s| s.to_string()).collect(),
    };

    let mut spec = PackageSpec::new(name, source);
    spec.display_name = raw
        .name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| name.to_string());
    spec.download_url_template = raw.download_url.filter(|u| !u.is_empty());
    spec.local_version_command = local_version_command;
    spec.local_version_pattern = capture_regex("version_regex", &version_pattern)?;
    spec.install = raw.install;
    spec.pre_install_command = raw.install_pre_command.filter(|c| !c.trim().is_empty());
    spec.install_commands = raw.install_commands;
    spec.allow_empty = raw.allow_missing;

    Ok(spec)
}
