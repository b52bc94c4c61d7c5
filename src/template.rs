//! Rendering of download URL and install command templates.

use anyhow::{Context as _, Result};
use serde::Serialize;
use std::path::Path;
use tera::{Context, Tera};

/// Values available to every template as `{{ name }}`, `{{ version }}`, ...
#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateVars {
    /// Configuration key of the package.
    pub name: String,
    pub display_name: String,
    /// Resolved remote version; empty until known.
    pub version: String,
    /// The user's personal binary directory (`~/bin`).
    pub home_bin_path: String,
    /// Full path of the downloaded artifact inside the scratch directory.
    pub downloaded_file: String,
    pub temp_dir: String,
}

impl TemplateVars {
    pub fn new(name: &str, display_name: &str, home_bin_path: &Path) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            home_bin_path: home_bin_path.to_string_lossy().into_owned(),
            ..Default::default()
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Render `template` against these values.
    pub fn render(&self, template: &str) -> Result<String> {
        let context = Context::from_serialize(self).context("Failed to build template context")?;
        Tera::one_off(template, &context, false)
            .with_context(|| format!("Failed to render template '{}'", template))
    }
}
