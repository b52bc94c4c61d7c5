use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;
use anyhow::Result;

/// Per-check scratch directory, removed with its contents when dropped.
pub struct ScratchDir<'a, R: Runtime + ?Sized> {
    runtime: &'a R,
    path: PathBuf,
}

impl<'a, R: Runtime + ?Sized> ScratchDir<'a, R> {
    /// Create a fresh scratch directory whose name starts with `prefix`.
    pub fn create(runtime: &'a R, prefix: &str) -> Result<Self> {
        let path = runtime.create_temp_dir(prefix)?;
        debug!("Created scratch directory {:?}", path);
        Ok(Self { runtime, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<R: Runtime + ?Sized> Drop for ScratchDir<'_, R> {
    fn drop(&mut self) {
        debug!("Cleaning up: {:?}", self.path);
        if let Err(e) = self.runtime.remove_dir_all(&self.path) {
            warn!("Failed to remove scratch directory {:?}: {}", self.path, e);
        }
    }
}
