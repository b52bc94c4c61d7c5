//! Runtime abstraction for system operations.
//!
//! This module provides a trait-based abstraction over system operations,
//! enabling dependency injection and testability.
//!
//! # Structure
//!
//! - `env` - Environment variables, directories, privilege and PATH lookup
//! - `fs` - File system operations (read, write, scratch directories)
//! - `process` - Child process execution (captured or inherited stdio)

mod env;
mod fs;
mod process;

use anyhow::Result;
use async_trait::async_trait;
use std::env as std_env;
use std::path::{Path, PathBuf};

pub use process::CapturedOutput;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;

    // File System
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn create_file(&self, path: &Path) -> Result<Box<dyn std::io::Write + Send>>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;

    /// Create a fresh, uniquely named directory under the system temp dir.
    /// The caller owns the directory and is responsible for removing it.
    fn create_temp_dir(&self, prefix: &str) -> Result<PathBuf>;

    // Directories
    fn home_dir(&self) -> Option<PathBuf>;
    fn config_dir(&self) -> Option<PathBuf>;

    // Privilege
    fn is_privileged(&self) -> bool;

    /// Locate an executable on the search path.
    fn which(&self, program: &str) -> Option<PathBuf>;

    // Processes
    /// Run a program with stdin closed, capturing stdout and stderr together.
    /// A non-zero exit status is reported in the output, not as an error.
    async fn capture(&self, program: &str, args: &[String]) -> Result<CapturedOutput>;

    /// Run a program in the user's environment with inherited standard streams.
    /// A non-zero exit status is an error.
    async fn run(&self, program: &str, args: &[String]) -> Result<()>;
}

pub struct RealRuntime;

#[async_trait]
impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path)
    }

    fn create_file(&self, path: &Path) -> Result<Box<dyn std::io::Write + Send>> {
        self.create_file_impl(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.remove_file_impl(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.remove_dir_all_impl(path)
    }

    fn create_temp_dir(&self, prefix: &str) -> Result<PathBuf> {
        self.create_temp_dir_impl(prefix)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir_impl()
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.config_dir_impl()
    }

    fn is_privileged(&self) -> bool {
        self.is_privileged_impl()
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        self.which_impl(program)
    }

    async fn capture(&self, program: &str, args: &[String]) -> Result<CapturedOutput> {
        self.capture_impl(program, args).await
    }

    async fn run(&self, program: &str, args: &[String]) -> Result<()> {
        self.run_impl(program, args).await
    }
}
