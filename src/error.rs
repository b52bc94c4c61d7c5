//! Typed failure causes for a single package check.
//!
//! These travel inside `anyhow::Error` and can be recovered with
//! `downcast_ref::<CheckError>()`.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum CheckError {
    /// No remote version could be found at all.
    NoVersion { package: String, source: String },
    /// The local version command exited unsuccessfully.
    VersionCommand {
        package: String,
        code: Option<i32>,
        output: String,
    },
    /// Text was available but the version pattern did not match it.
    Parse {
        package: String,
        pattern: String,
        output: String,
    },
    /// The remote source answered but could not be interpreted.
    Resolution { package: String, reason: String },
    /// An update is needed but no download URL is known.
    MissingDownloadUrl { package: String },
    /// Signature verification of a downloaded artifact failed.
    Verification { package: String, artifact: PathBuf },
    /// An install or pre-install command failed.
    Install {
        package: String,
        command: String,
        reason: String,
    },
}

impl std::fmt::Display for CheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckError::NoVersion { package, source } => {
                write!(f, "unable to determine remote version of {} from {}", package, source)
            }
            CheckError::VersionCommand {
                package,
                code,
                output,
            } => match code {
                Some(code) => write!(
                    f,
                    "unable to find version of {}: version command exited with status {}:\n{}",
                    package, code, output
                ),
                None => write!(
                    f,
                    "unable to find version of {}: version command was terminated:\n{}",
                    package, output
                ),
            },
            CheckError::Parse {
                package,
                pattern,
                output,
            } => write!(
                f,
                "unable to parse version of {} using {}:\n{}",
                package, pattern, output
            ),
            CheckError::Resolution { package, reason } => {
                write!(f, "unable to resolve {}: {}", package, reason)
            }
            CheckError::MissingDownloadUrl { package } => {
                write!(f, "unable to find download URL for {}", package)
            }
            CheckError::Verification { package, artifact } => write!(
                f,
                "signature verification failed for {} ({} removed)",
                package,
                artifact.display()
            ),
            CheckError::Install {
                package,
                command,
                reason,
            } => write!(f, "installing {} failed at `{}`: {}", package, command, reason),
        }
    }
}

impl std::error::Error for CheckError {}
