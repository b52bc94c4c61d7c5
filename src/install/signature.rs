//! Detached signature verification with GnuPG.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::Path;

use crate::error::CheckError;
use crate::runtime::Runtime;

const GPG: &str = "gpg2";

/// Verify `artifact` against `signature`. The artifact is deleted when the
/// signature does not check out.
#[tracing::instrument(skip(runtime))]
pub async fn verify<R: Runtime + ?Sized>(
    runtime: &R,
    package: &str,
    signature: &Path,
    artifact: &Path,
) -> Result<()> {
    let args = vec![
        "--verify".to_string(),
        signature.to_string_lossy().into_owned(),
        artifact.to_string_lossy().into_owned(),
    ];
    let out = runtime
        .capture(GPG, &args)
        .await
        .with_context(|| format!("Failed to run {}", GPG))?;

    if out.success {
        debug!("{}: signature OK", package);
        return Ok(());
    }

    warn!("{}: {} rejected the signature:\n{}", package, GPG, out.output.trim());
    if let Err(e) = runtime.remove_file(artifact) {
        warn!("Failed to remove {:?}: {}", artifact, e);
    }

    Err(CheckError::Verification {
        package: package.to_string(),
        artifact: artifact.to_path_buf(),
    }
    .into())
}
