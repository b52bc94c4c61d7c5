//! Child process execution.

use anyhow::{Context, Result, bail};
use log::debug;
use std::process::Stdio;
use tokio::process::Command;

use super::RealRuntime;

/// Combined stdout/stderr of a finished child process.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CapturedOutput {
    pub success: bool,
    pub code: Option<i32>,
    /// stdout followed by stderr, lossily decoded
    pub output: String,
}

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) async fn capture_impl(
        &self,
        program: &str,
        args: &[String],
    ) -> Result<CapturedOutput> {
        debug!("Capturing output of {} {:?}", program, args);

        let out = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", program))?;

        let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&out.stderr));

        Ok(CapturedOutput {
            success: out.status.success(),
            code: out.status.code(),
            output,
        })
    }

    #[tracing::instrument(skip(self))]
    pub(crate) async fn run_impl(&self, program: &str, args: &[String]) -> Result<()> {
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .with_context(|| format!("Failed to execute {}", program))?;

        if !status.success() {
            match status.code() {
                Some(code) => bail!("{} exited with status {}", program, code),
                None => bail!("{} was terminated by a signal", program),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_capture_combines_stdout_and_stderr() {
        let runtime = RealRuntime;
        let out = runtime
            .capture("sh", &args(&["-c", "echo out; echo err 1>&2"]))
            .await
            .unwrap();

        assert!(out.success);
        assert_eq!(out.code, Some(0));
        assert!(out.output.contains("out"));
        assert!(out.output.contains("err"));
    }

    #[tokio::test]
    async fn test_capture_reports_failure_without_error() {
        let runtime = RealRuntime;
        let out = runtime.capture("sh", &args(&["-c", "exit 3"])).await.unwrap();

        assert!(!out.success);
        assert_eq!(out.code, Some(3));
    }

    #[tokio::test]
    async fn test_capture_missing_program_is_error() {
        let runtime = RealRuntime;
        let result = runtime
            .capture("definitely-not-an-installed-program-keepup", &[])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_status() {
        let runtime = RealRuntime;

        assert!(runtime.run("true", &[]).await.is_ok());

        let err = runtime.run("sh", &args(&["-c", "exit 4"])).await.unwrap_err();
        assert!(err.to_string().contains("exited with status 4"));
    }
}
