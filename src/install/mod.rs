//! Download and install driver.

mod commands;
mod signature;

use anyhow::{Context, Result};
use log::info;
use std::path::Path;

use crate::cleanup::ScratchDir;
use crate::download::download_file;
use crate::error::CheckError;
use crate::http::HttpClient;
use crate::package::PackageSpec;
use crate::resolve::RemoteRelease;
use crate::runtime::Runtime;
use crate::template::TemplateVars;

pub use commands::{MANAGED_INSTALL_COMMAND, install_commands};

/// Prefix of every scratch directory.
const SCRATCH_PREFIX: &str = "keepup-";

#[derive(Clone)]
pub struct Installer {
    http_client: HttpClient,
}

impl Installer {
    pub fn new(http_client: HttpClient) -> Self {
        Self { http_client }
    }

    /// Download `remote` and run the install commands for `spec`.
    ///
    /// Everything happens inside a scratch directory that is removed on
    /// return, whether or not the install succeeded.
    #[tracing::instrument(skip(self, runtime, spec, vars), fields(package = %spec.name))]
    pub async fn install_from<R: Runtime + ?Sized>(
        &self,
        runtime: &R,
        spec: &PackageSpec,
        vars: &TemplateVars,
        remote: &RemoteRelease,
    ) -> Result<()> {
        let url = remote
            .download_url
            .as_deref()
            .ok_or_else(|| CheckError::MissingDownloadUrl {
                package: spec.name.clone(),
            })?;

        let scratch = ScratchDir::create(runtime, SCRATCH_PREFIX)?;
        let downloaded = scratch.path().join(&spec.name);

        download_file(runtime, url, &downloaded, &self.http_client).await?;

        if let Some(signature_url) = &remote.signature_url {
            let signature = scratch.path().join(format!("{}.asc", spec.name));

            download_file(runtime, signature_url, &signature, &self.http_client).await?;
            signature::verify(runtime, &spec.name, &signature, &downloaded).await?;
        }

        let mut vars = vars.clone().with_version(&remote.version);
        vars.downloaded_file = downloaded.to_string_lossy().into_owned();
        vars.temp_dir = scratch.path().to_string_lossy().into_owned();

        let commands = install_commands(spec, url);

        if let Some(pre) = &spec.pre_install_command {
            commands::run_template(runtime, spec, &vars, pre).await?;
        }

        if commands::uses_default_commands(spec) {
            runtime
                .create_dir_all(Path::new(&vars.home_bin_path))
                .with_context(|| format!("Failed to create {}", vars.home_bin_path))?;
        }

        for command in &commands {
            commands::run_template(runtime, spec, &vars, command).await?;
        }

        info!("{} {} installed", spec.display_name, remote.version);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{InstallKind, SourceKind};
    use crate::runtime::{CapturedOutput, MockRuntime};
    use regex::Regex;
    use reqwest::Client;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    fn spec(name: &str) -> PackageSpec {
        PackageSpec::new(
            name,
            SourceKind::UrlRegex {
                url: "https://example.com".into(),
                pattern: Regex::new("(x)").unwrap(),
            },
        )
    }

    fn vars(name: &str) -> TemplateVars {
        TemplateVars::new(name, name, Path::new("/home/user/bin"))
    }

    fn remote(url: Option<String>) -> RemoteRelease {
        RemoteRelease {
            version: "2.0.0".into(),
            download_url: url,
            signature_url: None,
        }
    }

    fn scratch_runtime(runtime: &mut MockRuntime) {
        runtime
            .expect_create_temp_dir()
            .returning(|_| Ok(PathBuf::from("/tmp/keepup-t")));
        runtime
            .expect_remove_dir_all()
            .with(mockall::predicate::eq(PathBuf::from("/tmp/keepup-t")))
            .times(1)
            .returning(|_| Ok(()));
        runtime
            .expect_create_file()
            .returning(|_| Ok(Box::new(std::io::sink())));
        runtime.expect_is_privileged().returning(|| false);
    }

    #[tokio::test]
    async fn test_missing_download_url() {
        let mut runtime = MockRuntime::new();
        runtime.expect_create_temp_dir().never();

        let installer = Installer::new(HttpClient::new(Client::new()));
        let err = installer
            .install_from(&runtime, &spec("tool"), &vars("tool"), &remote(None))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CheckError>(),
            Some(CheckError::MissingDownloadUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_default_tar_gz_install_sequence() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rg.tar.gz")
            .with_status(200)
            .with_body("archive")
            .create_async()
            .await;

        let ran = Arc::new(Mutex::new(Vec::new()));
        let mut runtime = MockRuntime::new();
        scratch_runtime(&mut runtime);
        runtime
            .expect_create_dir_all()
            .with(mockall::predicate::eq(PathBuf::from("/home/user/bin")))
            .returning(|_| Ok(()));
        let log = Arc::clone(&ran);
        runtime.expect_run().returning(move |program, args| {
            let mut line = vec![program.to_string()];
            line.extend(args.iter().cloned());
            log.lock().unwrap().push(line.join(" "));
            Ok(())
        });

        let installer = Installer::new(HttpClient::new(Client::new()));
        installer
            .install_from(
                &runtime,
                &spec("rg"),
                &vars("rg"),
                &remote(Some(format!("{}/rg.tar.gz", server.url()))),
            )
            .await
            .unwrap();

        assert_eq!(
            *ran.lock().unwrap(),
            vec![
                "tar -C /home/user/bin -xzf /tmp/keepup-t/rg rg",
                "chmod +x /home/user/bin/rg",
            ]
        );
    }

    #[tokio::test]
    async fn test_pre_install_failure_stops_install() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/tool")
            .with_status(200)
            .with_body("bin")
            .create_async()
            .await;

        let mut runtime = MockRuntime::new();
        scratch_runtime(&mut runtime);
        runtime.expect_create_dir_all().returning(|_| Ok(()));
        runtime
            .expect_run()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("pkill exited with status 2")));

        let mut s = spec("tool");
        s.pre_install_command = Some("pkill {{ name }}".into());

        let installer = Installer::new(HttpClient::new(Client::new()));
        let err = installer
            .install_from(&runtime, &s, &vars("tool"), &remote(Some(format!("{}/tool", server.url()))))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CheckError>(),
            Some(CheckError::Install { command, .. }) if command == "pkill tool"
        ));
    }

    #[tokio::test]
    async fn test_first_failing_command_aborts_rest() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/tool")
            .with_status(200)
            .with_body("bin")
            .create_async()
            .await;

        let mut runtime = MockRuntime::new();
        scratch_runtime(&mut runtime);
        runtime
            .expect_run()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("first failed")));

        let mut s = spec("tool");
        s.install_commands = vec!["false".into(), "echo never".into()];

        let installer = Installer::new(HttpClient::new(Client::new()));
        let result = installer
            .install_from(&runtime, &s, &vars("tool"), &remote(Some(format!("{}/tool", server.url()))))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_managed_with_bad_signature_never_installs() {
        let mut server = mockito::Server::new_async().await;
        let _deb = server
            .mock("GET", "/pkg.deb")
            .with_status(200)
            .with_body("deb")
            .create_async()
            .await;
        let _asc = server
            .mock("GET", "/pkg.deb.asc")
            .with_status(200)
            .with_body("sig")
            .create_async()
            .await;

        let mut runtime = MockRuntime::new();
        scratch_runtime(&mut runtime);
        runtime.expect_capture().returning(|_, _| {
            Ok(CapturedOutput {
                success: false,
                code: Some(1),
                output: "BAD signature".into(),
            })
        });
        runtime
            .expect_remove_file()
            .with(mockall::predicate::eq(PathBuf::from("/tmp/keepup-t/pkg")))
            .times(1)
            .returning(|_| Ok(()));
        runtime.expect_run().never();

        let mut s = spec("pkg");
        s.install = InstallKind::ManagedPackage;
        let release = RemoteRelease {
            version: "1.0".into(),
            download_url: Some(format!("{}/pkg.deb", server.url())),
            signature_url: Some(format!("{}/pkg.deb.asc", server.url())),
        };

        let installer = Installer::new(HttpClient::new(Client::new()));
        let err = installer
            .install_from(&runtime, &s, &vars("pkg"), &release)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CheckError>(),
            Some(CheckError::Verification { .. })
        ));
    }
}
