//! Install command lists and their execution.

use anyhow::{Result, anyhow};
use log::{debug, info};
use reqwest::Url;

use crate::error::CheckError;
use crate::package::PackageSpec;
use crate::runtime::Runtime;
use crate::template::TemplateVars;

/// Single package-manager invocation used for every managed package.
pub const MANAGED_INSTALL_COMMAND: &str = "sudo dpkg -i {{ downloaded_file }}";

const EXTRACT_TAR_GZ: &str =
    "tar -C {{ home_bin_path }} -xzf {{ downloaded_file }} {{ display_name }}";
const EXTRACT_ZIP: &str =
    "unzip -o -d {{ home_bin_path }} {{ downloaded_file }} {{ display_name }}";
const MOVE_FILE: &str = "mv {{ downloaded_file }} {{ home_bin_path }}/{{ display_name }}";
const MARK_EXECUTABLE: &str = "chmod +x {{ home_bin_path }}/{{ display_name }}";

/// Whether the command list for `spec` was derived rather than configured.
pub fn uses_default_commands(spec: &PackageSpec) -> bool {
    !spec.is_managed() && spec.install_commands.is_empty()
}

/// The command templates that install `spec` from `download_url`.
///
/// Managed packages always use the package manager. Otherwise configured
/// commands are used as given, or defaults are chosen by the file type of the
/// download URL.
pub fn install_commands(spec: &PackageSpec, download_url: &str) -> Vec<String> {
    if spec.is_managed() {
        return vec![MANAGED_INSTALL_COMMAND.to_string()];
    }
    if !spec.install_commands.is_empty() {
        return spec.install_commands.clone();
    }

    let path = Url::parse(download_url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| download_url.to_string());

    let place = if path.ends_with("tar.gz") {
        EXTRACT_TAR_GZ
    } else if path.ends_with("zip") {
        EXTRACT_ZIP
    } else {
        MOVE_FILE
    };

    vec![place.to_string(), MARK_EXECUTABLE.to_string()]
}

/// Split a rendered command into program and arguments.
///
/// A leading `sudo` is dropped when this process already runs as root.
pub fn split_command(command: &str, privileged: bool) -> Result<Vec<String>> {
    let mut argv =
        shlex::split(command).ok_or_else(|| anyhow!("unbalanced quotes in `{}`", command))?;
    if argv.is_empty() {
        return Err(anyhow!("empty command"));
    }
    if privileged && argv[0] == "sudo" && argv.len() > 1 {
        argv.remove(0);
    }
    Ok(argv)
}

/// Render `template`, then run it with inherited standard streams.
pub async fn run_template<R: Runtime + ?Sized>(
    runtime: &R,
    spec: &PackageSpec,
    vars: &TemplateVars,
    template: &str,
) -> Result<()> {
    let install_error = |command: &str, reason: String| CheckError::Install {
        package: spec.name.clone(),
        command: command.to_string(),
        reason,
    };

    let command = vars
        .render(template)
        .map_err(|e| install_error(template, format!("{:#}", e)))?;
    let argv = split_command(&command, runtime.is_privileged())
        .map_err(|e| install_error(&command, e.to_string()))?;

    info!("{}: running {:?}", spec.name, argv);
    runtime
        .run(&argv[0], &argv[1..])
        .await
        .map_err(|e| install_error(&command, format!("{:#}", e)))?;
    debug!("{}: `{}` succeeded", spec.name, command);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{InstallKind, SourceKind};
    use crate::runtime::MockRuntime;
    use regex::Regex;
    use std::path::Path;

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
        let mut vars = TemplateVars::new(name, name, Path::new("/home/user/bin")).with_version("1.2.3");
        vars.downloaded_file = format!("/tmp/keepup-1/{}", name);
        vars.temp_dir = "/tmp/keepup-1".into();
        vars
    }

    fn render_all(spec: &PackageSpec, url: &str) -> Vec<String> {
        let vars = vars(&spec.name);
        install_commands(spec, url)
            .iter()
            .map(|t| vars.render(t).unwrap())
            .collect()
    }

    #[test]
    fn test_default_tar_gz_extracts_then_marks_executable() {
        let commands = render_all(&spec("rg"), "https://dl.example.com/rg-1.2.3-linux-amd64.tar.gz");
        assert_eq!(
            commands,
            vec![
                "tar -C /home/user/bin -xzf /tmp/keepup-1/rg rg",
                "chmod +x /home/user/bin/rg",
            ]
        );
        assert!(uses_default_commands(&spec("rg")));
    }

    #[test]
    fn test_default_zip_and_plain_file() {
        let commands = render_all(&spec("tf"), "https://dl.example.com/tf_1.2.3_linux_amd64.zip");
        assert_eq!(
            commands,
            vec![
                "unzip -o -d /home/user/bin /tmp/keepup-1/tf tf",
                "chmod +x /home/user/bin/tf",
            ]
        );

        let commands = render_all(&spec("jq"), "https://dl.example.com/jq-linux-amd64?raw=1");
        assert_eq!(
            commands,
            vec![
                "mv /tmp/keepup-1/jq /home/user/bin/jq",
                "chmod +x /home/user/bin/jq",
            ]
        );
    }

    #[test]
    fn test_default_ignores_query_string() {
        let commands = render_all(&spec("k9s"), "https://dl.example.com/k9s_Linux_amd64.tar.gz?sig=abc");
        assert!(commands[0].starts_with("tar -C"));
    }

    #[test]
    fn test_configured_commands_used_verbatim() {
        let mut s = spec("tool");
        s.install_commands = vec!["cp {{ downloaded_file }} /opt/tool".into()];
        assert_eq!(
            install_commands(&s, "https://x/tool.tar.gz"),
            vec!["cp {{ downloaded_file }} /opt/tool"]
        );
        assert!(!uses_default_commands(&s));
    }

    #[test]
    fn test_managed_overrides_configured_commands() {
        let mut s = spec("code");
        s.install = InstallKind::ManagedPackage;
        s.install_commands = vec!["echo ignored".into()];

        assert_eq!(render_all(&s, "https://x/code.deb"), vec!["sudo dpkg -i /tmp/keepup-1/code"]);
    }

    #[test]
    fn test_split_command() {
        assert_eq!(
            split_command("sudo dpkg -i '/tmp/a b.deb'", false).unwrap(),
            vec!["sudo", "dpkg", "-i", "/tmp/a b.deb"]
        );
        assert_eq!(
            split_command("sudo dpkg -i /tmp/a.deb", true).unwrap(),
            vec!["dpkg", "-i", "/tmp/a.deb"]
        );
        assert!(split_command("echo 'open", false).is_err());
        assert!(split_command("   ", false).is_err());
    }

    #[tokio::test]
    async fn test_run_template_failure_is_install_error() {
        let mut runtime = MockRuntime::new();
        runtime.expect_is_privileged().returning(|| false);
        runtime
            .expect_run()
            .withf(|program, args| program == "chmod" && args == ["+x", "/home/user/bin/rg"])
            .returning(|_, _| Err(anyhow!("chmod exited with status 1")));

        let err = run_template(&runtime, &spec("rg"), &vars("rg"), MARK_EXECUTABLE)
            .await
            .unwrap_err();
        match err.downcast_ref::<CheckError>() {
            Some(CheckError::Install { command, .. }) => {
                assert_eq!(command, "chmod +x /home/user/bin/rg")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
