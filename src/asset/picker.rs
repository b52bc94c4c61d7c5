use crate::provider::ReleaseAsset;

/// Trait for selecting an asset from a list of available assets
pub trait AssetPicker: Send + Sync {
    /// Pick the first suitable asset from the given list
    ///
    /// Returns `None` if no suitable asset is found
    fn pick<'a>(&self, assets: &'a [ReleaseAsset]) -> Option<&'a ReleaseAsset>;
}

/// Picks a Linux x86-64 build, or a Debian package for managed installs.
///
/// Asset names are compared after lower-casing and turning spaces and hyphens
/// into underscores. Checksums and signatures never qualify.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxAmd64Picker {
    managed: bool,
}

impl LinuxAmd64Picker {
    pub fn new(managed: bool) -> Self {
        Self { managed }
    }

    /// Check if an asset name is a usable build for this host
    fn matches(&self, name: &str) -> bool {
        let name = normalize(name);

        let extension = name.rsplit('.').next().unwrap_or_default();
        if extension.starts_with("sha") || extension.starts_with("md5") || extension == "asc" {
            return false;
        }

        let os_match = name.contains("linux") || (self.managed && name.ends_with(".deb"));
        let arch_match = name.contains("amd64") || name.contains("x86_64");

        os_match && arch_match
    }
}

impl AssetPicker for LinuxAmd64Picker {
    fn pick<'a>(&self, assets: &'a [ReleaseAsset]) -> Option<&'a ReleaseAsset> {
        assets.iter().find(|a| self.matches(&a.name))
    }
}

fn normalize(name: &str) -> String {
    name.to_lowercase().replace(['-', ' '], "_")
}

/// Detached signature published next to the Debian package `deb`.
pub fn find_deb_signature<'a>(
    assets: &'a [ReleaseAsset],
    deb: &ReleaseAsset,
) -> Option<&'a ReleaseAsset> {
    if !deb.name.to_lowercase().ends_with(".deb") {
        return None;
    }
    let wanted = format!("{}.asc", deb.name);
    assets.iter().find(|a| a.name.eq_ignore_ascii_case(&wanted))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> ReleaseAsset {
        ReleaseAsset {
            name: name.to_string(),
            download_url: format!("https://dl.example.com/{}", name),
        }
    }

    #[test]
    fn test_pick_linux_amd64() {
        let assets = vec![
            asset("tool-darwin-amd64.tar.gz"),
            asset("tool-linux-arm64.tar.gz"),
            asset("tool-Linux-x86_64.tar.gz"),
            asset("tool-linux-amd64.tar.gz"),
        ];
        let picked = LinuxAmd64Picker::new(false).pick(&assets).unwrap();
        assert_eq!(picked.name, "tool-Linux-x86_64.tar.gz");
    }

    #[test]
    fn test_pick_normalizes_spaces_and_hyphens() {
        let assets = vec![asset("Tool Linux X86-64.zip"), asset("tool linux x86 64")];
        // "x86-64" normalizes to "x86_64"
        let picked = LinuxAmd64Picker::new(false).pick(&assets).unwrap();
        assert_eq!(picked.name, "Tool Linux X86-64.zip");
    }

    #[test]
    fn test_pick_skips_checksums_and_signatures() {
        let assets = vec![
            asset("tool_linux_amd64.tar.gz.sha256"),
            asset("tool_linux_amd64.tar.gz.sha512sum"),
            asset("tool_linux_amd64.tar.gz.md5"),
            asset("tool_linux_amd64.tar.gz.asc"),
            asset("tool_linux_amd64.tar.gz"),
        ];
        let picked = LinuxAmd64Picker::new(false).pick(&assets).unwrap();
        assert_eq!(picked.name, "tool_linux_amd64.tar.gz");
    }

    #[test]
    fn test_only_checksums_yields_none() {
        let assets = vec![
            asset("tool_linux_amd64.sha256"),
            asset("tool_linux_amd64.deb.asc"),
        ];
        assert!(LinuxAmd64Picker::new(true).pick(&assets).is_none());
    }

    #[test]
    fn test_deb_requires_managed() {
        let assets = vec![asset("code_1.88.0_amd64.deb")];
        assert!(LinuxAmd64Picker::new(false).pick(&assets).is_none());

        let picked = LinuxAmd64Picker::new(true).pick(&assets).unwrap();
        assert_eq!(picked.name, "code_1.88.0_amd64.deb");
    }

    #[test]
    fn test_find_deb_signature() {
        let assets = vec![
            asset("pkg_1.0_amd64.deb"),
            asset("pkg_1.0_amd64.deb.asc"),
        ];
        assert_eq!(
            find_deb_signature(&assets, &assets[0]).unwrap().name,
            "pkg_1.0_amd64.deb.asc"
        );
        assert!(find_deb_signature(&assets[..1], &assets[0]).is_none());
    }

    #[test]
    fn test_find_deb_signature_matches_picked_package() {
        let assets = vec![
            asset("pkg_1.0_arm64.deb.asc"),
            asset("pkg_1.0_arm64.deb"),
            asset("pkg_1.0_amd64.deb"),
            asset("pkg_1.0_amd64.deb.asc"),
        ];
        let picked = LinuxAmd64Picker::new(true).pick(&assets).unwrap();
        assert_eq!(picked.name, "pkg_1.0_amd64.deb");
        assert_eq!(
            find_deb_signature(&assets, picked).unwrap().name,
            "pkg_1.0_amd64.deb.asc"
        );
    }

    #[test]
    fn test_find_deb_signature_ignores_non_deb() {
        let assets = vec![
            asset("tool_linux_amd64.tar.gz"),
            asset("pkg_1.0_amd64.deb.asc"),
        ];
        assert!(find_deb_signature(&assets, &assets[0]).is_none());
    }
}
