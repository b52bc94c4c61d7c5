//! GitHub provider implementation.

use anyhow::Result;
use async_trait::async_trait;
use log::debug;

use crate::http::HttpClient;

use super::{Provider, Release, ReleaseAsset, RepoId};

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Only the newest page of releases is requested; resolution never looks
/// past the first stable release.
const PAGE_SIZE: usize = 100;

/// GitHub API response types (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Release {
        pub tag_name: String,
        #[serde(default)]
        pub prerelease: bool,
        #[serde(default)]
        pub assets: Vec<Asset>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Asset {
        pub name: String,
        pub browser_download_url: String,
    }
}

pub struct GitHubProvider {
    http_client: HttpClient,
    api_url: String,
}

impl GitHubProvider {
    pub fn new(http_client: HttpClient, api_url: &str) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

}

#[async_trait]
impl Provider for GitHubProvider {
    #[tracing::instrument(skip(self))]
    async fn list_releases(&self, repo: &RepoId) -> Result<Vec<Release>> {
        let url = format!("{}/repos/{}/{}/releases", self.api_url, repo.owner, repo.repo);
        debug!("Fetching releases from {}...", url);

        let per_page = PAGE_SIZE.to_string();
        let parsed: Vec<api::Release> = self
            .http_client
            .get_json_with_query(&url, &[("per_page", per_page.as_str()), ("page", "1")])
            .await?;

        Ok(parsed.into_iter().map(Release::from).collect())
    }
}

impl From<api::Release> for Release {
    fn from(r: api::Release) -> Self {
        Release {
            tag: r.tag_name,
            prerelease: r.prerelease,
            assets: r.assets.into_iter().map(ReleaseAsset::from).collect(),
        }
    }
}

impl From<api::Asset> for ReleaseAsset {
    fn from(a: api::Asset) -> Self {
        ReleaseAsset {
            name: a.name,
            download_url: a.browser_download_url,
        }
    }
}
