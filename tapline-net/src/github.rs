// tapline-net/src/github.rs
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;
use tapline_common::capability::{RepoVisibility, Visibility};
use tapline_common::config::Config;
use tapline_common::error::{Result, TaplineError};
use tracing::debug;

use crate::fetch::build_http_client;

const GITHUB_API_BASE: &str = "https://api.github.com";

#[derive(Deserialize)]
struct RepoResponse {
    #[serde(default)]
    private: bool,
}

/// [`RepoVisibility`] backed by the GitHub REST API.
///
/// Tap repositories are looked up under their `homebrew-` prefixed name.
#[derive(Debug, Clone)]
pub struct GithubVisibility {
    client: Client,
    api_base: String,
    token: Option<String>,
}

impl GithubVisibility {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            api_base: GITHUB_API_BASE.to_string(),
            token: config.github_api_token.clone(),
        })
    }

    /// Points the lookup at another API root (GitHub Enterprise).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn repo_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/repos/{owner}/homebrew-{repo}", self.api_base)
    }
}

impl RepoVisibility for GithubVisibility {
    fn visibility(&self, owner: &str, repo: &str) -> Result<Visibility> {
        let url = self.repo_url(owner, repo);
        debug!("Querying repository visibility at {}", url);

        let mut request = self
            .client
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = request.send()?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!("{} not found (or not visible without credentials)", url);
                Ok(Visibility::NotFound)
            }
            status if status.is_success() => {
                let body: RepoResponse = response.json()?;
                Ok(if body.private {
                    Visibility::Private
                } else {
                    Visibility::Public
                })
            }
            status => Err(TaplineError::Fetch(url, format!("HTTP error {status}"))),
        }
    }
}
