// tapline-net/src/fetch.rs
use std::fs;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use tapline_common::capability::FormulaFetcher;
use tapline_common::error::{Result, TaplineError};
use tracing::{debug, error};

use crate::validation::validate_url;

const DOWNLOAD_TIMEOUT_SECS: u64 = 120;
const CONNECT_TIMEOUT_SECS: u64 = 30;
pub(crate) const USER_AGENT_STRING: &str = "tapline formula resolver (Rust)";

/// [`FormulaFetcher`] that downloads definition files over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
        })
    }
}

impl FormulaFetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        validate_url(url)?;
        debug!("Fetching formula from {} to {}", url, dest.display());

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = dest.with_file_name(format!(
            ".{}.download",
            dest.file_name().unwrap_or_default().to_string_lossy()
        ));

        let response = self.client.get(url).send().map_err(|e| {
            debug!("HTTP request failed for {url}: {e}");
            TaplineError::Fetch(url.to_string(), format!("request failed: {e}"))
        })?;
        let status = response.status();
        debug!("Received HTTP status: {} for {}", status, url);

        if !status.is_success() {
            error!("HTTP error {} for URL {}", status, url);
            let reason = match status {
                StatusCode::NOT_FOUND => "not found (404)".to_string(),
                StatusCode::FORBIDDEN => "access forbidden (403)".to_string(),
                other => format!("HTTP error {other}"),
            };
            return Err(TaplineError::Fetch(url.to_string(), reason));
        }

        let content = response.bytes().map_err(|e| {
            TaplineError::Fetch(url.to_string(), format!("failed to read body: {e}"))
        })?;
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, dest).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            TaplineError::from(e)
        })?;
        debug!("Stored fetched formula at {}", dest.display());
        Ok(())
    }
}

pub(crate) fn build_http_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    Ok(Client::builder()
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?)
}
