// tapline-net/src/validation.rs
use tapline_common::error::{Result, TaplineError};
use url::Url;

/// Checks that `url` parses and uses a scheme the HTTP client can fetch.
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)
        .map_err(|e| TaplineError::Fetch(url.to_string(), format!("invalid URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(TaplineError::Fetch(
            url.to_string(),
            format!("unsupported URL scheme '{other}'"),
        )),
    }
}

/// Last path segment of `url`, used as the local file name.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .next_back()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
