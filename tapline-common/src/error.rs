use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum TaplineError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("HTTP Request Error: {0}")]
    Http(#[from] Arc<reqwest::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Git Error: {0}")]
    Git(String),

    #[error("FetchError: Failed to fetch '{0}': {1}")]
    Fetch(String, String),

    #[error("Bottle Error: {0}")]
    Bottle(String),

    #[error("Cache Error: {0}")]
    Cache(String),

    #[error("Parsing Error in {0}: {1}")]
    ParseError(&'static str, String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Invalid tap name: '{0}' (expected user/repo)")]
    InvalidTapReference(String),

    #[error("No such tap: {0}")]
    TapNotInstalled(String),

    #[error("Priority not allowed: {0} (must be between 0 and 99)")]
    InvalidPriority(u32),

    #[error("No available formula with the name \"{0}\"")]
    FormulaUnavailable(String),

    #[error("No available formula \"{name}\" in tap {tap}")]
    TapFormulaUnavailable { tap: String, name: String },

    #[error("Formulae found in multiple taps for \"{name}\": {}", .paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    TapFormulaAmbiguity { name: String, paths: Vec<PathBuf> },

    #[error("Dependency cycle detected involving '{0}'")]
    DependencyCycle(String),

    #[error("Unknown environment hook '{hook}' on dependency '{dependency}'")]
    UnknownEnvHook { dependency: String, hook: String },

    #[error("Generic Error: {0}")]
    Generic(String),
}

impl TaplineError {
    /// True for both plain and tap-scoped "no such formula" errors.
    pub fn is_formula_unavailable(&self) -> bool {
        matches!(
            self,
            TaplineError::FormulaUnavailable(_) | TaplineError::TapFormulaUnavailable { .. }
        )
    }
}

impl From<std::io::Error> for TaplineError {
    fn from(err: std::io::Error) -> Self {
        TaplineError::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for TaplineError {
    fn from(err: reqwest::Error) -> Self {
        TaplineError::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for TaplineError {
    fn from(err: serde_json::Error) -> Self {
        TaplineError::Json(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, TaplineError>;
