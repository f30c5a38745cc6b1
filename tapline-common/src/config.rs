// tapline-common/src/config.rs
use std::env;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use tracing::debug;

use super::error::{Result, TaplineError};

// Used when TAPLINE_ROOT is unset and no platform data directory can be determined.
const DEFAULT_FALLBACK_ROOT: &str = "/opt/tapline";
const CORE_TAP_PRIORITY: u32 = 50;
const DEFAULT_TAP_PRIORITY: u32 = 99;

/// Extension of definition files, without the leading dot.
pub const DEFINITION_EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub cache_override: Option<PathBuf>,
    pub github_api_token: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        debug!("Loading tapline configuration");

        let root = match env::var("TAPLINE_ROOT").ok().filter(|s| !s.is_empty()) {
            Some(root) => PathBuf::from(root),
            None => {
                let fallback = BaseDirs::new()
                    .map(|dirs| dirs.data_local_dir().join("tapline"))
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_FALLBACK_ROOT));
                debug!(
                    "TAPLINE_ROOT not set or empty, falling back to: {}",
                    fallback.display()
                );
                fallback
            }
        };
        if root.as_os_str().is_empty() || root.is_relative() {
            return Err(TaplineError::Config(format!(
                "root must be an absolute path, got '{}'",
                root.display()
            )));
        }
        debug!("Effective root set to: {}", root.display());

        let cache_override = env::var("TAPLINE_CACHE")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        let github_api_token = env::var("HOMEBREW_GITHUB_API_TOKEN").ok();

        debug!("Configuration loaded successfully.");
        Ok(Self {
            root,
            cache_override,
            github_api_token,
        })
    }

    /// Builds a configuration rooted at `root` without consulting the environment.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache_override: None,
            github_api_token: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn library_dir(&self) -> PathBuf {
        self.root.join("Library")
    }

    pub fn taps_dir(&self) -> PathBuf {
        self.library_dir().join("Taps")
    }

    /// Directory holding the built-in ("core") formula definitions.
    pub fn core_formula_dir(&self) -> PathBuf {
        self.library_dir().join("Formula")
    }

    pub fn aliases_dir(&self) -> PathBuf {
        self.library_dir().join("Aliases")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_override
            .clone()
            .unwrap_or_else(|| self.root.join("tapline_cache"))
    }

    /// Where URL-fetched definitions are stored.
    pub fn formula_cache_dir(&self) -> PathBuf {
        self.cache_dir().join("Formula")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("tapline_logs")
    }

    pub fn core_priority(&self) -> u32 {
        CORE_TAP_PRIORITY
    }

    pub fn default_tap_priority(&self) -> u32 {
        DEFAULT_TAP_PRIORITY
    }

    /// Checkout location of a tap: `Taps/<user>/homebrew-<repo>`, lower-cased.
    pub fn tap_path(&self, user: &str, repo: &str) -> PathBuf {
        self.taps_dir()
            .join(user.to_lowercase())
            .join(format!("homebrew-{}", repo.to_lowercase()))
    }

    /// Settings file (priority binding and pin state) of a tap.
    pub fn tap_settings_path(&self, user: &str, repo: &str) -> PathBuf {
        self.taps_dir()
            .join(user.to_lowercase())
            .join(format!("{}.json", repo.to_lowercase()))
    }

    pub fn core_formula_path(&self, name: &str) -> PathBuf {
        self.core_formula_dir().join(definition_file_name(name))
    }
}

/// File name of the definition for `name`: lower-cased name plus extension.
pub fn definition_file_name(name: &str) -> String {
    format!("{}.{DEFINITION_EXTENSION}", name.to_lowercase())
}

pub fn load_config() -> Result<Config> {
    Config::load()
}
