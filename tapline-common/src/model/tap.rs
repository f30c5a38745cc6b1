// tapline-common/src/model/tap.rs
use std::fmt;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{Config, DEFINITION_EXTENSION};
use crate::error::Result;

/// A registered source of formula definitions, identified by `user/repo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tap {
    /// Display form of the user; `homebrew` is shown as `Homebrew`.
    pub user: String,
    pub repo: String,
    /// Lower-cased `user/repo`, the tap's identity.
    pub name: String,
    pub path: PathBuf,
    pub remote: String,
    pub priority: u32,
    pub pinned: bool,
    pub installed: bool,
}

/// Persisted per-tap state: priority binding and pin flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(default)]
    pub pinned: bool,
}

/// Serializable summary of a tap, used by `tap-info --json`.
#[derive(Debug, Clone, Serialize)]
pub struct TapInfo {
    pub name: String,
    pub user: String,
    pub repo: String,
    pub path: PathBuf,
    pub remote: String,
    pub priority: u32,
    pub pinned: bool,
    pub installed: bool,
    pub official: bool,
    pub custom_remote: bool,
    pub formula_names: Vec<String>,
    pub formula_files: Vec<PathBuf>,
    pub command_files: Vec<PathBuf>,
}

impl Tap {
    /// Builds a tap value for `user/repo`. Priority and pin state start at their
    /// defaults; the registry fills them in from persisted settings.
    pub fn new(config: &Config, user: &str, repo: &str, remote: Option<&str>) -> Self {
        let user = if user == "homebrew" {
            "Homebrew".to_string()
        } else {
            user.to_string()
        };
        let repo = repo.strip_prefix("homebrew-").unwrap_or(repo).to_string();
        let name = format!("{user}/{repo}").to_lowercase();
        let path = config.tap_path(&user, &repo);
        let installed = path.is_dir();
        let remote = remote
            .map(str::to_string)
            .unwrap_or_else(|| default_remote(&user, &repo));

        Self {
            user,
            repo,
            name,
            path,
            remote,
            priority: config.default_tap_priority(),
            pinned: false,
            installed,
        }
    }

    pub fn official(&self) -> bool {
        self.user == "Homebrew"
    }

    pub fn default_remote(&self) -> String {
        default_remote(&self.user, &self.repo)
    }

    pub fn custom_remote(&self) -> bool {
        !self.remote.eq_ignore_ascii_case(&self.default_remote())
    }

    /// Directory holding the tap's formula files: `Formula/`, `HomebrewFormula/` or the root.
    pub fn formula_dir(&self) -> Option<PathBuf> {
        [
            self.path.join("Formula"),
            self.path.join("HomebrewFormula"),
            self.path.clone(),
        ]
        .into_iter()
        .find(|dir| dir.is_dir())
    }

    pub fn formula_files(&self) -> Result<Vec<PathBuf>> {
        let Some(dir) = self.formula_dir() else {
            return Ok(Vec::new());
        };
        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() && has_definition_extension(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Fully-qualified names (`user/repo/formula`) of every formula in the tap.
    pub fn formula_names(&self) -> Result<Vec<String>> {
        Ok(self
            .formula_files()?
            .iter()
            .filter_map(|f| f.file_stem().and_then(|s| s.to_str()))
            .map(|stem| format!("{}/{stem}", self.name))
            .collect())
    }

    /// Executable `cmd/brew-*` files shipped by the tap.
    pub fn command_files(&self) -> Result<Vec<PathBuf>> {
        let cmd_dir = self.path.join("cmd");
        if !cmd_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(&cmd_dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_command = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("brew-"));
            let executable = entry
                .metadata()
                .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
                .unwrap_or(false);
            if is_command && executable {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn info(&self) -> Result<TapInfo> {
        Ok(TapInfo {
            name: self.name.clone(),
            user: self.user.clone(),
            repo: self.repo.clone(),
            path: self.path.clone(),
            remote: self.remote.clone(),
            priority: self.priority,
            pinned: self.pinned,
            installed: self.installed,
            official: self.official(),
            custom_remote: self.custom_remote(),
            formula_names: self.formula_names()?,
            formula_files: self.formula_files()?,
            command_files: self.command_files()?,
        })
    }
}

impl fmt::Display for Tap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn default_remote(user: &str, repo: &str) -> String {
    format!("https://github.com/{user}/homebrew-{repo}")
}

fn has_definition_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == DEFINITION_EXTENSION)
}
