// Shared fixture for tapline-core integration tests.
// Lays out an isolated root (core formulae, taps, aliases, cache) in a
// temporary directory and wires fake collaborators into the registry.
#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::os::unix::fs as unix_fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tapline_common::capability::{BottleInspector, BottleNames, FormulaFetcher, SourceControl};
use tapline_common::config::Config;
use tapline_common::diagnostics::Diagnostics;
use tapline_common::error::{Result, TaplineError};
use tapline_common::model::Tap;
use tapline_core::{Formulary, TapInstallOptions, TapRegistry};
use tempfile::TempDir;

/// Pretends to clone by creating an empty checkout with a `.git` directory.
#[derive(Default)]
pub struct FakeSourceControl;

impl SourceControl for FakeSourceControl {
    fn clone_repo(&self, _url: &str, dest: &Path, _shallow: bool) -> Result<()> {
        fs::create_dir_all(dest.join(".git"))?;
        fs::create_dir_all(dest.join("Formula"))?;
        Ok(())
    }

    fn remote_url(&self, _repo_path: &Path) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Serves canned documents by URL and counts downloads.
#[derive(Default)]
pub struct FakeFetcher {
    documents: HashMap<String, String>,
    fetches: Mutex<usize>,
}

impl FakeFetcher {
    pub fn with_document(mut self, url: &str, body: &str) -> Self {
        self.documents.insert(url.to_string(), body.to_string());
        self
    }

    pub fn fetches(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

impl FormulaFetcher for FakeFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        *self.fetches.lock().unwrap() += 1;
        let body = self
            .documents
            .get(url)
            .ok_or_else(|| TaplineError::Fetch(url.to_string(), "not found (404)".into()))?;
        fs::write(dest, body)?;
        Ok(())
    }
}

/// Reports the same names for every bottle.
pub struct FakeBottleInspector {
    pub names: BottleNames,
}

impl BottleInspector for FakeBottleInspector {
    fn formula_names(&self, _bottle: &Path) -> Result<BottleNames> {
        Ok(self.names.clone())
    }
}

pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub config: Config,
    pub diagnostics: Arc<Diagnostics>,
    pub registry: Arc<TapRegistry>,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = Config::with_root(temp_dir.path());
        fs::create_dir_all(config.core_formula_dir()).unwrap();
        fs::create_dir_all(config.taps_dir()).unwrap();
        fs::create_dir_all(config.aliases_dir()).unwrap();

        let diagnostics = Arc::new(Diagnostics::new());
        let registry = Arc::new(TapRegistry::with_source_control(
            config.clone(),
            Arc::new(FakeSourceControl),
            Arc::clone(&diagnostics),
        ));

        Self {
            temp_dir,
            config,
            diagnostics,
            registry,
        }
    }

    pub fn formulary(&self) -> Formulary {
        Formulary::new(Arc::clone(&self.registry))
            .unwrap()
            .with_fetcher(Arc::new(FakeFetcher::default()))
    }

    /// Writes a core definition and returns its path.
    pub fn core_formula(&self, name: &str, json: &str) -> PathBuf {
        let path = self.config.core_formula_path(name);
        fs::write(&path, json).unwrap();
        path
    }

    /// Installs `user/repo` at `priority` (default when `None`).
    pub fn tap(&self, user: &str, repo: &str, priority: Option<u32>) -> Tap {
        let pending = self.registry.register(user, repo, None).unwrap();
        self.registry
            .install(
                &pending,
                TapInstallOptions {
                    full_clone: false,
                    priority,
                },
            )
            .unwrap()
    }

    /// Writes a definition into an installed tap's `Formula/` directory.
    pub fn tap_formula(&self, user: &str, repo: &str, name: &str, json: &str) -> PathBuf {
        let path = self
            .config
            .tap_path(user, repo)
            .join("Formula")
            .join(format!("{}.json", name.to_lowercase()));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, json).unwrap();
        path
    }

    /// Creates `Aliases/<alias>` pointing at the core definition of `target`.
    pub fn alias(&self, alias: &str, target: &str) {
        let link = self.config.aliases_dir().join(alias);
        unix_fs::symlink(self.config.core_formula_path(target), link).unwrap();
    }

    pub fn canonical(&self, path: &Path) -> PathBuf {
        fs::canonicalize(path).unwrap()
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// `{"dependencies": [...]}` for plain runtime edges.
pub fn deps_json(names: &[&str]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("\"{n}\"")).collect();
    format!("{{\"dependencies\": [{}]}}", quoted.join(", "))
}
