// tapline-core/src/formulary/mod.rs
//! Turns formula references into cached definitions.

mod cache;
mod loader;
pub mod priority;
pub mod probe;

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

pub use cache::DefinitionCache;
pub use loader::{FormulaLoader, LoaderSource};
use tapline_aio::fs;
use tapline_aio::TarBottleInspector;
use tapline_common::capability::{BottleInspector, FormulaFetcher};
use tapline_common::config::{definition_file_name, Config};
use tapline_common::dependency::Dependency;
use tapline_common::diagnostics::{Diagnostics, Warning};
use tapline_common::error::{Result, TaplineError};
use tapline_common::model::FormulaDefinition;
use tapline_net::HttpFetcher;
use tracing::debug;

use self::probe::ReferenceProbe;
use crate::tap::TapRegistry;

pub struct Formulary {
    registry: Arc<TapRegistry>,
    cache: DefinitionCache,
    fetcher: Arc<dyn FormulaFetcher>,
    bottle_inspector: Arc<dyn BottleInspector>,
    probes: Vec<Box<dyn ReferenceProbe>>,
    warned_cross_tap: Mutex<HashSet<String>>,
}

impl Formulary {
    pub fn new(registry: Arc<TapRegistry>) -> Result<Self> {
        let cache_dir = registry.config().formula_cache_dir();
        fs::create_dir_all(&cache_dir).map_err(|e| {
            TaplineError::Cache(format!(
                "Failed to create formula cache {}: {e}",
                cache_dir.display()
            ))
        })?;

        Ok(Self {
            registry,
            cache: DefinitionCache::new(),
            fetcher: Arc::new(HttpFetcher::new()?),
            bottle_inspector: Arc::new(TarBottleInspector::new()),
            probes: probe::default_probes(),
            warned_cross_tap: Mutex::new(HashSet::new()),
        })
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn FormulaFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_bottle_inspector(mut self, inspector: Arc<dyn BottleInspector>) -> Self {
        self.bottle_inspector = inspector;
        self
    }

    pub fn config(&self) -> &Config {
        self.registry.config()
    }

    pub fn registry(&self) -> &TapRegistry {
        &self.registry
    }

    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        self.registry.diagnostics()
    }

    pub fn definition_cache(&self) -> &DefinitionCache {
        &self.cache
    }

    pub(crate) fn fetcher(&self) -> &dyn FormulaFetcher {
        self.fetcher.as_ref()
    }

    pub(crate) fn bottle_inspector(&self) -> &dyn BottleInspector {
        self.bottle_inspector.as_ref()
    }

    /// Runs the probe chain; the first probe that recognizes `reference` wins.
    pub fn loader_for(&self, reference: &str) -> Result<FormulaLoader> {
        for probe in &self.probes {
            if let Some(loader) = probe.probe(reference, self)? {
                debug!("'{}' matched {} probe: {}", reference, probe.kind(), loader);
                return Ok(loader);
            }
        }
        debug!("No probe matched '{}'", reference);
        Ok(probe::null_loader(reference, self))
    }

    /// Definition for any reference: name, `user/repo/name`, path, URL or bottle.
    pub fn factory(&self, reference: &str) -> Result<Arc<FormulaDefinition>> {
        self.loader_for(reference)?.get_formula(self)
    }

    pub fn path(&self, reference: &str) -> Result<PathBuf> {
        Ok(self.loader_for(reference)?.path().to_path_buf())
    }

    pub fn canonical_name(&self, reference: &str) -> Result<String> {
        match self.loader_for(reference) {
            Ok(loader) => Ok(loader.name().to_string()),
            // Several taps define it, so the reference itself is the name.
            Err(TaplineError::TapFormulaAmbiguity { .. }) => Ok(reference.to_lowercase()),
            Err(e) => Err(e),
        }
    }

    pub fn core_path(&self, name: &str) -> PathBuf {
        self.config().core_formula_path(name)
    }

    /// Every tap (installed or not) with a definition named `name`.
    pub fn tap_paths(&self, name: &str) -> Result<Vec<PathBuf>> {
        let file_name = definition_file_name(name);
        let mut paths = Vec::new();
        for user_dir in fs::list_subdirectories(&self.config().taps_dir())? {
            for tap_dir in fs::list_subdirectories(&user_dir)? {
                let found = [
                    tap_dir.join("Formula").join(&file_name),
                    tap_dir.join("HomebrewFormula").join(&file_name),
                    tap_dir.join(&file_name),
                ]
                .into_iter()
                .find(|p| p.is_file());
                paths.extend(found);
            }
        }
        Ok(paths)
    }

    /// The single tap definition named `name`, or `TapFormulaAmbiguity` when
    /// more than one tap provides it.
    pub fn tap_path(&self, name: &str) -> Result<Option<PathBuf>> {
        let mut paths = self.tap_paths(name)?;
        match paths.len() {
            0 => Ok(None),
            1 => Ok(paths.pop()),
            _ => Err(TaplineError::TapFormulaAmbiguity {
                name: name.to_string(),
                paths,
            }),
        }
    }

    /// Resolves the formula a dependency edge points at. An edge owned by a
    /// tap is looked up in that tap first; when it is not there, the bare
    /// name is used and a one-time warning names the tap that supplied it.
    pub fn resolve_dependency(&self, dep: &Dependency) -> Result<Arc<FormulaDefinition>> {
        let owner = match dep.owner_tap() {
            Some(owner) if !dep.is_tap_qualified() => owner,
            _ => return self.factory(dep.name()),
        };

        match self.factory(&format!("{owner}/{}", dep.name())) {
            Ok(formula) => Ok(formula),
            Err(e) if e.is_formula_unavailable() => {
                debug!("{} not found in {}, falling back: {}", dep.name(), owner, e);
                let formula = self.factory(dep.name())?;
                if let Some(provider) = formula.tap() {
                    if self.first_cross_tap_warning(dep.name()) {
                        self.diagnostics().emit(Warning::CrossTapFallback {
                            name: dep.name().to_string(),
                            owner: owner.to_string(),
                            provider: provider.to_string(),
                        });
                    }
                }
                Ok(formula)
            }
            Err(e) => Err(e),
        }
    }

    /// `user/repo` of the tap whose checkout contains `path`.
    pub(crate) fn tap_for_path(&self, path: &Path) -> Option<String> {
        let taps_dir = self.config().taps_dir();
        let resolved_taps_dir = fs::resolved_location(&taps_dir);
        let relative = path
            .strip_prefix(&resolved_taps_dir)
            .or_else(|_| path.strip_prefix(&taps_dir))
            .ok()?;

        let mut components = relative.components().filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        });
        let user = components.next()?;
        let repo = components.next()?;
        components.next()?;
        let repo = repo.strip_prefix("homebrew-").unwrap_or(repo);
        Some(format!("{user}/{repo}"))
    }

    fn first_cross_tap_warning(&self, name: &str) -> bool {
        self.warned_cross_tap
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string())
    }
}
