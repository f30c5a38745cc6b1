// tapline-core/src/formulary/cache.rs
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tapline_common::error::Result;
use tapline_common::model::FormulaDefinition;
use tracing::debug;

/// Parsed definitions keyed by resolved source location.
///
/// A location is loaded at most once; every later lookup hands out the same
/// `Arc`.
#[derive(Debug, Default)]
pub struct DefinitionCache {
    entries: Mutex<HashMap<PathBuf, Arc<FormulaDefinition>>>,
}

impl DefinitionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<Arc<FormulaDefinition>> {
        self.lock().get(path).cloned()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    /// Returns the cached definition for `path`, running `load` on a miss.
    /// The lock is held across `load`, so `load` must not call back into
    /// this cache.
    pub fn get_or_load<F>(&self, path: &Path, load: F) -> Result<Arc<FormulaDefinition>>
    where
        F: FnOnce() -> Result<FormulaDefinition>,
    {
        let mut entries = self.lock();
        if let Some(definition) = entries.get(path) {
            debug!("Loaded formula '{}' from parsed cache.", definition.name());
            return Ok(Arc::clone(definition));
        }
        let definition = Arc::new(load()?);
        debug!(
            "Cached formula '{}' from {}",
            definition.name(),
            path.display()
        );
        entries.insert(path.to_path_buf(), Arc::clone(&definition));
        Ok(definition)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Arc<FormulaDefinition>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
