// tapline-core/src/formulary/loader.rs
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tapline_aio::fs;
use tapline_common::error::{Result, TaplineError};
use tapline_common::model::FormulaDefinition;
use tracing::debug;

use super::Formulary;

/// Where a loader's reference came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderSource {
    /// Bare name found by priority search, or a cached copy.
    Standard,
    /// Remote definition, downloaded into the formula cache on first load.
    Url { url: String },
    /// Local bottle archive; the definition is the one its receipt names.
    Bottle { bottle_path: PathBuf },
    /// Explicit `user/repo/name` reference.
    Tap { qualified: String },
    Alias,
    Path,
    /// Nothing matched; loading fails.
    Null,
}

/// A resolved reference: canonical name plus the definition file backing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaLoader {
    name: String,
    path: PathBuf,
    source: LoaderSource,
}

impl FormulaLoader {
    pub fn new(name: impl Into<String>, path: PathBuf, source: LoaderSource) -> Self {
        Self {
            name: name.into(),
            path: fs::resolved_location(&path),
            source,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &LoaderSource {
        &self.source
    }

    /// Bottle archive the reference pointed at, for bottle references.
    pub fn bottle_path(&self) -> Option<&Path> {
        match &self.source {
            LoaderSource::Bottle { bottle_path } => Some(bottle_path),
            _ => None,
        }
    }

    /// Materializes the definition, reusing the formulary's cached instance
    /// for this location when there is one.
    pub fn get_formula(&self, formulary: &Formulary) -> Result<Arc<FormulaDefinition>> {
        if self.source == LoaderSource::Null {
            return Err(TaplineError::FormulaUnavailable(self.name.clone()));
        }

        let result = formulary
            .definition_cache()
            .get_or_load(&self.path, || self.load(formulary));

        match (result, &self.source) {
            (Err(e), LoaderSource::Tap { qualified }) if e.is_formula_unavailable() => {
                let (tap, name) = qualified
                    .rsplit_once('/')
                    .unwrap_or((qualified.as_str(), self.name.as_str()));
                Err(TaplineError::TapFormulaUnavailable {
                    tap: tap.to_string(),
                    name: name.to_string(),
                })
            }
            (result, _) => result,
        }
    }

    fn load(&self, formulary: &Formulary) -> Result<FormulaDefinition> {
        if let LoaderSource::Url { url } = &self.source {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::remove_file_if_exists(&self.path)?;
            formulary.fetcher().fetch(url, &self.path)?;
        }

        debug!("{} ({:?}): loading {}", self.name, self.source, self.path.display());
        if !self.path.is_file() {
            return Err(TaplineError::FormulaUnavailable(self.name.clone()));
        }
        let json = std::fs::read_to_string(&self.path)?;
        let tap = formulary.tap_for_path(&self.path);
        FormulaDefinition::from_json(&json, &self.path, tap.as_deref())
    }
}

impl fmt::Display for FormulaLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path.display())
    }
}
