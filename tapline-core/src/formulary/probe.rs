// tapline-core/src/formulary/probe.rs
//! Reference-shape probes, tried in order by [`Formulary::loader_for`].

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tapline_aio::fs;
use tapline_common::config::{definition_file_name, DEFINITION_EXTENSION};
use tapline_common::error::{Result, TaplineError};
use tapline_common::model::Tap;
use tapline_net::validation::file_name_from_url;
use tracing::debug;

use super::loader::{FormulaLoader, LoaderSource};
use super::{priority, Formulary};

static URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(https?|ftp)://").expect("url regex is valid"));
static BOTTLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.[a-z0-9_]+\.bottle\.(\d+\.)?tar\.gz$").expect("bottle regex is valid")
});
static TAP_FORMULA_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([\w-]+)/([\w-]+)/([\w+\-.@]+)$").expect("tap formula regex is valid")
});

/// One step of the resolution chain. `Ok(None)` hands the reference on to the
/// next probe; an error stops the chain.
pub trait ReferenceProbe: Send + Sync {
    fn kind(&self) -> &'static str;

    fn probe(&self, reference: &str, formulary: &Formulary) -> Result<Option<FormulaLoader>>;
}

/// The standard chain: URL, bottle, tap-qualified name, definition path,
/// priority search, alias, cached copy.
pub fn default_probes() -> Vec<Box<dyn ReferenceProbe>> {
    vec![
        Box::new(UrlProbe),
        Box::new(BottleProbe),
        Box::new(TapQualifiedProbe),
        Box::new(PathProbe),
        Box::new(PriorityProbe),
        Box::new(AliasProbe),
        Box::new(CachedProbe),
    ]
}

/// Loader used when no probe matched.
pub fn null_loader(reference: &str, formulary: &Formulary) -> FormulaLoader {
    FormulaLoader::new(
        reference,
        formulary.config().core_formula_path(reference),
        LoaderSource::Null,
    )
}

pub fn is_tap_formula_reference(reference: &str) -> bool {
    TAP_FORMULA_REGEX.is_match(reference)
}

pub struct UrlProbe;

impl ReferenceProbe for UrlProbe {
    fn kind(&self) -> &'static str {
        "url"
    }

    fn probe(&self, reference: &str, formulary: &Formulary) -> Result<Option<FormulaLoader>> {
        if !URL_REGEX.is_match(reference) {
            return Ok(None);
        }
        let file_name = file_name_from_url(reference)
            .ok_or_else(|| TaplineError::InvalidReference(reference.to_string()))?;
        let name = strip_definition_extension(&file_name).to_string();
        let path = formulary.config().formula_cache_dir().join(&file_name);
        Ok(Some(FormulaLoader::new(
            name,
            path,
            LoaderSource::Url {
                url: reference.to_string(),
            },
        )))
    }
}

pub struct BottleProbe;

impl ReferenceProbe for BottleProbe {
    fn kind(&self) -> &'static str {
        "bottle"
    }

    fn probe(&self, reference: &str, formulary: &Formulary) -> Result<Option<FormulaLoader>> {
        if !BOTTLE_REGEX.is_match(reference) {
            return Ok(None);
        }
        let bottle_path = std::fs::canonicalize(reference)?;
        let names = formulary.bottle_inspector().formula_names(&bottle_path)?;
        debug!(
            "Bottle {} resolves to {}",
            bottle_path.display(),
            names.full_name
        );
        let target = formulary.loader_for(&names.full_name)?;
        Ok(Some(FormulaLoader::new(
            names.name,
            target.path().to_path_buf(),
            LoaderSource::Bottle { bottle_path },
        )))
    }
}

pub struct TapQualifiedProbe;

impl ReferenceProbe for TapQualifiedProbe {
    fn kind(&self) -> &'static str {
        "tap"
    }

    fn probe(&self, reference: &str, formulary: &Formulary) -> Result<Option<FormulaLoader>> {
        let Some(caps) = TAP_FORMULA_REGEX.captures(reference) else {
            return Ok(None);
        };
        let user = caps[1].to_lowercase();
        let repo = caps[2].to_lowercase();
        let name = caps[3].to_lowercase();

        let tap = Tap::new(formulary.config(), &user, &repo, None);
        let file_name = definition_file_name(&name);
        let mut paths: Vec<PathBuf> = ["Formula", "HomebrewFormula", ""]
            .iter()
            .map(|dir| tap.path.join(dir).join(&file_name))
            .filter(|p| p.is_file())
            .collect();
        if paths.len() > 1 {
            return Err(TaplineError::TapFormulaAmbiguity {
                name: format!("{}/{name}", tap.name),
                paths,
            });
        }
        let path = paths.pop().unwrap_or_else(|| tap.path.join(&file_name));

        let qualified = format!("{}/{name}", tap.name);
        Ok(Some(FormulaLoader::new(
            name,
            path,
            LoaderSource::Tap { qualified },
        )))
    }
}

pub struct PathProbe;

impl ReferenceProbe for PathProbe {
    fn kind(&self) -> &'static str {
        "path"
    }

    fn probe(&self, reference: &str, _formulary: &Formulary) -> Result<Option<FormulaLoader>> {
        let path = Path::new(reference);
        if path.extension().and_then(|e| e.to_str()) != Some(DEFINITION_EXTENSION) {
            return Ok(None);
        }
        let path = std::path::absolute(path)?;
        let name = stem(&path).unwrap_or(reference).to_string();
        Ok(Some(FormulaLoader::new(name, path, LoaderSource::Path)))
    }
}

pub struct PriorityProbe;

impl ReferenceProbe for PriorityProbe {
    fn kind(&self) -> &'static str {
        "priority"
    }

    fn probe(&self, reference: &str, formulary: &Formulary) -> Result<Option<FormulaLoader>> {
        Ok(priority::find_with_priority(formulary.registry(), reference)?
            .map(|path| FormulaLoader::new(reference, path, LoaderSource::Standard)))
    }
}

pub struct AliasProbe;

impl ReferenceProbe for AliasProbe {
    fn kind(&self) -> &'static str {
        "alias"
    }

    fn probe(&self, reference: &str, formulary: &Formulary) -> Result<Option<FormulaLoader>> {
        if !priority::is_bare_name(reference) {
            return Ok(None);
        }
        let alias = formulary.config().aliases_dir().join(reference);
        if !alias.is_file() {
            return Ok(None);
        }
        let target = fs::resolved_location(&alias);
        let name = stem(&target).unwrap_or(reference).to_string();
        Ok(Some(FormulaLoader::new(name, target, LoaderSource::Alias)))
    }
}

pub struct CachedProbe;

impl ReferenceProbe for CachedProbe {
    fn kind(&self) -> &'static str {
        "cache"
    }

    fn probe(&self, reference: &str, formulary: &Formulary) -> Result<Option<FormulaLoader>> {
        if !priority::is_bare_name(reference) {
            return Ok(None);
        }
        let cached = formulary
            .config()
            .formula_cache_dir()
            .join(format!("{reference}.{DEFINITION_EXTENSION}"));
        if !cached.is_file() {
            return Ok(None);
        }
        Ok(Some(FormulaLoader::new(
            reference,
            cached,
            LoaderSource::Standard,
        )))
    }
}

fn stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

fn strip_definition_extension(file_name: &str) -> &str {
    file_name
        .strip_suffix(DEFINITION_EXTENSION)
        .and_then(|s| s.strip_suffix('.'))
        .unwrap_or(file_name)
}
