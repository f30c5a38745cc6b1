// tapline-core/src/formulary/priority.rs
//! Bare-name lookup across taps and core, lowest priority first.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use tapline_common::config::definition_file_name;
use tapline_common::diagnostics::Warning;
use tapline_common::error::Result;
use tracing::debug;

use crate::tap::TapRegistry;

/// Definition files named `name`, bucketed by the priority of the source that
/// provides them. Within a bucket, taps come in name order and core last.
pub fn candidates(registry: &TapRegistry, name: &str) -> Result<BTreeMap<u32, Vec<PathBuf>>> {
    let mut buckets: BTreeMap<u32, Vec<PathBuf>> = BTreeMap::new();
    if !is_bare_name(name) {
        return Ok(buckets);
    }
    let file_name = definition_file_name(name);

    for tap in registry.list()? {
        let Some(dir) = tap.formula_dir() else {
            continue;
        };
        let candidate = dir.join(&file_name);
        if candidate.is_file() {
            debug!("{} provides {} at priority {}", tap, name, tap.priority);
            buckets.entry(tap.priority).or_default().push(candidate);
        }
    }

    let config = registry.config();
    let core = config.core_formula_dir().join(&file_name);
    if core.is_file() {
        buckets
            .entry(config.core_priority())
            .or_default()
            .push(core);
    }
    Ok(buckets)
}

/// A single plain path component: no separators, no `.`/`..`, not absolute.
pub fn is_bare_name(reference: &str) -> bool {
    let mut components = Path::new(reference).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !reference.contains('/')
}

/// Picks the provider of `name` with the lowest priority. Ties go to the first
/// candidate in discovery order and are reported as [`Warning::AmbiguousFormula`].
pub fn find_with_priority(registry: &TapRegistry, name: &str) -> Result<Option<PathBuf>> {
    let buckets = candidates(registry, name)?;
    let Some((priority, mut paths)) = buckets.into_iter().next() else {
        return Ok(None);
    };
    if paths.len() > 1 {
        registry.diagnostics().emit(Warning::AmbiguousFormula {
            name: name.to_string(),
            priority,
            candidates: paths.clone(),
            chosen: paths[0].clone(),
        });
    }
    Ok(Some(paths.swap_remove(0)))
}
