// tapline-common/src/dependency/options.rs
use std::collections::BTreeSet;

use super::definition::Dependency;

/// Build arguments requested for a formula (`with-foo`, `without-bar`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    args: BTreeSet<String>,
}

impl BuildOptions {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args
                .into_iter()
                .map(|a| a.into().trim_start_matches("--").to_string())
                .collect(),
        }
    }

    /// Options an edge asks of the formula it points to.
    pub fn from_dependency(dep: &Dependency) -> Self {
        Self::new(dep.options().iter().cloned())
    }

    pub fn include(&self, arg: &str) -> bool {
        self.args.contains(arg.trim_start_matches("--"))
    }

    /// Whether the dependent asked for `dep`.
    ///
    /// Optional edges need an explicit `with-<name>`; recommended edges are
    /// wanted unless `without-<name>` was given; everything else always is.
    pub fn with(&self, dep: &Dependency) -> bool {
        let name = dep.option_name();
        if dep.is_optional() {
            self.include(&format!("with-{name}"))
        } else if dep.is_recommended() {
            !self.include(&format!("without-{name}"))
        } else {
            true
        }
    }

    pub fn without(&self, dep: &Dependency) -> bool {
        !self.with(dep)
    }

    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}
