// tapline-common/src/capability.rs
//! Collaborators the core calls into but does not implement.
//!
//! Default implementations live in `tapline-aio` (git, bottles) and
//! `tapline-net` (HTTP, GitHub); tests substitute in-memory fakes.
use std::path::Path;

use super::error::Result;

/// Source-control client used to materialize and inspect tap checkouts.
pub trait SourceControl: Send + Sync {
    /// Clones `url` into `dest`; `shallow` requests a depth-1 clone.
    fn clone_repo(&self, url: &str, dest: &Path, shallow: bool) -> Result<()>;

    /// URL of the `origin` remote of the checkout at `repo_path`, if any.
    fn remote_url(&self, repo_path: &Path) -> Result<Option<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
    NotFound,
}

/// Remote repository visibility lookup (feeds `Tap::private`).
pub trait RepoVisibility: Send + Sync {
    fn visibility(&self, owner: &str, repo: &str) -> Result<Visibility>;
}

/// Downloads a definition file referenced by URL.
pub trait FormulaFetcher: Send + Sync {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Names recovered from a bottle's embedded install receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BottleNames {
    pub name: String,
    /// `user/repo/name` for tapped formulae, otherwise equal to `name`.
    pub full_name: String,
}

/// Reads formula identity out of a local bottle archive.
pub trait BottleInspector: Send + Sync {
    fn formula_names(&self, bottle: &Path) -> Result<BottleNames>;
}
