/*
File: tapline-aio/src/git2.rs
Purpose: Synchronous tap checkout operations using git2.
*/
use std::path::Path;

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{ErrorCode, FetchOptions, Repository};
use tapline_common::capability::SourceControl;
use tapline_common::error::{Result, TaplineError};
use tracing::{debug, error, warn};

/// [`SourceControl`] backed by libgit2.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitClient;

impl GitClient {
    pub fn new() -> Self {
        Self
    }
}

impl SourceControl for GitClient {
    fn clone_repo(&self, url: &str, dest: &Path, shallow: bool) -> Result<()> {
        debug!(
            "Cloning {} into {} (shallow: {})",
            url,
            dest.display(),
            shallow
        );
        let mut fetch_options = FetchOptions::new();
        if shallow {
            fetch_options.depth(1);
        }
        RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(url, dest)
            .map_err(|e| {
                error!("Failed clone {} into {}: {}", url, dest.display(), e);
                TaplineError::Git(format!("Failed to clone {url}: {e}"))
            })?;
        Ok(())
    }

    fn remote_url(&self, repo_path: &Path) -> Result<Option<String>> {
        let repo = Repository::open(repo_path).map_err(|e| {
            TaplineError::Git(format!(
                "Failed to open repository {}: {e}",
                repo_path.display()
            ))
        })?;
        let url = match repo.find_remote("origin") {
            Ok(remote) => Ok(remote.url().map(str::to_string)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(TaplineError::Git(format!(
                "Failed to read remote 'origin': {e}"
            ))),
        };
        url
    }
}

/// Fetches `origin` and fast-forwards the checked-out branch.
/// Contains blocking network and filesystem I/O.
pub fn update_repo(repo_path: &Path) -> Result<()> {
    debug!("Updating git repository at: {}", repo_path.display());

    let repo = Repository::open(repo_path).map_err(|e| {
        error!("Failed open repo {}: {}", repo_path.display(), e);
        TaplineError::Git(format!("Failed to open tap repository: {e}"))
    })?;

    let head = repo
        .head()
        .map_err(|e| TaplineError::Git(format!("Failed to read HEAD: {e}")))?;
    let branch = head
        .shorthand()
        .ok_or_else(|| TaplineError::Git("HEAD is not a named branch".to_string()))?
        .to_string();
    let local_ref_name = format!("refs/heads/{branch}");
    let remote_ref_name = format!("refs/remotes/origin/{branch}");

    let mut remote = repo
        .find_remote("origin")
        .map_err(|e| TaplineError::Git(format!("Failed to find remote 'origin': {e}")))?;
    remote
        .fetch(
            &[format!("refs/heads/{branch}:{remote_ref_name}")],
            Some(&mut FetchOptions::new()),
            None,
        )
        .map_err(|e| {
            error!("Failed fetch repo {}: {}", repo_path.display(), e);
            TaplineError::Git(format!("Failed to fetch updates: {e}"))
        })?;

    let remote_ref = repo.find_reference(&remote_ref_name).map_err(|e| {
        TaplineError::Git(format!(
            "Failed to find remote tracking branch '{remote_ref_name}': {e}"
        ))
    })?;
    let fetch_commit = repo
        .reference_to_annotated_commit(&remote_ref)
        .map_err(|e| TaplineError::Git(format!("Failed to resolve '{remote_ref_name}': {e}")))?;

    let (analysis, _) = repo
        .merge_analysis(&[&fetch_commit])
        .map_err(|e| TaplineError::Git(format!("Failed to analyze merge: {e}")))?;

    if analysis.is_up_to_date() {
        debug!("Repository {} already up-to-date.", repo_path.display());
        return Ok(());
    }

    if !analysis.is_fast_forward() {
        warn!(
            "Repository {} cannot be fast-forwarded, leaving it untouched.",
            repo_path.display()
        );
        return Err(TaplineError::Git(format!(
            "{} has diverged from origin/{branch}",
            repo_path.display()
        )));
    }

    let mut local_ref = repo
        .find_reference(&local_ref_name)
        .map_err(|e| TaplineError::Git(format!("Failed to find '{local_ref_name}': {e}")))?;
    local_ref
        .set_target(
            fetch_commit.id(),
            &format!("Fast-forward {branch} to origin/{branch}"),
        )
        .map_err(|e| TaplineError::Git(format!("Failed to fast-forward: {e}")))?;
    repo.set_head(&local_ref_name)
        .map_err(|e| TaplineError::Git(format!("Failed to set HEAD: {e}")))?;
    repo.checkout_head(Some(CheckoutBuilder::default().force()))
        .map_err(|e| TaplineError::Git(format!("Failed to checkout HEAD: {e}")))?;

    debug!(
        "Fast-forwarded '{}' in {}",
        branch,
        repo_path.display()
    );
    Ok(())
}
