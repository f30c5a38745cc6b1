// tapline-core/src/tap.rs
//! Registry of installed taps: discovery, installation, priority and pin state.

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tapline_aio::fs;
use tapline_aio::json_io::{read_json_or_default, write_json_sync};
use tapline_aio::GitClient;
use tapline_common::capability::{RepoVisibility, SourceControl, Visibility};
use tapline_common::config::Config;
use tapline_common::diagnostics::{Diagnostics, Warning};
use tapline_common::error::{Result, TaplineError};
use tapline_common::model::{Tap, TapSettings};
use tracing::{debug, error, warn};

static TAP_ARGS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([\w-]+)/(homebrew-)?([\w-]+)$").expect("tap reference regex is valid")
});

const MAX_PRIORITY: u32 = 99;

#[derive(Debug, Clone, Copy, Default)]
pub struct TapInstallOptions {
    /// Clone the full history instead of a depth-1 checkout.
    pub full_clone: bool,
    pub priority: Option<u32>,
}

pub struct TapRegistry {
    config: Config,
    source_control: Arc<dyn SourceControl>,
    diagnostics: Arc<Diagnostics>,
}

impl TapRegistry {
    pub fn new(config: Config, diagnostics: Arc<Diagnostics>) -> Self {
        Self::with_source_control(config, Arc::new(GitClient::new()), diagnostics)
    }

    pub fn with_source_control(
        config: Config,
        source_control: Arc<dyn SourceControl>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            config,
            source_control,
            diagnostics,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }

    /// Splits `user/repo` (or `user/homebrew-repo`) into its parts.
    pub fn parse(reference: &str) -> Result<(String, String)> {
        let caps = TAP_ARGS_REGEX
            .captures(reference)
            .ok_or_else(|| TaplineError::InvalidTapReference(reference.to_string()))?;
        Ok((caps[1].to_string(), caps[3].to_string()))
    }

    /// Current view of `user/repo`, installed or not.
    pub fn tap(&self, user: &str, repo: &str) -> Result<Tap> {
        self.load_tap(user, repo, None)
    }

    /// Like [`TapRegistry::tap`], starting from a `user/repo` reference.
    pub fn fetch(&self, reference: &str) -> Result<Tap> {
        let (user, repo) = Self::parse(reference)?;
        self.tap(&user, &repo)
    }

    /// Returns the tap for `user/repo`. An installed tap is returned as it is;
    /// otherwise the result is a pending tap carrying `remote` (or the default
    /// GitHub remote), ready for [`TapRegistry::install`].
    pub fn register(&self, user: &str, repo: &str, remote: Option<&str>) -> Result<Tap> {
        let tap = self.load_tap(user, repo, remote)?;
        if tap.installed {
            debug!("Tap {} already registered at {}", tap, tap.path.display());
        }
        Ok(tap)
    }

    /// Clones a pending tap and binds its priority. For an installed tap only
    /// the priority is re-bound, and only when one was requested.
    pub fn install(&self, tap: &Tap, options: TapInstallOptions) -> Result<Tap> {
        if tap.installed {
            match options.priority {
                None => debug!("{} already tapped and no priority given, nothing to do", tap),
                Some(priority) if priority > MAX_PRIORITY => {
                    self.diagnostics.emit(Warning::PriorityOutOfRange {
                        tap: tap.name.clone(),
                        priority,
                        fallback: None,
                    });
                }
                Some(priority) => {
                    self.set_priority(tap, priority)?;
                }
            }
            return self.tap(&tap.user, &tap.repo);
        }

        if let Some(parent) = tap.path.parent() {
            fs::create_dir_all(parent)?;
        }
        self.source_control
            .clone_repo(&tap.remote, &tap.path, !options.full_clone)
            .inspect_err(|_| {
                // A failed clone may leave a partial checkout behind.
                let _ = fs::remove_directory_recursive(&tap.path);
            })?;
        debug!("Cloned {} into {}", tap, tap.path.display());

        let installed = self.load_tap(&tap.user, &tap.repo, Some(&tap.remote))?;
        let default_priority = self.config.default_tap_priority();
        let priority = match options.priority {
            Some(priority) if priority > MAX_PRIORITY => {
                self.diagnostics.emit(Warning::PriorityOutOfRange {
                    tap: installed.name.clone(),
                    priority,
                    fallback: Some(default_priority),
                });
                default_priority
            }
            Some(priority) => priority,
            None => {
                debug!(
                    "No priority given for {}, defaulting to {}",
                    installed, default_priority
                );
                default_priority
            }
        };
        self.set_priority(&installed, priority)?;
        self.tap(&installed.user, &installed.repo)
    }

    /// Every installed tap, sorted by name.
    pub fn list(&self) -> Result<Vec<Tap>> {
        let mut taps = Vec::new();
        for user_dir in fs::list_subdirectories(&self.config.taps_dir())? {
            for repo_dir in fs::list_subdirectories(&user_dir)? {
                if !repo_dir.join(".git").is_dir() {
                    continue;
                }
                let (Some(user), Some(repo)) = (dir_name(&user_dir), dir_name(&repo_dir)) else {
                    continue;
                };
                let repo = repo.strip_prefix("homebrew-").unwrap_or(repo);
                match self.load_tap(user, repo, None) {
                    Ok(tap) => taps.push(tap),
                    Err(TaplineError::InvalidTapReference(name)) => {
                        debug!("Skipping checkout with invalid tap name {}", name);
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        taps.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(taps)
    }

    /// Installed tap `user/repo`, or `TapNotInstalled`.
    pub fn find(&self, user: &str, repo: &str) -> Result<Tap> {
        let tap = self.tap(user, repo)?;
        if !tap.installed {
            return Err(TaplineError::TapNotInstalled(tap.name));
        }
        Ok(tap)
    }

    pub fn priority(&self, tap: &Tap) -> Result<u32> {
        Ok(self
            .settings(tap)?
            .priority
            .unwrap_or_else(|| self.config.default_tap_priority()))
    }

    /// Persists `priority` for `tap`. Sharing a priority with core or with
    /// another tap is allowed; it is reported through the returned warnings,
    /// which are also forwarded to diagnostics.
    pub fn set_priority(&self, tap: &Tap, priority: u32) -> Result<Vec<Warning>> {
        self.ensure_installed(tap)?;
        if priority > MAX_PRIORITY {
            return Err(TaplineError::InvalidPriority(priority));
        }

        let mut settings = self.settings(tap)?;
        settings.priority = Some(priority);
        self.save_settings(tap, &settings)?;
        debug!("Bound {} to priority {}", tap, priority);

        let mut warnings = Vec::new();
        if priority == self.config.core_priority() {
            warnings.push(Warning::ReservedPriority {
                tap: tap.name.clone(),
                priority,
            });
        }
        for other in self.list()? {
            if other.name != tap.name && other.priority == priority {
                warnings.push(Warning::SamePriority {
                    tap: tap.name.clone(),
                    other: other.name,
                    priority,
                });
            }
        }
        for warning in &warnings {
            self.diagnostics.emit(warning.clone());
        }
        Ok(warnings)
    }

    /// Marks `tap` as pinned. Returns false if it already was.
    pub fn pin(&self, tap: &Tap) -> Result<bool> {
        self.set_pinned(tap, true)
    }

    /// Clears the pin on `tap`. Returns false if it was not pinned.
    pub fn unpin(&self, tap: &Tap) -> Result<bool> {
        self.set_pinned(tap, false)
    }

    /// Deletes the tap checkout and its settings, pruning the user directory
    /// when it is left empty. Returns how many formula files the tap held.
    pub fn remove(&self, tap: &Tap) -> Result<usize> {
        self.ensure_installed(tap)?;
        let formula_count = tap.formula_files()?.len();

        fs::remove_directory_recursive(&tap.path)?;
        fs::remove_file_if_exists(&self.config.tap_settings_path(&tap.user, &tap.repo))?;
        if let Some(parent) = tap.path.parent() {
            if let Err(e) = fs::remove_dir_if_empty(parent) {
                warn!("Could not prune {}: {}", parent.display(), e);
            }
        }
        debug!("Removed {} ({} formulae)", tap, formula_count);
        Ok(formula_count)
    }

    /// Installed taps that update flows may touch: everything not pinned.
    pub fn updatable(&self) -> Result<Vec<Tap>> {
        Ok(self.list()?.into_iter().filter(|t| !t.pinned).collect())
    }

    /// Whether `tap` looks private. A custom remote is assumed private; a
    /// repository the lookup cannot see is private; lookup failures are not.
    pub fn is_private(&self, tap: &Tap, visibility: &dyn RepoVisibility) -> bool {
        if tap.custom_remote() {
            return true;
        }
        match visibility.visibility(&tap.user, &tap.repo) {
            Ok(Visibility::Public) => false,
            Ok(Visibility::Private | Visibility::NotFound) => true,
            Err(e) => {
                debug!("Visibility lookup for {} failed: {}", tap, e);
                false
            }
        }
    }

    fn load_tap(&self, user: &str, repo: &str, remote: Option<&str>) -> Result<Tap> {
        Self::parse(&format!("{user}/{repo}"))?;
        let mut tap = Tap::new(&self.config, user, repo, remote);
        if !tap.installed {
            return Ok(tap);
        }

        match self.source_control.remote_url(&tap.path) {
            Ok(Some(url)) => tap.remote = url,
            Ok(None) => {}
            Err(e) => debug!("Could not read remote of {}: {}", tap, e),
        }
        let settings = self.settings(&tap)?;
        if let Some(priority) = settings.priority {
            tap.priority = priority;
        }
        tap.pinned = settings.pinned;
        Ok(tap)
    }

    fn settings(&self, tap: &Tap) -> Result<TapSettings> {
        let path = self.config.tap_settings_path(&tap.user, &tap.repo);
        read_json_or_default(&path).map_err(|e| {
            error!("Failed to read tap settings {}: {}", path.display(), e);
            e
        })
    }

    fn save_settings(&self, tap: &Tap, settings: &TapSettings) -> Result<()> {
        write_json_sync(&self.config.tap_settings_path(&tap.user, &tap.repo), settings)
    }

    fn set_pinned(&self, tap: &Tap, pinned: bool) -> Result<bool> {
        self.ensure_installed(tap)?;
        let mut settings = self.settings(tap)?;
        if settings.pinned == pinned {
            return Ok(false);
        }
        settings.pinned = pinned;
        self.save_settings(tap, &settings)?;
        Ok(true)
    }

    fn ensure_installed(&self, tap: &Tap) -> Result<()> {
        if tap.path.is_dir() {
            Ok(())
        } else {
            Err(TaplineError::TapNotInstalled(tap.name.clone()))
        }
    }
}

fn dir_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;

    use super::*;

    /// Records clones and fakes a checkout by creating `.git`.
    #[derive(Default)]
    struct RecordingClone {
        clones: Mutex<Vec<(String, bool)>>,
    }

    impl SourceControl for RecordingClone {
        fn clone_repo(&self, url: &str, dest: &Path, shallow: bool) -> Result<()> {
            std::fs::create_dir_all(dest.join(".git"))?;
            std::fs::create_dir_all(dest.join("Formula"))?;
            std::fs::write(dest.join("Formula/foo.json"), "{}")?;
            self.clones.lock().unwrap().push((url.to_string(), shallow));
            Ok(())
        }

        fn remote_url(&self, _repo_path: &Path) -> Result<Option<String>> {
            Ok(None)
        }
    }

    fn registry(root: &Path) -> (TapRegistry, Arc<RecordingClone>) {
        let source_control = Arc::new(RecordingClone::default());
        let registry = TapRegistry::with_source_control(
            Config::with_root(root),
            source_control.clone(),
            Arc::new(Diagnostics::new()),
        );
        (registry, source_control)
    }

    #[test]
    fn parse_accepts_homebrew_prefix() {
        assert_eq!(
            TapRegistry::parse("alice/homebrew-tools").unwrap(),
            ("alice".to_string(), "tools".to_string())
        );
        assert!(matches!(
            TapRegistry::parse("alice"),
            Err(TaplineError::InvalidTapReference(_))
        ));
        assert!(TapRegistry::parse("a/b/c").is_err());
    }

    #[test]
    fn malformed_parts_are_rejected_everywhere() {
        let root = tempfile::tempdir().unwrap();
        let (registry, source_control) = registry(root.path());

        assert!(matches!(
            registry.register("alice/evil", "tools", None),
            Err(TaplineError::InvalidTapReference(_))
        ));
        assert!(matches!(
            registry.tap("alice", "../tools"),
            Err(TaplineError::InvalidTapReference(_))
        ));
        assert!(matches!(
            registry.find("", ""),
            Err(TaplineError::InvalidTapReference(_))
        ));
        assert!(source_control.clones.lock().unwrap().is_empty());
        assert!(!root.path().join("Library/Taps/alice/evil").exists());
    }

    #[test]
    fn install_clones_shallow_and_binds_default_priority() {
        let root = tempfile::tempdir().unwrap();
        let (registry, source_control) = registry(root.path());

        let pending = registry.register("alice", "tools", None).unwrap();
        assert!(!pending.installed);
        let tap = registry
            .install(&pending, TapInstallOptions::default())
            .unwrap();

        assert!(tap.installed);
        assert_eq!(tap.priority, 99);
        assert_eq!(
            source_control.clones.lock().unwrap().as_slice(),
            &[("https://github.com/alice/homebrew-tools".to_string(), true)]
        );
        assert_eq!(registry.list().unwrap().len(), 1);
    }

    #[test]
    fn install_with_bad_priority_warns_and_defaults() {
        let root = tempfile::tempdir().unwrap();
        let (registry, _) = registry(root.path());
        let pending = registry.register("alice", "tools", None).unwrap();
        let tap = registry
            .install(
                &pending,
                TapInstallOptions {
                    full_clone: true,
                    priority: Some(150),
                },
            )
            .unwrap();

        assert_eq!(tap.priority, 99);
        assert!(registry.diagnostics().warnings().iter().any(|w| matches!(
            w,
            Warning::PriorityOutOfRange {
                fallback: Some(99),
                ..
            }
        )));
    }

    #[test]
    fn pin_reports_changes_only() {
        let root = tempfile::tempdir().unwrap();
        let (registry, _) = registry(root.path());
        let pending = registry.register("alice", "tools", None).unwrap();
        let tap = registry
            .install(&pending, TapInstallOptions::default())
            .unwrap();

        assert!(registry.pin(&tap).unwrap());
        assert!(!registry.pin(&tap).unwrap());
        assert!(registry.updatable().unwrap().is_empty());
        assert!(registry.unpin(&tap).unwrap());
        assert!(!registry.unpin(&tap).unwrap());
        assert_eq!(registry.updatable().unwrap().len(), 1);
    }

    #[test]
    fn remove_prunes_settings_and_empty_user_dir() {
        let root = tempfile::tempdir().unwrap();
        let (registry, _) = registry(root.path());
        let pending = registry.register("alice", "tools", None).unwrap();
        let tap = registry
            .install(
                &pending,
                TapInstallOptions {
                    full_clone: false,
                    priority: Some(20),
                },
            )
            .unwrap();
        let settings = registry.config().tap_settings_path("alice", "tools");
        assert!(settings.is_file());

        assert_eq!(registry.remove(&tap).unwrap(), 1);
        assert!(!tap.path.exists());
        assert!(!settings.exists());
        assert!(!registry.config().taps_dir().join("alice").exists());
        assert!(matches!(
            registry.find("alice", "tools"),
            Err(TaplineError::TapNotInstalled(_))
        ));
    }

    #[test]
    fn set_priority_requires_installed_tap() {
        let root = tempfile::tempdir().unwrap();
        let (registry, _) = registry(root.path());
        let pending = registry.register("alice", "tools", None).unwrap();
        assert!(matches!(
            registry.set_priority(&pending, 10),
            Err(TaplineError::TapNotInstalled(_))
        ));
    }

    struct FixedVisibility(Result<Visibility>);

    impl RepoVisibility for FixedVisibility {
        fn visibility(&self, _owner: &str, _repo: &str) -> Result<Visibility> {
            self.0.clone()
        }
    }

    #[test]
    fn private_detection_follows_lookup() {
        let root = tempfile::tempdir().unwrap();
        let (registry, _) = registry(root.path());
        let tap = registry.register("alice", "tools", None).unwrap();

        assert!(!registry.is_private(&tap, &FixedVisibility(Ok(Visibility::Public))));
        assert!(registry.is_private(&tap, &FixedVisibility(Ok(Visibility::Private))));
        assert!(registry.is_private(&tap, &FixedVisibility(Ok(Visibility::NotFound))));
        assert!(!registry.is_private(
            &tap,
            &FixedVisibility(Err(TaplineError::Generic("rate limited".into())))
        ));

        let custom = registry
            .register("alice", "tools", Some("git@example.com:alice/tools.git"))
            .unwrap();
        assert!(registry.is_private(&custom, &FixedVisibility(Ok(Visibility::Public))));
    }
}
