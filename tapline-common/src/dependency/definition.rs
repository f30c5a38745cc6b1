// tapline-common/src/dependency/definition.rs
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::env::EnvHook;

/// Owner recorded by formulae of the historical main repository; treated as no owner.
const LEGACY_CORE_OWNER: &str = "homebrew/homebrew";

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct DependencyTag: u8 {
        const RUNTIME     = 0b00000001;
        const BUILD       = 0b00000010;
        const TEST        = 0b00000100;
        const OPTIONAL    = 0b00001000;
        const RECOMMENDED = 0b00010000;
    }
}

impl Default for DependencyTag {
    fn default() -> Self {
        Self::RUNTIME
    }
}

impl DependencyTag {
    /// Maps a reserved tag word from a definition file; other words are build options.
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "run" | "runtime" => Some(Self::RUNTIME),
            "build" => Some(Self::BUILD),
            "test" => Some(Self::TEST),
            "optional" => Some(Self::OPTIONAL),
            "recommended" => Some(Self::RECOMMENDED),
            _ => None,
        }
    }

    pub fn words(&self) -> Vec<&'static str> {
        let mut words = Vec::new();
        for (word, flag) in [
            ("build", Self::BUILD),
            ("test", Self::TEST),
            ("optional", Self::OPTIONAL),
            ("recommended", Self::RECOMMENDED),
        ] {
            if self.contains(flag) {
                words.push(word);
            }
        }
        words
    }
}

impl fmt::Display for DependencyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.words().join(", "))
    }
}

/// An edge from a dependent formula to the formula it requires.
///
/// Equality and hashing only look at the name, tags and options, so the same
/// requirement declared through different owner taps compares equal.
#[derive(Debug, Clone, Serialize)]
pub struct Dependency {
    name: String,
    tags: DependencyTag,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    options: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner_tap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    env_hook: Option<EnvHook>,
    #[serde(skip)]
    option_name: String,
}

impl Dependency {
    pub fn new_runtime(name: impl Into<String>) -> Self {
        Self::new_with_tags(name, DependencyTag::RUNTIME)
    }

    pub fn new_with_tags(name: impl Into<String>, tags: DependencyTag) -> Self {
        let name = name.into();
        let option_name = default_option_name(&name);
        Self {
            name,
            tags,
            options: BTreeSet::new(),
            owner_tap: None,
            env_hook: None,
            option_name,
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_owner_tap(mut self, owner_tap: Option<&str>) -> Self {
        self.owner_tap = owner_tap
            .filter(|owner| !owner.eq_ignore_ascii_case(LEGACY_CORE_OWNER))
            .map(str::to_string);
        self
    }

    pub fn with_env_hook(mut self, env_hook: Option<EnvHook>) -> Self {
        self.env_hook = env_hook;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> DependencyTag {
        self.tags
    }

    pub fn options(&self) -> &BTreeSet<String> {
        &self.options
    }

    pub fn owner_tap(&self) -> Option<&str> {
        self.owner_tap.as_deref()
    }

    pub fn env_hook(&self) -> Option<&EnvHook> {
        self.env_hook.as_ref()
    }

    /// Name used in `with-<name>` / `without-<name>` build options.
    pub fn option_name(&self) -> &str {
        &self.option_name
    }

    pub fn is_optional(&self) -> bool {
        self.tags.contains(DependencyTag::OPTIONAL)
    }

    pub fn is_recommended(&self) -> bool {
        self.tags.contains(DependencyTag::RECOMMENDED)
    }

    pub fn is_build(&self) -> bool {
        self.tags.contains(DependencyTag::BUILD)
    }

    pub fn is_test(&self) -> bool {
        self.tags.contains(DependencyTag::TEST)
    }

    /// True when the name already carries its tap: `user/repo/name`.
    pub fn is_tap_qualified(&self) -> bool {
        is_tap_qualified(&self.name)
    }

    /// The `user/repo` part of a tap-qualified name.
    pub fn tap(&self) -> Option<&str> {
        if self.is_tap_qualified() {
            self.name.rsplit_once('/').map(|(tap, _)| tap)
        } else {
            None
        }
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.tags == other.tags && self.options == other.options
    }
}

impl Eq for Dependency {}

impl Hash for Dependency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.tags.hash(state);
        self.options.hash(state);
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

pub fn is_tap_qualified(name: &str) -> bool {
    let parts: Vec<&str> = name.split('/').collect();
    parts.len() == 3 && parts.iter().all(|p| !p.is_empty())
}

fn default_option_name(name: &str) -> String {
    if is_tap_qualified(name) {
        name.rsplit('/').next().unwrap_or(name).to_string()
    } else {
        name.to_string()
    }
}

pub trait DependencyExt {
    fn filter_by_tags(&self, include: DependencyTag, exclude: DependencyTag) -> Vec<&Dependency>;
    fn runtime(&self) -> Vec<&Dependency>;
    fn build_time(&self) -> Vec<&Dependency>;
}

impl DependencyExt for [Dependency] {
    fn filter_by_tags(&self, include: DependencyTag, exclude: DependencyTag) -> Vec<&Dependency> {
        self.iter()
            .filter(|dep| dep.tags.contains(include) && !dep.tags.intersects(exclude))
            .collect()
    }

    fn runtime(&self) -> Vec<&Dependency> {
        self.iter()
            .filter(|dep| {
                dep.tags.intersects(
                    DependencyTag::RUNTIME | DependencyTag::RECOMMENDED | DependencyTag::OPTIONAL,
                )
            })
            .collect()
    }

    fn build_time(&self) -> Vec<&Dependency> {
        self.filter_by_tags(DependencyTag::BUILD, DependencyTag::empty())
    }
}
