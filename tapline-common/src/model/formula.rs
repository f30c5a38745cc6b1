// tapline-common/src/model/formula.rs
// A formula definition parsed once from its declarative JSON file.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dependency::{Dependency, DependencyTag, EnvHook};
use crate::error::{Result, TaplineError};

/// Build specification variants a formula can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecKind {
    Stable,
    Devel,
    Head,
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stable => f.write_str("stable"),
            Self::Devel => f.write_str("devel"),
            Self::Head => f.write_str("head"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormulaDefinition {
    name: String,
    path: PathBuf,
    tap: Option<String>,
    desc: Option<String>,
    specs: BTreeSet<SpecKind>,
    options: Vec<String>,
    dependencies: Vec<Dependency>,
}

// --- On-disk shape ---------------------------------------------------------

#[derive(Deserialize)]
struct RawDefinition {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    desc: Option<String>,
    #[serde(default)]
    specs: Option<Vec<SpecKind>>,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    dependencies: Vec<RawDependency>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDependency {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default)]
        owner: Option<String>,
        #[serde(default)]
        env: Option<String>,
    },
}

impl RawDependency {
    fn into_dependency(self, defining_tap: Option<&str>) -> Dependency {
        let (name, words, owner, env) = match self {
            Self::Name(name) => (name, Vec::new(), None, None),
            Self::Detailed {
                name,
                tags,
                owner,
                env,
            } => (name, tags, owner, env),
        };

        let mut tags = DependencyTag::empty();
        let mut options = Vec::new();
        for word in words {
            match DependencyTag::from_word(&word) {
                Some(tag) => tags |= tag,
                None => options.push(word),
            }
        }
        // Anything not marked build/test-only is needed at runtime.
        if !tags.intersects(DependencyTag::BUILD | DependencyTag::TEST) {
            tags |= DependencyTag::RUNTIME;
        }

        Dependency::new_with_tags(name, tags)
            .with_options(options)
            .with_owner_tap(owner.as_deref().or(defining_tap))
            .with_env_hook(env.map(EnvHook::new))
    }
}

impl FormulaDefinition {
    /// Parses a definition file. `tap` is the tap the file lives in, if any;
    /// edges without an explicit owner are attributed to it.
    pub fn from_json(json: &str, path: &Path, tap: Option<&str>) -> Result<Self> {
        let raw: RawDefinition = serde_json::from_str(json).map_err(|e| {
            TaplineError::ParseError(
                "formula definition",
                format!("{}: {e}", path.display()),
            )
        })?;

        let name = match raw.name {
            Some(name) if !name.is_empty() => name,
            _ => path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    TaplineError::ParseError(
                        "formula definition",
                        format!("cannot derive a name from {}", path.display()),
                    )
                })?,
        };
        let specs = raw
            .specs
            .map(|s| s.into_iter().collect())
            .unwrap_or_else(|| BTreeSet::from([SpecKind::Stable]));
        let dependencies = raw
            .dependencies
            .into_iter()
            .map(|d| d.into_dependency(tap))
            .collect();

        Ok(Self {
            name,
            path: path.to_path_buf(),
            tap: tap.map(str::to_string),
            desc: raw.desc,
            specs,
            options: raw.options,
            dependencies,
        })
    }

    /// Creates a definition in memory. Primarily for tests and callers that
    /// assemble formulae without a backing file.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, dependencies: Vec<Dependency>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            tap: None,
            desc: None,
            specs: BTreeSet::from([SpecKind::Stable]),
            options: Vec::new(),
            dependencies,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `user/repo/name` for tapped formulae, otherwise the bare name.
    pub fn full_name(&self) -> String {
        match &self.tap {
            Some(tap) => format!("{tap}/{}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tap(&self) -> Option<&str> {
        self.tap.as_deref()
    }

    /// True for formulae that do not come from a tap.
    pub fn is_core(&self) -> bool {
        self.tap.is_none()
    }

    pub fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    pub fn specs(&self) -> &BTreeSet<SpecKind> {
        &self.specs
    }

    pub fn has_spec(&self, spec: SpecKind) -> bool {
        self.specs.contains(&spec)
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_detailed_edges() {
        let json = r#"{
            "name": "wget",
            "desc": "Internet file retriever",
            "specs": ["stable", "head"],
            "dependencies": [
                "openssl",
                {"name": "pkg-config", "tags": ["build"]},
                {"name": "libidn2", "tags": ["optional", "with-static"], "env": "idn-env"},
                {"name": "other/tap/gpgme", "owner": "other/tap"}
            ]
        }"#;
        let def = FormulaDefinition::from_json(
            json,
            Path::new("/taps/alice/homebrew-tools/Formula/wget.json"),
            Some("alice/tools"),
        )
        .unwrap();

        assert_eq!(def.name(), "wget");
        assert_eq!(def.full_name(), "alice/tools/wget");
        assert!(def.has_spec(SpecKind::Head));
        assert!(!def.has_spec(SpecKind::Devel));

        let deps = def.dependencies();
        assert_eq!(deps.len(), 4);
        assert_eq!(deps[0].tags(), DependencyTag::RUNTIME);
        assert_eq!(deps[0].owner_tap(), Some("alice/tools"));
        assert_eq!(deps[1].tags(), DependencyTag::BUILD);
        assert_eq!(
            deps[2].tags(),
            DependencyTag::RUNTIME | DependencyTag::OPTIONAL
        );
        assert!(deps[2].options().contains("with-static"));
        assert_eq!(deps[2].env_hook().map(EnvHook::id), Some("idn-env"));
        assert_eq!(deps[3].owner_tap(), Some("other/tap"));
    }

    #[test]
    fn name_and_specs_have_defaults() {
        let def =
            FormulaDefinition::from_json("{}", Path::new("/core/Formula/zlib.json"), None).unwrap();
        assert_eq!(def.name(), "zlib");
        assert!(def.is_core());
        assert!(def.has_spec(SpecKind::Stable));
        assert!(def.dependencies().is_empty());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = FormulaDefinition::from_json("{", Path::new("/core/Formula/bad.json"), None)
            .unwrap_err();
        assert!(matches!(err, TaplineError::ParseError(..)));
    }
}
