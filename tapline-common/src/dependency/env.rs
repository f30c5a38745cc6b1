// tapline-common/src/dependency/env.rs
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::definition::Dependency;
use crate::error::{Result, TaplineError};

/// Environment handed to build collaborators.
pub type BuildEnv = BTreeMap<String, String>;

type HookFn = dyn Fn(&mut BuildEnv) + Send + Sync;

/// Identifier of a registered environment callback declared on an edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvHook(String);

impl EnvHook {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnvHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry of environment callbacks, keyed by hook id.
#[derive(Default, Clone)]
pub struct EnvHooks {
    hooks: HashMap<String, Arc<HookFn>>,
}

impl fmt::Debug for EnvHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvHooks")
            .field("hooks", &self.hooks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl EnvHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, id: impl Into<String>, hook: F)
    where
        F: Fn(&mut BuildEnv) + Send + Sync + 'static,
    {
        self.hooks.insert(id.into(), Arc::new(hook));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.hooks.contains_key(id)
    }

    /// Runs the hook declared on `dep`, if it has one.
    pub fn modify_build_environment(&self, dep: &Dependency, env: &mut BuildEnv) -> Result<()> {
        let Some(hook) = dep.env_hook() else {
            return Ok(());
        };
        let callback = self
            .hooks
            .get(hook.id())
            .ok_or_else(|| TaplineError::UnknownEnvHook {
                dependency: dep.name().to_string(),
                hook: hook.id().to_string(),
            })?;
        tracing::debug!("Applying env hook '{}' for {}", hook, dep.name());
        callback(env);
        Ok(())
    }
}
