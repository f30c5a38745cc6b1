// tapline-core/src/dependency/expand.rs

use std::collections::HashMap;
use std::sync::Arc;

use tapline_common::dependency::{BuildOptions, Dependency, DependencyTag};
use tapline_common::diagnostics::Warning;
use tapline_common::error::{Result, TaplineError};
use tapline_common::model::FormulaDefinition;
use tracing::{debug, error};

use crate::formulary::Formulary;

/// What to do with one edge during expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandAction {
    /// Drop the edge and everything below it.
    Prune,
    /// Drop the edge but keep walking below it.
    Skip,
    /// Keep the edge, do not walk below it.
    KeepNoRecurse,
    /// Keep the edge after everything below it.
    KeepAndRecurse,
}

/// The formula whose edges are being expanded, with the build options it was
/// requested with.
#[derive(Debug, Clone, Copy)]
pub struct Dependent<'a> {
    pub formula: &'a Arc<FormulaDefinition>,
    pub build: &'a BuildOptions,
}

impl Dependent<'_> {
    pub fn name(&self) -> &str {
        self.formula.name()
    }
}

type Policy<'p> = Box<dyn FnMut(&Dependent<'_>, &Dependency) -> Option<ExpandAction> + 'p>;

/// Flattens a formula's dependency graph into build order.
///
/// Dependencies come before their dependents. Every edge is offered to the
/// policy callback; a `None` answer falls back to the default, which prunes
/// optional and recommended edges the dependent did not ask for.
pub struct DependencyExpander<'a> {
    formulary: &'a Formulary,
    policy: Option<Policy<'a>>,
    visiting: Vec<String>,
}

impl<'a> DependencyExpander<'a> {
    pub fn new(formulary: &'a Formulary) -> Self {
        Self {
            formulary,
            policy: None,
            visiting: Vec::new(),
        }
    }

    pub fn with_policy<F>(mut self, policy: F) -> Self
    where
        F: FnMut(&Dependent<'_>, &Dependency) -> Option<ExpandAction> + 'a,
    {
        self.policy = Some(Box::new(policy));
        self
    }

    /// Expands `root`, then merges repeated names into single edges.
    pub fn expand(
        &mut self,
        root: &Arc<FormulaDefinition>,
        build: &BuildOptions,
    ) -> Result<Vec<Dependency>> {
        debug!("Expanding dependencies of {}", root.full_name());
        self.visiting.clear();

        let mut expanded = Vec::new();
        let dependent = Dependent {
            formula: root,
            build,
        };
        self.expand_node(&dependent, &mut expanded)?;
        Ok(self.merge_repeats(expanded))
    }

    fn expand_node(&mut self, dependent: &Dependent<'_>, out: &mut Vec<Dependency>) -> Result<()> {
        let key = dependent.formula.full_name();
        if self.visiting.contains(&key) {
            error!("Dependency cycle detected involving: {}", key);
            return Err(TaplineError::DependencyCycle(key));
        }
        self.visiting.push(key);
        let result = self.expand_edges(dependent, out);
        self.visiting.pop();
        result
    }

    fn expand_edges(&mut self, dependent: &Dependent<'_>, out: &mut Vec<Dependency>) -> Result<()> {
        for dep in dependent.formula.dependencies() {
            if is_self_edge(dependent, dep) {
                debug!("Ignoring self-dependency of {}", dependent.name());
                continue;
            }

            match self.action(dependent, dep) {
                ExpandAction::Prune => {
                    debug!("Pruned {} (required by {})", dep, dependent.name());
                }
                ExpandAction::Skip => self.expand_child(dep, out)?,
                ExpandAction::KeepNoRecurse => out.push(dep.clone()),
                ExpandAction::KeepAndRecurse => {
                    self.expand_child(dep, out)?;
                    out.push(dep.clone());
                }
            }
        }
        Ok(())
    }

    fn expand_child(&mut self, dep: &Dependency, out: &mut Vec<Dependency>) -> Result<()> {
        let formula = self.formulary.resolve_dependency(dep)?;
        let build = BuildOptions::from_dependency(dep);
        let child = Dependent {
            formula: &formula,
            build: &build,
        };
        self.expand_node(&child, out)
    }

    fn action(&mut self, dependent: &Dependent<'_>, dep: &Dependency) -> ExpandAction {
        if let Some(policy) = self.policy.as_mut() {
            if let Some(action) = policy(dependent, dep) {
                return action;
            }
        }
        default_action(dependent, dep)
    }

    /// Collapses edges sharing a name into the first occurrence, unioning
    /// tags and options. Differing owner taps are reported once per name.
    fn merge_repeats(&self, all: Vec<Dependency>) -> Vec<Dependency> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<Dependency>> = HashMap::new();
        for dep in all {
            let name = dep.name().to_string();
            if !groups.contains_key(&name) {
                order.push(name.clone());
            }
            groups.entry(name).or_default().push(dep);
        }

        let mut merged = Vec::with_capacity(order.len());
        for name in order {
            let Some(group) = groups.remove(&name) else {
                continue;
            };

            let mut tags = DependencyTag::empty();
            let mut options = Vec::new();
            let mut owners: Vec<&str> = Vec::new();
            for dep in &group {
                tags |= dep.tags();
                options.extend(dep.options().iter().cloned());
                if let Some(owner) = dep.owner_tap() {
                    if !owners.contains(&owner) {
                        owners.push(owner);
                    }
                }
            }
            if owners.len() > 1 {
                self.formulary
                    .diagnostics()
                    .emit(Warning::DependencyConflict {
                        name: name.clone(),
                        owners: owners.iter().map(|o| o.to_string()).collect(),
                    });
            }

            let first = &group[0];
            merged.push(
                Dependency::new_with_tags(name.as_str(), tags)
                    .with_options(options)
                    .with_owner_tap(owners.first().copied())
                    .with_env_hook(first.env_hook().cloned()),
            );
        }
        merged
    }
}

/// Prunes optional and recommended edges the dependent did not request.
pub fn default_action(dependent: &Dependent<'_>, dep: &Dependency) -> ExpandAction {
    if (dep.is_optional() || dep.is_recommended()) && !dependent.build.with(dep) {
        ExpandAction::Prune
    } else {
        ExpandAction::KeepAndRecurse
    }
}

fn is_self_edge(dependent: &Dependent<'_>, dep: &Dependency) -> bool {
    if dep.is_tap_qualified() {
        dep.name()
            .eq_ignore_ascii_case(&dependent.formula.full_name())
    } else {
        dep.name() == dependent.name()
    }
}
