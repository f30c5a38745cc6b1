// tapline-common/src/diagnostics.rs
//! Non-fatal notices raised while resolving formulae and managing taps.
use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A tap was given the priority reserved for core formulae.
    ReservedPriority { tap: String, priority: u32 },
    /// A requested priority was outside `0..=99`. `fallback` is the value
    /// used instead, `None` when the existing binding was left alone.
    PriorityOutOfRange {
        tap: String,
        priority: u32,
        fallback: Option<u32>,
    },
    /// Another tap already holds the same priority.
    SamePriority {
        tap: String,
        other: String,
        priority: u32,
    },
    /// More than one source at the winning priority provides the formula.
    AmbiguousFormula {
        name: String,
        priority: u32,
        candidates: Vec<PathBuf>,
        chosen: PathBuf,
    },
    /// A dependency was not found in its owner tap and came from elsewhere.
    CrossTapFallback {
        name: String,
        owner: String,
        provider: String,
    },
    /// The same dependency name was contributed by several owner taps.
    DependencyConflict { name: String, owners: Vec<String> },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReservedPriority { tap, priority } => write!(
                f,
                "{tap}: core formulae have a priority of {priority}, giving a tap the same priority is not recommended"
            ),
            Self::PriorityOutOfRange {
                tap,
                priority,
                fallback: Some(fallback),
            } => write!(
                f,
                "{tap}: priority {priority} not allowed, defaulting to {fallback}"
            ),
            Self::PriorityOutOfRange {
                tap,
                priority,
                fallback: None,
            } => write!(
                f,
                "{tap}: priority {priority} not allowed, keeping the current priority"
            ),
            Self::SamePriority {
                tap,
                other,
                priority,
            } => write!(f, "{tap}: same priority ({priority}) as {other}"),
            Self::AmbiguousFormula {
                name,
                priority,
                candidates,
                chosen,
            } => write!(
                f,
                "multiple sources at priority {priority} provide '{name}' ({}); using {}",
                candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                chosen.display()
            ),
            Self::CrossTapFallback {
                name,
                owner,
                provider,
            } => write!(
                f,
                "{name} is required but is not provided by either {owner} or core, installing from {provider} instead; you may wish to report this to the author of {owner}"
            ),
            Self::DependencyConflict { name, owners } => write!(
                f,
                "dependency tree has a conflict: '{name}' is provided by {}; you may wish to report this to the formula author",
                owners.join(", ")
            ),
        }
    }
}

/// Collects warnings and forwards each one to `tracing`.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Mutex<Vec<Warning>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, warning: Warning) {
        warn!("{}", warning);
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(warning);
    }

    /// Snapshot of every warning emitted so far.
    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes and returns the recorded warnings.
    pub fn take(&self) -> Vec<Warning> {
        std::mem::take(&mut *self.warnings.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
