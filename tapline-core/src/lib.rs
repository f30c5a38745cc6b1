// tapline-core/src/lib.rs

pub mod dependency;
pub mod formulary;
pub mod tap;

// Re-export key types for easier use by the CLI crate
pub use dependency::{DependencyExpander, Dependent, ExpandAction};
pub use formulary::{DefinitionCache, FormulaLoader, Formulary, LoaderSource};
pub use tap::{TapInstallOptions, TapRegistry};
