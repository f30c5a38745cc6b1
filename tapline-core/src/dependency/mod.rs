// tapline-core/src/dependency/mod.rs
pub mod expand;
pub mod policy;

pub use expand::{default_action, DependencyExpander, Dependent, ExpandAction};
pub use policy::PolicyFn;
