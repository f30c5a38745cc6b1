// tapline-common/src/dependency/mod.rs
pub mod definition;
pub mod env;
pub mod options;

pub use definition::{Dependency, DependencyExt, DependencyTag};
pub use env::{BuildEnv, EnvHook, EnvHooks};
pub use options::BuildOptions;
