// tapline-common/src/lib.rs
pub mod capability;
pub mod config;
pub mod dependency;
pub mod diagnostics;
pub mod error;
pub mod model;

// Re-export key types
pub use config::Config;
pub use diagnostics::{Diagnostics, Warning};
pub use error::{Result, TaplineError};
pub use model::{FormulaDefinition, Tap};
