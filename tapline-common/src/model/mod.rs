// tapline-common/src/model/mod.rs
pub mod formula;
pub mod tap;

// Re-export
pub use formula::{FormulaDefinition, SpecKind};
pub use tap::{Tap, TapInfo, TapSettings};
