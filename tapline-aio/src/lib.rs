// tapline-aio/src/lib.rs
//! Blocking IO operations for tapline (filesystem, json, git, bottle archives)

pub mod bottle;
pub mod fs;
pub mod git2;
pub mod json_io;

pub use bottle::TarBottleInspector;
pub use crate::git2::GitClient;
pub use json_io::{read_json_sync, write_json_sync};
