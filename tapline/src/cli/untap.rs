//! Contains the logic for the `untap` command.
use std::sync::Arc;

use clap::Args;
use tapline_common::error::Result;
use tapline_core::TapRegistry;

#[derive(Args, Debug)]
pub struct Untap {
    /// Taps to remove, as `user/repo`
    #[arg(required = true)]
    pub names: Vec<String>,
}

impl Untap {
    pub fn run(&self, registry: &Arc<TapRegistry>) -> Result<()> {
        for name in &self.names {
            let (user, repo) = TapRegistry::parse(name)?;
            let tap = registry.find(&user, &repo)?;
            println!("Untapping {}... ({})", tap, tap.path.display());
            let count = registry.remove(&tap)?;
            println!(
                "Untapped {} formula{}",
                count,
                if count == 1 { "" } else { "e" }
            );
        }
        Ok(())
    }
}
