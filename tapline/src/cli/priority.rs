//! Contains the logic for the `tap-priority` command.
use std::sync::Arc;

use clap::Args;
use tapline_common::error::Result;
use tapline_core::TapRegistry;

#[derive(Args, Debug)]
pub struct TapPriority {
    /// Tap to change, as `user/repo`
    pub name: String,

    /// New priority (0-99, lower wins; core formulae sit at 50)
    pub priority: u32,
}

impl TapPriority {
    pub fn run(&self, registry: &Arc<TapRegistry>) -> Result<()> {
        let (user, repo) = TapRegistry::parse(&self.name)?;
        let tap = registry.find(&user, &repo)?;
        // Shared or reserved priorities are reported through diagnostics.
        registry.set_priority(&tap, self.priority)?;
        println!("{} priority set to {}", tap, self.priority);
        Ok(())
    }
}
