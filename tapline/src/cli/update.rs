//! Contains the logic for the `update` command.
use std::sync::Arc;

use clap::Args;
use colored::Colorize;
use tapline_aio::git2::update_repo;
use tapline_common::error::{Result, TaplineError};
use tapline_core::TapRegistry;
use tracing::{debug, error};

#[derive(Args, Debug)]
pub struct Update;

impl Update {
    pub fn run(&self, registry: &Arc<TapRegistry>) -> Result<()> {
        for tap in registry.list()?.iter().filter(|t| t.pinned) {
            println!("{} {} is pinned, skipping", "==>".blue().bold(), tap);
        }

        let mut failures = 0usize;
        for tap in registry.updatable()? {
            debug!("Updating tap {} at {}", tap, tap.path.display());
            match update_repo(&tap.path) {
                Ok(()) => println!("{} Updated {}", "==>".blue().bold(), tap),
                Err(e) => {
                    error!("Failed to update {}: {}", tap, e);
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            return Err(TaplineError::Git(format!(
                "{failures} tap{} failed to update",
                if failures == 1 { "" } else { "s" }
            )));
        }
        println!("Update completed successfully!");
        Ok(())
    }
}
