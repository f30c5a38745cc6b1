//! Contains the logic for the `tap-pin` and `tap-unpin` commands.
use std::sync::Arc;

use clap::Args;
use colored::Colorize;
use tapline_common::error::Result;
use tapline_core::TapRegistry;
use tracing::warn;

#[derive(Args, Debug)]
pub struct TapPin {
    /// Taps to pin, as `user/repo`
    #[arg(required = true)]
    pub names: Vec<String>,
}

#[derive(Args, Debug)]
pub struct TapUnpin {
    /// Taps to unpin, as `user/repo`
    #[arg(required = true)]
    pub names: Vec<String>,
}

impl TapPin {
    pub fn run(&self, registry: &Arc<TapRegistry>) -> Result<()> {
        toggle(registry, &self.names, true)
    }
}

impl TapUnpin {
    pub fn run(&self, registry: &Arc<TapRegistry>) -> Result<()> {
        toggle(registry, &self.names, false)
    }
}

fn toggle(registry: &TapRegistry, names: &[String], pin: bool) -> Result<()> {
    for name in names {
        let (user, repo) = TapRegistry::parse(name)?;
        let tap = registry.tap(&user, &repo)?;
        // Stop at the first tap that is not installed, leaving the rest untouched.
        if !tap.installed {
            warn!("{} not tapped", tap);
            return Ok(());
        }

        let changed = if pin {
            registry.pin(&tap)?
        } else {
            registry.unpin(&tap)?
        };
        match (changed, pin) {
            (true, true) => println!("{} Pinned {}", "==>".blue().bold(), tap),
            (true, false) => println!("{} Unpinned {}", "==>".blue().bold(), tap),
            (false, true) => warn!("{} already pinned", tap),
            (false, false) => warn!("{} already unpinned", tap),
        }
    }
    Ok(())
}
