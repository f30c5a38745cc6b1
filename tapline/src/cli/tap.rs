//! Contains the logic for the `tap` command.
use std::sync::Arc;

use clap::Args;
use colored::Colorize;
use tapline_common::error::Result;
use tapline_core::{TapInstallOptions, TapRegistry};
use tapline_net::GithubVisibility;
use tracing::debug;

#[derive(Args, Debug)]
pub struct TapArgs {
    /// Tap to add, as `user/repo`. Lists installed taps when omitted
    pub name: Option<String>,

    /// Clone from this URL instead of GitHub
    pub remote: Option<String>,

    /// Clone the full history instead of a shallow checkout
    #[arg(long)]
    pub full: bool,

    /// Search priority (0-99, lower wins; core formulae sit at 50)
    #[arg(long)]
    pub priority: Option<u32>,
}

impl TapArgs {
    pub fn run(&self, registry: &Arc<TapRegistry>) -> Result<()> {
        let Some(name) = &self.name else {
            for tap in registry.list()? {
                println!("{tap}");
            }
            return Ok(());
        };

        let (user, repo) = TapRegistry::parse(name)?;
        let tap = registry.register(&user, &repo, self.remote.as_deref())?;
        let options = TapInstallOptions {
            full_clone: self.full,
            priority: self.priority,
        };

        if tap.installed {
            println!(
                "{} {}/{} already tapped, changing priority",
                "==>".blue().bold(),
                tap.user,
                tap.repo
            );
            let tap = registry.install(&tap, options)?;
            println!("{} is at priority {}", tap, tap.priority);
            return Ok(());
        }

        println!("{} Tapping {}/{}", "==>".blue().bold(), tap.user, tap.repo);
        let tap = registry.install(&tap, options)?;
        let count = tap.formula_files()?.len();
        println!(
            "Tapped {} formula{} ({}), priority {}",
            count,
            if count == 1 { "" } else { "e" },
            tap.path.display(),
            tap.priority
        );

        let private = match GithubVisibility::new(registry.config()) {
            Ok(visibility) => registry.is_private(&tap, &visibility),
            Err(e) => {
                debug!("Skipping visibility check: {}", e);
                tap.custom_remote()
            }
        };
        if private {
            println!(
                "{}",
                format!(
                    "It looks like you tapped a private repository. To avoid entering your\n\
                     credentials each time you update, use git HTTP credential caching or run:\n\n  \
                     cd {}\n  git remote set-url origin git@github.com:{}/homebrew-{}.git",
                    tap.path.display(),
                    tap.user,
                    tap.repo
                )
                .yellow()
            );
        }
        Ok(())
    }
}
