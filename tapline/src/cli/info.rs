//! Contains the logic for the `info` command.
use std::sync::Arc;

use clap::Args;
use colored::Colorize;
use tapline_common::dependency::DependencyExt;
use tapline_common::error::{Result, TaplineError};
use tapline_core::{Formulary, TapRegistry};

#[derive(Args, Debug)]
pub struct Info {
    /// Formula reference: name, `user/repo/name`, path, URL or bottle
    pub formula: String,
}

impl Info {
    pub fn run(&self, registry: &Arc<TapRegistry>) -> Result<()> {
        let formulary = Formulary::new(Arc::clone(registry))?;
        let loader = formulary.loader_for(&self.formula)?;
        let formula = loader.get_formula(&formulary)?;

        println!("{}", formula.full_name().green().bold());
        if let Some(desc) = formula.desc() {
            println!("{desc}");
        }
        println!("{}", formula.path().display());
        if let Some(bottle) = loader.bottle_path() {
            println!("Bottle: {}", bottle.display());
        }
        let specs: Vec<String> = formula.specs().iter().map(ToString::to_string).collect();
        println!("Specs: {}", specs.join(", "));
        if !formula.options().is_empty() {
            println!("Options: {}", formula.options().join(", "));
        }

        let deps = formula.dependencies();
        for (title, group) in [("Build", deps.build_time()), ("Required", deps.runtime())] {
            if group.is_empty() {
                continue;
            }
            let names: Vec<String> = group
                .iter()
                .map(|dep| match dep.tags().words().as_slice() {
                    [] | ["build"] => dep.to_string(),
                    _ => format!("{dep} ({})", dep.tags()),
                })
                .collect();
            println!("{}: {}", title.bold(), names.join(", "));
        }

        match formulary.tap_path(formula.name()) {
            Err(TaplineError::TapFormulaAmbiguity { paths, .. }) => {
                println!("{}", "Also provided by".bold());
                for path in paths {
                    println!("  {}", path.display());
                }
            }
            Err(e) => return Err(e),
            Ok(_) => {}
        }
        Ok(())
    }
}
