//! Contains the logic for the `deps` command.
use std::sync::Arc;

use clap::Args;
use tapline_common::dependency::BuildOptions;
use tapline_common::error::Result;
use tapline_core::dependency::policy::{self, PolicyFn};
use tapline_core::{DependencyExpander, Formulary, TapRegistry};

#[derive(Args, Debug)]
pub struct Deps {
    /// Formula reference: name, `user/repo/name`, path, URL or bottle
    pub formula: String,

    /// Only list direct dependencies
    #[arg(short = '1', long = "direct")]
    pub direct: bool,

    /// Leave out build-time dependencies
    #[arg(long)]
    pub skip_build: bool,

    /// Leave out test dependencies
    #[arg(long)]
    pub skip_test: bool,

    /// Build options for the formula, e.g. `--with gpg` for `with-gpg`
    #[arg(long = "with", value_name = "NAME")]
    pub with: Vec<String>,

    /// Show tags next to each dependency
    #[arg(long)]
    pub tags: bool,
}

impl Deps {
    pub fn run(&self, registry: &Arc<TapRegistry>) -> Result<()> {
        let formulary = Formulary::new(Arc::clone(registry))?;
        let formula = formulary.factory(&self.formula)?;
        let build = BuildOptions::new(self.with.iter().map(|name| format!("with-{name}")));

        let mut policies: Vec<PolicyFn> = Vec::new();
        if self.skip_build {
            policies.push(policy::skip_build);
        }
        if self.skip_test {
            policies.push(policy::skip_test);
        }
        if self.direct {
            policies.push(policy::direct);
        }

        let deps = DependencyExpander::new(&formulary)
            .with_policy(policy::first_match(policies))
            .expand(&formula, &build)?;

        for dep in deps {
            if self.tags {
                println!("{dep} ({})", dep.tags());
            } else {
                println!("{dep}");
            }
        }
        Ok(())
    }
}
