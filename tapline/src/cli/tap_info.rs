//! Contains the logic for the `tap-info` command.
use std::sync::Arc;

use clap::Args;
use colored::Colorize;
use tapline_common::error::Result;
use tapline_common::model::{Tap, TapInfo};
use tapline_core::TapRegistry;

#[derive(Args, Debug)]
pub struct TapInfoArgs {
    /// Taps to describe, as `user/repo`
    pub names: Vec<String>,

    /// Describe every installed tap
    #[arg(long)]
    pub installed: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl TapInfoArgs {
    pub fn run(&self, registry: &Arc<TapRegistry>) -> Result<()> {
        let taps: Vec<Tap> = if self.installed || self.names.is_empty() {
            registry.list()?
        } else {
            self.names
                .iter()
                .map(|name| registry.fetch(name))
                .collect::<Result<_>>()?
        };

        let infos = taps.iter().map(Tap::info).collect::<Result<Vec<_>>>()?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&infos)?);
            return Ok(());
        }

        if infos.is_empty() {
            println!("{}", "No taps installed".yellow());
            return Ok(());
        }
        for info in &infos {
            print_info(info);
        }
        Ok(())
    }
}

fn print_info(info: &TapInfo) {
    println!("{}", info.name.bold());
    if !info.installed {
        println!("Not installed");
        return;
    }
    println!(
        "{} formula{}, priority {}{}",
        info.formula_names.len(),
        if info.formula_names.len() == 1 { "" } else { "e" },
        info.priority,
        if info.pinned { ", pinned" } else { "" }
    );
    if !info.command_files.is_empty() {
        println!("{} commands", info.command_files.len());
    }
    println!("{}", info.path.display());
    println!("From: {}", info.remote);
    println!();
}
