// tapline/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use tapline_common::error::Result;
use tapline_core::TapRegistry;

pub mod deps;
pub mod info;
pub mod pin;
pub mod priority;
pub mod tap;
pub mod tap_info;
pub mod untap;
pub mod update;

use crate::cli::deps::Deps;
use crate::cli::info::Info;
use crate::cli::pin::{TapPin, TapUnpin};
use crate::cli::priority::TapPriority;
use crate::cli::tap::TapArgs;
use crate::cli::tap_info::TapInfoArgs;
use crate::cli::untap::Untap;
use crate::cli::update::Update;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "tapline", bin_name = "tapline")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List taps, or tap a new one
    Tap(TapArgs),
    /// Remove installed taps
    Untap(Untap),
    /// Pin taps so update skips them
    #[command(name = "tap-pin")]
    TapPin(TapPin),
    /// Unpin taps
    #[command(name = "tap-unpin")]
    TapUnpin(TapUnpin),
    /// Change the search priority of a tap
    #[command(name = "tap-priority")]
    TapPriority(TapPriority),
    /// Show details about taps
    #[command(name = "tap-info")]
    TapInfo(TapInfoArgs),
    /// Show where a formula resolves to
    Info(Info),
    /// Show the expanded dependencies of a formula
    Deps(Deps),
    /// Fast-forward every unpinned tap
    Update(Update),
}

impl Command {
    pub fn run(&self, registry: &Arc<TapRegistry>) -> Result<()> {
        match self {
            Self::Tap(command) => command.run(registry),
            Self::Untap(command) => command.run(registry),
            Self::TapPin(command) => command.run(registry),
            Self::TapUnpin(command) => command.run(registry),
            Self::TapPriority(command) => command.run(registry),
            Self::TapInfo(command) => command.run(registry),
            Self::Update(command) => command.run(registry),
            // Commands that resolve formulae
            Self::Info(command) => command.run(registry),
            Self::Deps(command) => command.run(registry),
        }
    }
}
