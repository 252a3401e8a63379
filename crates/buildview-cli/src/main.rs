//! Buildview CLI Application
//!
//! Command-line interface for replaying CI build events against the build
//! view model.

mod args;
mod cli;

use anyhow::Result;
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use env_logger::Env;
use log::info;

fn main() -> Result<()> {
    let Args { verbose, command } = Args::parse();

    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Buildview started");

    match command {
        Commands::Replay(args) => {
            print!("{}", Cli::replay(&args)?);
            Ok(())
        }
        Commands::Fragment { fragment } => {
            println!("{}", Cli::fragment(&fragment));
            Ok(())
        }
    }
}
