//! Mediatree CLI binary.
//!
//! Command-line interface for the media catalog index.

use clap::Parser;
use mediatree::cli::{Cli, CliContext};
use mediatree::logging::init_logging;
use std::process;

fn main() {
    let cli = Cli::parse();

    let context = match CliContext::new(cli.config.as_deref(), &cli.command) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error initializing catalog: {:#}", e);
            process::exit(1);
        }
    };

    let logging = context.logging_config(&cli);
    if let Err(e) = init_logging(Some(&logging), cli.log_file.clone()) {
        eprintln!("Error initializing logging: {}", e);
        process::exit(1);
    }

    match context.execute(&cli.command) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
