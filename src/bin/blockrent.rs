//! Blockrent CLI Binary

use blockrent::cli::{Cli, CliContext};
use clap::Parser;
use std::process;

fn main() {
    let cli = Cli::parse();

    let context = match CliContext::new(cli.home.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error resolving repo home: {:#}", e);
            process::exit(1);
        }
    };

    if let Err(e) = context.init_logging() {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    match context.execute(&cli.command) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
