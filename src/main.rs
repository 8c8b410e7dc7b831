// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

mod cmd;
mod collab;
mod config;
mod differ;
mod error;
mod naming;
mod normalize;
mod parser;
mod renderer;
mod rollback;
mod schema;
mod state;
mod traverse;

use clap::Parser;
use cmd::Cli;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = cmd::run(cli) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
