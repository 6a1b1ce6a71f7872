mod assemble;
mod cli;
mod config;
mod convert;
mod ingest;
mod knowledge;
mod logging;
mod model;
mod pipeline;
mod selector;
mod storage;
mod variables;

use std::process;

use clap::Parser;

use cli::Cli;
use config::Config;

fn main() {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            process::exit(1);
        }
    };

    logging::init(cli.verbose, &config.log_filter);

    if let Err(e) = cli::run(&cli, &config) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
