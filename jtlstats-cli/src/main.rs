use clap::Parser;
use std::process;

use jtlstats_cli::logging::init_logging;
use jtlstats_cli::{run, Args};

fn main() {
    let args = Args::parse();
    init_logging();

    if let Err(e) = run(&args) {
        eprintln!("{e}");
        process::exit(1);
    }
}
