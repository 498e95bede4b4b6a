use std::process::ExitCode;

use clap::Parser;
use nbtree::cli::{Cli, run};
use nbtree::infra::interrupt;

fn main() -> ExitCode {
    let cli = Cli::parse();
    nbtree::init(cli.log_level());

    if let Err(err) = interrupt::install() {
        tracing::warn!(error = %err, "continuing without interrupt handling");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
