//! MCDReforged container entrypoint.

#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

use std::process::ExitCode;

use clap::Parser;
use mcdr_launch::cli::Launcher;

fn main() -> ExitCode {
    let app = Launcher::parse();

    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error report handler: {e}");
    }
    mcdr_launch::logging::init(app.verbose(), app.ansi());

    match app.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            mcdr_launch::error::report(&report);
            ExitCode::FAILURE
        }
    }
}
