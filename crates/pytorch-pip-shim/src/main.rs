mod cli;
mod commands;
mod error;
mod logging;
mod settings;

use clap::Parser;
use std::process::ExitCode;

use pps_backend::CommandProbe;

use crate::cli::CliArgs;
use crate::commands::{NAME, VERSION};
use crate::settings::Settings;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let settings = Settings::load();
    logging::init_logging(args.verbose, &settings);

    log::debug!("{NAME} v{VERSION} starting");
    log::debug!("Arguments: {args:?}");

    let probe = CommandProbe::nvcc();
    let mut stdout = std::io::stdout().lock();

    match commands::run(&args, &settings, &probe, &mut stdout) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            commands::report_error(&error, &mut std::io::stderr().lock());
            ExitCode::FAILURE
        }
    }
}
