use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::fs::{File, OpenOptions};
use std::path::Path;

use pps_platform::AppPaths;

use crate::settings::Settings;

fn log_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("pps_")
        .add_filter_allow_str("pytorch_pip_shim")
        .build()
}

fn terminal_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

fn trim_log_file_if_oversized(log_path: &Path, max_log_size: u64) {
    if let Ok(metadata) = std::fs::metadata(log_path)
        && metadata.len() > max_log_size
        && let Ok(contents) = std::fs::read(log_path)
    {
        let half = contents.len() / 2;
        let keep_from = contents[half..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(half, |pos| half + pos + 1);
        let _ = std::fs::write(log_path, &contents[keep_from..]);
    }
}

fn open_log_file(max_log_size: u64) -> Option<File> {
    let paths = AppPaths::new().ok()?;
    paths.ensure_dirs().ok()?;
    let log_path = paths.log_file();

    trim_log_file_if_oversized(&log_path, max_log_size);

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok()
}

/// Warnings go to stderr, debug output too with `--verbose`. With
/// `debug_logging` set, everything is also appended to the log file.
pub fn init_logging(verbose: bool, settings: &Settings) {
    let config = log_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        terminal_level(verbose),
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if settings.debug_logging
        && let Some(file) = open_log_file(settings.max_log_size_bytes)
    {
        loggers.push(WriteLogger::new(LevelFilter::Debug, config, file));
    }

    let _ = CombinedLogger::init(loggers);
}
