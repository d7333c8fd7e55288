use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use pps_platform::AppPaths;

/// Overrides the pip main file for every subcommand that takes one.
pub const FILE_ENV: &str = "PYTORCH_PIP_SHIM_FILE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub pip_main_file: Option<PathBuf>,

    /// Interpreter whose pip is shimmed when no file is given.
    #[serde(default)]
    pub python: Option<String>,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,
}

fn default_max_log_size_bytes() -> u64 {
    1024 * 1024
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pip_main_file: None,
            python: None,
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        let settings = AppPaths::new()
            .map(|paths| Self::load_from_path(&paths.settings_file()))
            .unwrap_or_default();

        settings.with_file_override(std::env::var_os(FILE_ENV))
    }

    fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        // Runs before the logger exists, so problems cannot be reported.
        std::fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    fn with_file_override(mut self, value: Option<OsString>) -> Self {
        if let Some(value) = value.filter(|value| !value.is_empty()) {
            self.pip_main_file = Some(PathBuf::from(value));
        }
        self
    }

    /// Interpreters asked for pip's location, in order.
    pub fn interpreters(&self) -> Vec<String> {
        match &self.python {
            Some(python) => vec![python.clone()],
            None => pps_platform::DEFAULT_INTERPRETERS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}
