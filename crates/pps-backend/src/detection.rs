use regex::Regex;
use std::process::Command;
use std::sync::OnceLock;
use which::which;

use pps_platform::HideWindow;

use crate::ComputationBackend;

/// Source of the raw text detection inspects.
///
/// `None` means the probe could not produce output at all, which detection
/// treats the same as output without a CUDA release.
pub trait VersionProbe {
    fn probe(&self) -> Option<String>;
}

impl<F> VersionProbe for F
where
    F: Fn() -> Option<String>,
{
    fn probe(&self) -> Option<String> {
        self()
    }
}

#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: String,
    args: Vec<String>,
}

impl CommandProbe {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn nvcc() -> Self {
        Self::new("nvcc", ["--version"])
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for CommandProbe {
    fn default() -> Self {
        Self::nvcc()
    }
}

impl VersionProbe for CommandProbe {
    fn probe(&self) -> Option<String> {
        let Ok(path) = which(&self.program) else {
            log::debug!("{} not found, assuming no CUDA toolkit", self.program);
            return None;
        };

        let output = match Command::new(&path).args(&self.args).hide_window().output() {
            Ok(output) => output,
            Err(error) => {
                log::debug!("Failed to run {}: {error}", path.display());
                return None;
            }
        };

        if !output.status.success() {
            log::debug!("{} exited with {}", path.display(), output.status);
            return None;
        }

        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn release_pattern() -> &'static Regex {
    static RELEASE_PATTERN: OnceLock<Regex> = OnceLock::new();
    RELEASE_PATTERN.get_or_init(|| {
        Regex::new(r"release (?P<major>[0-9]+)[.](?P<minor>[0-9]+)")
            .expect("Invalid release regex")
    })
}

/// Extract the CUDA release from `nvcc --version` style output.
#[must_use]
pub fn detect_from_output(output: &str) -> ComputationBackend {
    let Some(captures) = release_pattern().captures(output) else {
        log::debug!("No CUDA release found in probe output");
        return ComputationBackend::cpu();
    };

    match (captures["major"].parse(), captures["minor"].parse()) {
        (Ok(major), Ok(minor)) => ComputationBackend::cuda(major, minor),
        _ => ComputationBackend::cpu(),
    }
}

pub fn detect_with<P>(probe: &P) -> ComputationBackend
where
    P: VersionProbe + ?Sized,
{
    let backend = probe
        .probe()
        .map_or_else(ComputationBackend::cpu, |output| detect_from_output(&output));
    log::debug!("Detected computation backend: {backend}");
    backend
}

/// Detect the computation backend from the installed CUDA toolkit, preferring
/// CUDA over CPU. Never fails: a missing or broken toolkit means CPU.
#[must_use]
pub fn detect() -> ComputationBackend {
    detect_with(&CommandProbe::nvcc())
}
