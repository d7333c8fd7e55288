use thiserror::Error;

use pps_backend::{ComputationBackend, ParseError};

use crate::InstallPolicy;

pub const COMPUTATION_BACKEND_HELP: &str = "Computation backend for compiled PyTorch \
    distributions, e.g. 'cu92', 'cu101', or 'cpu'. If not specified, the computation backend \
    is detected from the available hardware, preferring CUDA over CPU.";

pub const CPU_HELP: &str = "Shortcut for '--computation-backend=cpu'. If \
    '--computation-backend' is used simultaneously, it takes precedence over '--cpu'.";

const COMPUTATION_BACKEND_FLAG: &str = "--computation-backend";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgsError {
    #[error("--computation-backend option requires an argument")]
    MissingValue,

    #[error(transparent)]
    Backend(#[from] ParseError),
}

/// `--computation-backend` wins over `--cpu`, which wins over detection.
/// `detect` only runs when neither is given.
pub fn select_backend<D>(
    explicit: Option<ComputationBackend>,
    cpu: bool,
    detect: D,
) -> ComputationBackend
where
    D: FnOnce() -> ComputationBackend,
{
    match explicit {
        Some(backend) => backend,
        None if cpu => ComputationBackend::cpu(),
        None => detect(),
    }
}

/// The shim's options picked out of a pip command line. Everything else is
/// left for pip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipInstallArgs {
    pub computation_backend: ComputationBackend,
    pub nightly: bool,
}

impl PipInstallArgs {
    /// Only `pip install` carries shim options; any other subcommand gets the
    /// defaults. `detect` runs only when neither `--computation-backend` nor
    /// `--cpu` is given.
    pub fn parse<S, D>(args: &[S], detect: D) -> Result<Self, ArgsError>
    where
        S: AsRef<str>,
        D: FnOnce() -> ComputationBackend,
    {
        let args: &[S] = match args.first() {
            Some(first) if first.as_ref() == "install" => &args[1..],
            _ => &[],
        };

        let mut explicit = None;
        let mut cpu = false;
        let mut nightly = false;

        let mut iter = args.iter().map(AsRef::as_ref);
        while let Some(arg) = iter.next() {
            match arg {
                "--" => break,
                "--pre" => nightly = true,
                "--cpu" => cpu = true,
                COMPUTATION_BACKEND_FLAG => {
                    explicit = Some(iter.next().ok_or(ArgsError::MissingValue)?);
                }
                _ => {
                    if let Some(value) = arg
                        .strip_prefix(COMPUTATION_BACKEND_FLAG)
                        .and_then(|rest| rest.strip_prefix('='))
                    {
                        explicit = Some(value);
                    }
                }
            }
        }

        let explicit = explicit.map(str::parse).transpose()?;
        let computation_backend = select_backend(explicit, cpu, detect);

        Ok(Self {
            computation_backend,
            nightly,
        })
    }

    #[must_use]
    pub fn policy(&self) -> InstallPolicy {
        InstallPolicy::new(self.computation_backend.clone(), self.nightly)
    }
}
