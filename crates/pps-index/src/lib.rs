#![allow(clippy::missing_errors_doc)]

mod args;
mod policy;

pub use args::{ArgsError, COMPUTATION_BACKEND_HELP, CPU_HELP, PipInstallArgs, select_backend};
pub use policy::{
    Candidate, INDEX_BASE_URL, InstallPolicy, PATCHED_SUB_CMDS, PYTORCH_DISTRIBUTIONS,
    SELF_DISTRIBUTION, canonicalize_name, index_url, is_pytorch_distribution,
};
