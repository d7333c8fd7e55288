#![allow(clippy::missing_errors_doc)]

mod detection;
mod error;
mod types;

pub use detection::{CommandProbe, VersionProbe, detect, detect_from_output, detect_with};
pub use error::ParseError;
pub use types::{CPU_TAG, CUDA_PREFIX, ComputationBackend};
