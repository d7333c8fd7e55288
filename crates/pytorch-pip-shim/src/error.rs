use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Shim(#[from] pps_shim::ShimError),

    #[error(transparent)]
    Locate(#[from] pps_platform::LocateError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
