mod commands;
mod paths;
mod pip;

pub use commands::HideWindow;
pub use paths::{AppPaths, AppPathsError};
pub use pip::{
    DEFAULT_INTERPRETERS, LocateError, Resolution, locate_pip_main, pip_main_from_package_dir,
    resolve_pip_main,
};
