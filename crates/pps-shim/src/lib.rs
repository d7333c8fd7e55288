#![allow(clippy::missing_errors_doc)]

mod markers;
mod shim;

pub use markers::{ANCHOR, BOOTSTRAP, IDENTIFIER};
pub use shim::{PipMainFile, ShimEdit, ShimError, insert, is_inserted, remove};
