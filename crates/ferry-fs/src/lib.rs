//! Filesystem primitives for ferry.
//!
//! - [`Storage`] - flat directory of downloaded files addressed by file name
//! - [`remove_file`] - best-effort deletion that never escalates

mod cleanup;
mod error;
mod storage;

pub use cleanup::{Removal, remove_file};
pub use error::{Error, Result, from_io};
pub use storage::{Storage, validate_name};
