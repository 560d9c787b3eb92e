//! Best-effort file removal.
//!
//! Cleanup never fails loudly: a missing file is simply reported as not
//! removed, and any other failure is logged and reported the same way.

use std::path::Path;

use tracing::warn;

/// Outcome of a [`remove_file`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Removal {
    pub removed: bool,
}

impl Removal {
    pub fn removed() -> Self { Self { removed: true } }

    pub fn skipped() -> Self { Self { removed: false } }
}

/// Delete the file at `path` if it exists.
///
/// Returns `removed: false` without logging when the file is already gone.
/// Any other failure (permissions, file in use, path is a directory) is
/// logged at `warn` and also yields `removed: false`.
pub fn remove_file(path: impl AsRef<Path>) -> Removal {
    let path = path.as_ref();

    match std::fs::remove_file(path) {
        Ok(()) => Removal::removed(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Removal::skipped(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to delete file");
            Removal::skipped()
        }
    }
}
