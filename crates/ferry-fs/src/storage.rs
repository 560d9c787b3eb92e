use std::fs::File;
use std::path::{Path, PathBuf};

use crate::cleanup::{Removal, remove_file};
use crate::{Error, Result, from_io};

/// Flat directory that holds downloaded files, addressed by bare file name.
#[derive(Clone, Debug)]
pub struct Storage(PathBuf);

impl Storage {
    /// Open the storage root, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            std::fs::create_dir_all(&root).map_err(|source| Error::CreateDir {
                path: root.clone(),
                source,
            })?;
        }
        Ok(Self(root))
    }

    /// Resolve `name` to a path inside the root.
    ///
    /// Names that could escape the root are rejected with [`Error::InvalidName`].
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.0.join(name))
    }

    /// Open a stored regular file for reading, along with its size in bytes.
    ///
    /// Anything that is not a regular file is reported as [`Error::NotFound`].
    pub fn open(&self, name: &str) -> Result<(File, u64)> {
        let path = self.path_for(name)?;
        let file = File::open(&path).map_err(|e| from_io(&path, e))?;
        let metadata = file.metadata().map_err(|e| from_io(&path, e))?;
        if !metadata.is_file() {
            return Err(Error::NotFound(path));
        }
        Ok((file, metadata.len()))
    }

    /// Best-effort removal of a stored file.
    pub fn remove(&self, name: &str) -> Removal {
        match self.path_for(name) {
            Ok(path) => remove_file(path),
            Err(e) => {
                tracing::warn!(name, error = %e, "refusing to delete file");
                Removal::skipped()
            }
        }
    }

    pub fn path(&self) -> &Path { &self.0 }
}

/// Check that `name` is a single, plain path component.
pub fn validate_name(name: &str) -> Result<&str> {
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0']);

    if plain { Ok(name) } else { Err(Error::InvalidName(name.to_string())) }
}
