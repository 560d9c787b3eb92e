//! Error types for ferry-fetch.

use thiserror::Error;

use crate::data::JobId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("no live download with id {0}")]
    NotFound(JobId),

    #[error("stored file not found: {0}")]
    FileNotFound(String),

    #[error("download id {0} is already registered")]
    Conflict(JobId),

    #[error("network error: {0}")]
    Network(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("remote sent {received} bytes but announced {expected}")]
    Overrun { expected: u64, received: u64 },

    #[error("download canceled")]
    Canceled,

    #[error(transparent)]
    Fs(ferry_fs::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<ferry_fs::Error> for Error {
    fn from(e: ferry_fs::Error) -> Self {
        match e {
            ferry_fs::Error::InvalidName(name) => Error::Validation(format!("invalid file name {name:?}")),
            other => Error::Fs(other),
        }
    }
}

