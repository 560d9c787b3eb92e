use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Default pause between a cancellation and deletion of the partial file.
pub const DEFAULT_CANCEL_GRACE: Duration = Duration::from_secs(1);

/// Default pacing for the rate-limited serving path: 50 KiB/s.
pub const DEFAULT_THROTTLE_RATE: u64 = 50 * 1024;

/// Configuration of a [`crate::DownloadService`].
///
/// # Examples
///
/// ```
/// use ferry_fetch::ServiceConfig;
/// use std::time::Duration;
///
/// let config = ServiceConfig::new("/var/lib/ferry")
///     .cancel_grace(Duration::from_millis(250))
///     .throttle_rate(1024 * 1024);
///
/// assert_eq!(config.throttle_rate, 1024 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory the downloaded files are written to and served from.
    ///
    /// Default: `downloads`
    pub storage_dir: PathBuf,

    /// Delay between a cancellation and the removal of the partial file.
    ///
    /// The job disappears from the registry immediately; only the deletion
    /// waits, so a query racing the cancellation still sees a consistent
    /// filesystem.
    ///
    /// Default: 1s
    pub cancel_grace: Duration,

    /// Bytes per second used by the rate-limited serving path when the
    /// caller does not ask for a specific rate.
    ///
    /// Default: 50 KiB/s
    pub throttle_rate: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            storage_dir:   PathBuf::from("downloads"),
            cancel_grace:  DEFAULT_CANCEL_GRACE,
            throttle_rate: DEFAULT_THROTTLE_RATE,
        }
    }
}

impl ServiceConfig {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn cancel_grace(mut self, cancel_grace: Duration) -> Self {
        self.cancel_grace = cancel_grace;
        self
    }

    #[must_use]
    pub fn throttle_rate(mut self, throttle_rate: u64) -> Self {
        self.throttle_rate = throttle_rate;
        self
    }
}

/// Input of a start-download call.
///
/// Both fields are optional at the type level so a missing URL surfaces as a
/// validation error rather than a decoding failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    #[serde(rename = "url", default)]
    pub source_url: Option<String>,

    #[serde(default)]
    pub file_name: Option<String>,
}

impl StartRequest {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: Some(source_url.into()),
            file_name:  None,
        }
    }

    #[must_use]
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}
