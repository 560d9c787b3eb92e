use serde::Serialize;

use crate::core::format_percentage;

/// Byte-level progress of a transfer.
///
/// Produced by [`crate::core::progress`]. `percentage` is `None` whenever the
/// total is unknown or zero; callers then report raw byte counts only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Bytes written to the local file so far.
    pub downloaded_size: u64,

    /// Total expected bytes, if the remote announced a Content-Length.
    pub total_size: Option<u64>,

    /// `downloaded_size / total_size * 100`, when computable.
    pub percentage: Option<f64>,
}

impl Progress {
    /// Returns `true` if the remote announced a length.
    #[must_use]
    pub fn total_known(&self) -> bool { self.total_size.is_some() }

    /// Percentage rendered for display, e.g. `"50.00%"`.
    #[must_use]
    pub fn display_percentage(&self) -> Option<String> { self.percentage.map(format_percentage) }
}

/// Answer to a progress query for a live job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub file_name:       String,
    pub total_size:      Option<u64>,
    pub downloaded_size: u64,
    pub percentage:      Option<String>,
}

impl ProgressReport {
    pub fn new(file_name: impl Into<String>, progress: Progress) -> Self {
        Self {
            file_name:       file_name.into(),
            total_size:      progress.total_size,
            downloaded_size: progress.downloaded_size,
            percentage:      progress.display_percentage(),
        }
    }
}
