//! Data types for download orchestration.
//!
//! Identifiers, job lifecycle, progress snapshots and configuration. The
//! only interior mutability lives in [`DownloadJob`], scoped to one job.

pub mod job;
pub mod options;
pub mod progress;

pub use job::{DownloadJob, JobId, JobState};
pub use options::{DEFAULT_CANCEL_GRACE, DEFAULT_THROTTLE_RATE, ServiceConfig, StartRequest};
pub use progress::{Progress, ProgressReport};
