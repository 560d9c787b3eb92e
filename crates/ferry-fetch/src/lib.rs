//! Background HTTP downloads with live progress, cancellation and
//! rate-limited re-serving of the stored files.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Identifiers, job lifecycle, progress snapshots and configuration
//! - [`core`] - Pure transformations: percentages, pacing schedules, file naming
//! - `effects` - I/O behind the [`HttpClient`] seam
//!
//! # Key Features
//!
//! - **Fire-and-forget**: [`DownloadService::start`] returns an id at once; the
//!   transfer runs on its own task and reports through a [`JobOutcome`]
//! - **Live-only registry**: a job can be queried or canceled until it reaches
//!   a terminal state, then it is gone
//! - **Backpressure**: each chunk is written before the next one is pulled
//! - **Paced serving**: [`ThrottledStream`] never runs ahead of its byte rate

pub mod core;
pub mod data;
mod effects;
mod error;

pub use data::{
    DEFAULT_CANCEL_GRACE, DEFAULT_THROTTLE_RATE, DownloadJob, JobId, JobState, Progress, ProgressReport,
    ServiceConfig, StartRequest,
};
pub use effects::{
    BoxStream, DownloadOrchestrator, DownloadRegistry, DownloadService, HttpClient, JobOutcome, RemoteBody,
    StartedDownload, StoredFile, ThrottledStream,
};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use error::{Error, Result};
