use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use super::progress::Progress;
use crate::core::{progress, staging_file_name};

/// Opaque identifier of a download job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self { Self(Uuid::new_v4()) }
}

impl Default for JobId {
    fn default() -> Self { Self::new() }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Uuid::parse_str(s.trim()).map(Self) }
}

/// Lifecycle of a download job.
///
/// `Pending → Streaming → {Completed, Canceled, Failed}`. The last three are
/// terminal: once reached, no further transition is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobState {
    /// Registered, waiting for the remote response headers.
    #[default]
    Pending,

    /// Response received, bytes are being copied to the local file.
    Streaming,

    /// Remote stream exhausted and the local file flushed.
    Completed,

    /// Stopped on request.
    Canceled,

    /// Stopped by a remote or local I/O error.
    Failed(String),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Canceled | JobState::Failed(_))
    }

    fn accepts(&self, next: &JobState) -> bool {
        match (self, next) {
            (JobState::Pending, JobState::Streaming) => true,
            (JobState::Pending | JobState::Streaming, next) => next.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Pending => write!(f, "Pending"),
            JobState::Streaming => write!(f, "Streaming"),
            JobState::Completed => write!(f, "Completed"),
            JobState::Canceled => write!(f, "Canceled"),
            JobState::Failed(reason) => write!(f, "Failed: {reason}"),
        }
    }
}

#[derive(Debug, Default)]
struct JobInner {
    state:           JobState,
    total_size:      Option<u64>,
    downloaded_size: u64,
    /// Set once the whole body is on disk; cancellation is refused from here on.
    sealed:          bool,
}

/// One tracked fetch-to-disk transfer.
///
/// Identity fields are immutable. Mutable fields sit behind a lock owned by
/// this job alone, so unrelated downloads never contend.
///
/// Bytes land in a staging file private to the job and only reach
/// `local_path` once the job completes.
#[derive(Debug)]
pub struct DownloadJob {
    id:           JobId,
    source_url:   Url,
    file_name:    String,
    local_path:   PathBuf,
    staging_path: PathBuf,
    cancel:       CancellationToken,
    inner:        Mutex<JobInner>,
}

impl DownloadJob {
    pub fn new(id: JobId, source_url: Url, file_name: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        let file_name = file_name.into();
        let local_path = local_path.into();
        let staging_path = local_path.with_file_name(staging_file_name(&file_name, id));

        Self {
            id,
            source_url,
            file_name,
            local_path,
            staging_path,
            cancel: CancellationToken::new(),
            inner: Mutex::new(JobInner::default()),
        }
    }

    pub fn id(&self) -> JobId { self.id }

    pub fn source_url(&self) -> &Url { &self.source_url }

    pub fn file_name(&self) -> &str { &self.file_name }

    pub fn local_path(&self) -> &Path { &self.local_path }

    /// Where the body is written while the job is live.
    pub fn staging_path(&self) -> &Path { &self.staging_path }

    pub fn state(&self) -> JobState { self.inner.lock().state.clone() }

    /// Token observed by the transfer at every suspension point.
    pub fn cancellation(&self) -> CancellationToken { self.cancel.clone() }

    /// Snapshot of the byte counters.
    pub fn progress(&self) -> Progress {
        let inner = self.inner.lock();
        progress(inner.downloaded_size, inner.total_size)
    }

    /// Ask the transfer to stop.
    ///
    /// Returns `false` without touching the token once the job is sealed or
    /// terminal.
    pub fn request_cancel(&self) -> bool {
        let inner = self.inner.lock();
        if inner.sealed || inner.state.is_terminal() {
            return false;
        }
        self.cancel.cancel();
        true
    }

    /// Commit to completing: after this, [`request_cancel`](Self::request_cancel)
    /// reports `false`.
    ///
    /// Returns `false` if a cancellation was already accepted; that request
    /// then wins.
    pub(crate) fn seal(&self) -> bool {
        let mut inner = self.inner.lock();
        if self.cancel.is_cancelled() || inner.state.is_terminal() {
            return false;
        }
        inner.sealed = true;
        true
    }

    /// Move to `next` if the lifecycle allows it.
    pub fn transition(&self, next: JobState) -> bool {
        let mut inner = self.inner.lock();
        if !inner.state.accepts(&next) {
            return false;
        }
        inner.state = next;
        true
    }

    pub(crate) fn set_total_size(&self, total_size: Option<u64>) {
        self.inner.lock().total_size = total_size;
    }

    /// Record the byte count of the last completed write.
    pub(crate) fn record_downloaded(&self, downloaded_size: u64) {
        let mut inner = self.inner.lock();
        inner.downloaded_size = inner.downloaded_size.max(downloaded_size);
    }
}
