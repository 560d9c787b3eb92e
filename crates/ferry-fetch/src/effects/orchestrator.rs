use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ferry_fs::Removal;
use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, trace};

use crate::data::{DownloadJob, JobId, JobState};
use crate::effects::http::HttpClient;
use crate::effects::registry::DownloadRegistry;
use crate::error::{Error, Result};

/// How a job ended.
///
/// This is the asynchronous error channel of a download: the request that
/// started the job has long returned by the time it resolves.
#[derive(Debug)]
pub struct JobOutcome {
    pub id:              JobId,
    pub file_name:       String,
    /// Always terminal.
    pub state:           JobState,
    pub downloaded_size: u64,
    /// Completed: local path. Canceled: [`Error::Canceled`]. Failed: the cause.
    pub result:          Result<PathBuf>,
    /// Removal of the job's staging file, on the canceled and failed paths
    /// once it had been opened.
    pub cleanup:         Option<Removal>,
}

impl JobOutcome {
    pub fn is_completed(&self) -> bool { self.state == JobState::Completed }
}

/// Drives jobs from `Pending` to a terminal state.
///
/// Shared by every job of a service; each [`run`](Self::run) call owns one
/// job and runs on its own task.
pub struct DownloadOrchestrator<C: HttpClient> {
    client:       Arc<C>,
    registry:     Arc<DownloadRegistry>,
    cancel_grace: Duration,
}

impl<C: HttpClient> DownloadOrchestrator<C> {
    pub fn new(client: Arc<C>, registry: Arc<DownloadRegistry>, cancel_grace: Duration) -> Self {
        Self {
            client,
            registry,
            cancel_grace,
        }
    }

    /// Run `job` to completion.
    ///
    /// The job must already be registered. Whatever the outcome, its registry
    /// entry is removed as soon as the terminal state is decided, before any
    /// file cleanup starts.
    pub async fn run(&self, job: Arc<DownloadJob>) -> JobOutcome {
        info!(id = %job.id(), url = %job.source_url(), file = job.file_name(), "download started");

        let mut sink_opened = false;
        let result = self.transfer(&job, &mut sink_opened).await;
        let state = match &result {
            Ok(_) => JobState::Completed,
            Err(Error::Canceled) => JobState::Canceled,
            Err(e) => JobState::Failed(e.to_string()),
        };

        job.transition(state.clone());
        self.registry.remove(job.id());
        let downloaded_size = job.progress().downloaded_size;

        let cleanup = match &result {
            Ok(path) => {
                info!(id = %job.id(), path = %path.display(), bytes = downloaded_size, "download completed");
                None
            }
            Err(Error::Canceled) => {
                info!(id = %job.id(), bytes = downloaded_size, "download canceled");
                if sink_opened {
                    tokio::time::sleep(self.cancel_grace).await;
                    Some(discard(job.staging_path()).await)
                } else {
                    None
                }
            }
            Err(e) => {
                error!(id = %job.id(), url = %job.source_url(), error = %e, "download failed");
                if sink_opened { Some(discard(job.staging_path()).await) } else { None }
            }
        };

        JobOutcome {
            id: job.id(),
            file_name: job.file_name().to_string(),
            state,
            downloaded_size,
            result,
            cleanup,
        }
    }

    /// Copy the remote body into the job's staging file, then move it to the
    /// final path.
    ///
    /// `sink_opened` flips once the staging file exists. Only that file is
    /// ever discarded; the final path is touched by the rename alone.
    async fn transfer(&self, job: &DownloadJob, sink_opened: &mut bool) -> Result<PathBuf> {
        let cancel = job.cancellation();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Canceled),
            response = self.client.get(job.source_url()) => response.map_err(network)?,
        };

        let total = response.content_length;
        job.set_total_size(total);
        job.transition(JobState::Streaming);

        let mut file = File::create(job.staging_path()).await?;
        *sink_opened = true;
        let mut body = response.body;
        let mut received = 0u64;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Canceled),
                next = body.next() => next,
            };
            let Some(chunk) = next else { break };
            let chunk = chunk.map_err(network)?;

            let after = received + chunk.len() as u64;
            if let Some(expected) = total
                && after > expected
            {
                return Err(Error::Overrun { expected, received: after });
            }

            file.write_all(&chunk).await?;
            file.flush().await?;
            received = after;
            job.record_downloaded(received);

            let percent = job.progress().display_percentage();
            trace!(id = %job.id(), bytes = received, percent = ?percent, "chunk written");

            if total == Some(received) {
                break;
            }
        }

        if !job.seal() {
            return Err(Error::Canceled);
        }

        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(job.staging_path(), job.local_path()).await?;
        Ok(job.local_path().to_path_buf())
    }
}

fn network<E: std::error::Error>(e: E) -> Error { Error::Network(e.to_string()) }

async fn discard(path: &Path) -> Removal {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || ferry_fs::remove_file(path))
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "cleanup task panicked");
            Removal::skipped()
        })
}
