use std::io;
use std::sync::Arc;

use bytes::Bytes;
use ferry_fs::{Removal, Storage};
use tokio::fs::File;
use tokio::task::JoinHandle;
use tokio_util::io::ReaderStream;
use tracing::debug;
use url::Url;

use crate::core::resolve_file_name;
use crate::data::{DownloadJob, JobId, ProgressReport, ServiceConfig, StartRequest};
use crate::effects::http::{BoxStream, HttpClient};
use crate::effects::orchestrator::{DownloadOrchestrator, JobOutcome};
use crate::effects::registry::DownloadRegistry;
use crate::effects::throttled::ThrottledStream;
use crate::error::{Error, Result};

/// Handle to a download that was accepted and is running in the background.
#[derive(Debug)]
pub struct StartedDownload {
    pub id:         JobId,
    pub file_name:  String,
    /// Resolves once the job is terminal. Dropping it does not stop the job.
    pub completion: JoinHandle<JobOutcome>,
}

/// A stored file opened for streaming.
pub struct StoredFile {
    pub file_name: String,
    pub len:       u64,
    pub body:      BoxStream<'static, io::Result<Bytes>>,
}

impl std::fmt::Debug for StoredFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredFile")
            .field("file_name", &self.file_name)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Entry point for everything a front end can ask of the download subsystem.
///
/// Owns the registry, the orchestrator and the storage directory. Must be
/// used from within a tokio runtime.
pub struct DownloadService<C: HttpClient> {
    registry:     Arc<DownloadRegistry>,
    orchestrator: Arc<DownloadOrchestrator<C>>,
    storage:      Storage,
    config:       ServiceConfig,
}

impl<C: HttpClient> DownloadService<C> {
    /// Build a service around `client`, creating the storage directory if needed.
    pub fn new(client: C, config: ServiceConfig) -> Result<Self> {
        let storage = Storage::new(&config.storage_dir)?;
        let registry = Arc::new(DownloadRegistry::new());
        let orchestrator = Arc::new(DownloadOrchestrator::new(
            Arc::new(client),
            Arc::clone(&registry),
            config.cancel_grace,
        ));

        Ok(Self {
            registry,
            orchestrator,
            storage,
            config,
        })
    }

    /// Accept a download and start it in the background.
    ///
    /// Returns as soon as the job is registered; transfer failures surface
    /// through [`StartedDownload::completion`] only.
    pub fn start(&self, request: StartRequest) -> Result<StartedDownload> {
        let source_url = request
            .source_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::Validation("URL is required".to_string()))?;

        let url = Url::parse(source_url).map_err(|e| Error::Validation(format!("invalid URL {source_url:?}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Validation(format!("unsupported URL scheme {:?}", url.scheme())));
        }

        let file_name = resolve_file_name(&url, request.file_name.as_deref());
        let local_path = self.storage.path_for(&file_name)?;

        let job = Arc::new(DownloadJob::new(JobId::new(), url, file_name.clone(), local_path));
        let id = self.registry.create(Arc::clone(&job))?;

        let orchestrator = Arc::clone(&self.orchestrator);
        let completion = tokio::spawn(async move { orchestrator.run(job).await });

        Ok(StartedDownload {
            id,
            file_name,
            completion,
        })
    }

    /// Snapshot of a live job.
    pub fn progress(&self, id: JobId) -> Result<ProgressReport> {
        let job = self.registry.get(id)?;
        Ok(ProgressReport::new(job.file_name(), job.progress()))
    }

    /// Ask a live job to stop.
    ///
    /// Jobs that already finished are no longer live and yield
    /// [`Error::NotFound`].
    pub fn cancel(&self, id: JobId) -> Result<()> {
        if self.registry.request_cancel(id) { Ok(()) } else { Err(Error::NotFound(id)) }
    }

    /// Open a stored file for streaming at full speed.
    pub async fn open_stored(&self, name: &str) -> Result<StoredFile> {
        let (file, len) = self.open(name).await?;
        Ok(StoredFile {
            file_name: name.to_string(),
            len,
            body: Box::pin(ReaderStream::new(file)),
        })
    }

    /// Open a stored file for streaming paced at `bytes_per_second`, or at the
    /// configured rate when `None`.
    pub async fn open_stored_throttled(&self, name: &str, bytes_per_second: Option<u64>) -> Result<StoredFile> {
        let rate = bytes_per_second.unwrap_or(self.config.throttle_rate);
        if rate == 0 {
            return Err(Error::Validation("throttle rate must be positive".to_string()));
        }

        let (file, len) = self.open(name).await?;
        debug!(file = name, len, rate, "serving throttled");
        let body = ThrottledStream::new(ReaderStream::new(file), rate).with_total_size(Some(len));

        Ok(StoredFile {
            file_name: name.to_string(),
            len,
            body: Box::pin(body),
        })
    }

    /// Best-effort deletion of a stored file. Never fails.
    pub async fn delete_stored(&self, name: &str) -> Removal {
        let storage = self.storage.clone();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || storage.remove(&name))
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "delete task panicked");
                Removal::skipped()
            })
    }

    pub fn registry(&self) -> &DownloadRegistry { &self.registry }

    pub fn config(&self) -> &ServiceConfig { &self.config }

    async fn open(&self, name: &str) -> Result<(File, u64)> {
        let storage = self.storage.clone();
        let owned = name.to_string();
        let opened = tokio::task::spawn_blocking(move || storage.open(&owned))
            .await
            .map_err(|e| Error::Io(io::Error::other(e)))?;

        match opened {
            Ok((file, len)) => Ok((File::from_std(file), len)),
            Err(ferry_fs::Error::NotFound(_)) => Err(Error::FileNotFound(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

impl<C: HttpClient> std::fmt::Debug for DownloadService<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadService")
            .field("registry", &self.registry)
            .field("storage", &self.storage)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
