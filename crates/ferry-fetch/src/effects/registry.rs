use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::data::{DownloadJob, JobId};
use crate::error::{Error, Result};

/// Authority over the live download jobs.
///
/// Holds live jobs only: an entry is removed the moment its job reaches a
/// terminal state. The map lock is held for a single lookup or update and
/// never across an await point.
#[derive(Debug, Default)]
pub struct DownloadRegistry {
    jobs: Mutex<HashMap<JobId, Arc<DownloadJob>>>,
}

impl DownloadRegistry {
    pub fn new() -> Self { Self::default() }

    /// Register a job under its own id.
    ///
    /// Fails with [`Error::Conflict`] if the id is already live.
    pub fn create(&self, job: Arc<DownloadJob>) -> Result<JobId> {
        let id = job.id();
        let mut jobs = self.jobs.lock();
        if jobs.contains_key(&id) {
            return Err(Error::Conflict(id));
        }
        jobs.insert(id, job);
        Ok(id)
    }

    pub fn get(&self, id: JobId) -> Result<Arc<DownloadJob>> {
        self.jobs.lock().get(&id).cloned().ok_or(Error::NotFound(id))
    }

    /// Drop the entry for `id`. Returns `true` if it existed.
    pub fn remove(&self, id: JobId) -> bool { self.jobs.lock().remove(&id).is_some() }

    /// Signal cancellation to a live job.
    ///
    /// Returns `false` if `id` is unknown or its job already reached a
    /// terminal state.
    pub fn request_cancel(&self, id: JobId) -> bool {
        let jobs = self.jobs.lock();
        jobs.get(&id).is_some_and(|job| job.request_cancel())
    }

    pub fn len(&self) -> usize { self.jobs.lock().len() }

    pub fn is_empty(&self) -> bool { self.jobs.lock().is_empty() }
}
