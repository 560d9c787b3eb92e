//! I/O: the HTTP client seam, the live-job registry, the per-job
//! orchestrator, rate-limited serving and the service façade tying them
//! together.

mod http;
mod orchestrator;
mod registry;
mod service;
mod throttled;

pub use http::{BoxStream, HttpClient, RemoteBody};
pub use orchestrator::{DownloadOrchestrator, JobOutcome};
pub use registry::DownloadRegistry;
pub use service::{DownloadService, StartedDownload, StoredFile};
pub use throttled::ThrottledStream;

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
