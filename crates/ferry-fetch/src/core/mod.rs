//! Pure computations: progress ratios, pacing schedules and file naming.

mod naming;
mod pacing;
mod tracker;

pub use naming::{FALLBACK_FILE_NAME, resolve_file_name, staging_file_name};
pub use pacing::{pacing_delay, schedule};
pub use tracker::{format_percentage, progress};
