use url::Url;

use crate::data::JobId;

/// Name used when neither the caller nor the URL provides one.
pub const FALLBACK_FILE_NAME: &str = "download";

/// Pick the local file name for a download.
///
/// An explicit, non-blank `requested` name wins. Otherwise the last non-empty
/// path segment of `url` is used (query and fragment are ignored), falling
/// back to [`FALLBACK_FILE_NAME`]. The result is not validated here; storage
/// rejects names that are not a single path component.
///
/// # Examples
///
/// ```
/// use ferry_fetch::core::resolve_file_name;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/media/movie.mp4?token=abc").unwrap();
/// assert_eq!(resolve_file_name(&url, None), "movie.mp4");
/// assert_eq!(resolve_file_name(&url, Some("clip.mp4")), "clip.mp4");
/// ```
#[must_use]
pub fn resolve_file_name(url: &Url, requested: Option<&str>) -> String {
    if let Some(name) = requested.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .unwrap_or(FALLBACK_FILE_NAME)
        .to_string()
}

/// Name of the file a live job writes to before it is moved into place.
///
/// Unique per job, so concurrent or retried downloads of the same name never
/// share a partial file.
#[must_use]
pub fn staging_file_name(file_name: &str, id: JobId) -> String { format!("{file_name}.{id}.part") }
