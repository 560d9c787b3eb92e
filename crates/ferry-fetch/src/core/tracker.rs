use crate::data::Progress;

/// Compute progress from raw byte counters.
///
/// The percentage is `None` when `total` is unknown or zero, so no NaN or
/// infinity can ever leak out of here.
///
/// # Examples
///
/// ```
/// use ferry_fetch::core::progress;
///
/// assert_eq!(progress(250, Some(1000)).percentage, Some(25.0));
/// assert_eq!(progress(250, None).percentage, None);
/// assert_eq!(progress(0, Some(0)).percentage, None);
/// ```
#[must_use]
pub fn progress(downloaded: u64, total: Option<u64>) -> Progress {
    let percentage = total
        .filter(|&t| t > 0)
        .map(|t| downloaded as f64 / t as f64 * 100.0);

    Progress {
        downloaded_size: downloaded,
        total_size: total,
        percentage,
    }
}

/// Render a percentage with two decimals and a percent sign.
///
/// Display only; accounting always uses integer byte counts.
///
/// # Examples
///
/// ```
/// use ferry_fetch::core::format_percentage;
///
/// assert_eq!(format_percentage(50.0), "50.00%");
/// assert_eq!(format_percentage(100.0 / 3.0), "33.33%");
/// ```
#[must_use]
pub fn format_percentage(percentage: f64) -> String { format!("{percentage:.2}%") }
