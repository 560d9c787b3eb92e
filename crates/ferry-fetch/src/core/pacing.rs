use std::time::Duration;

/// Earliest offset from the start of a paced transfer at which `emitted`
/// bytes may have left, given `bytes_per_second`.
///
/// Rounded up to the nanosecond so the schedule never runs ahead of the rate.
/// A rate of zero is treated as one byte per second.
#[must_use]
pub fn schedule(emitted: u64, bytes_per_second: u64) -> Duration {
    let rate = u128::from(bytes_per_second.max(1));
    let nanos = (u128::from(emitted) * 1_000_000_000).div_ceil(rate);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// How long to hold back a chunk so that `emitted` bytes (the chunk
/// included) do not leave before their scheduled time.
///
/// Returns `None` when the transfer is on or behind schedule.
///
/// # Examples
///
/// ```
/// use ferry_fetch::core::pacing_delay;
/// use std::time::Duration;
///
/// // 100 bytes at 100 B/s are due at 1s; 400ms have passed.
/// assert_eq!(
///     pacing_delay(100, 100, Duration::from_millis(400)),
///     Some(Duration::from_millis(600))
/// );
/// assert_eq!(pacing_delay(100, 100, Duration::from_secs(2)), None);
/// ```
#[must_use]
pub fn pacing_delay(emitted: u64, bytes_per_second: u64, elapsed: Duration) -> Option<Duration> {
    let expected = schedule(emitted, bytes_per_second);
    (elapsed < expected).then(|| expected - elapsed)
}
