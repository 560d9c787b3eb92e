use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures_util::Stream;
use tokio::time::{Instant, Sleep};
use tracing::{debug, trace};

use crate::core::{pacing_delay, progress};

/// Byte stream adapter that holds chunks back until the configured rate
/// allows them.
///
/// Chunk `k` is released no earlier than `start + (bytes up to and including
/// chunk k) / rate`, where `start` is the first poll. A source slower than
/// the rate is never delayed further. Errors pass through unchanged.
pub struct ThrottledStream<S> {
    inner:            S,
    bytes_per_second: u64,
    total_size:       Option<u64>,
    started:          Option<Instant>,
    emitted:          u64,
    held:             Option<Bytes>,
    delay:            Option<Pin<Box<Sleep>>>,
    finished:         bool,
}

impl<S> ThrottledStream<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    /// Pace `inner` at `bytes_per_second`. A rate of zero is treated as one
    /// byte per second.
    pub fn new(inner: S, bytes_per_second: u64) -> Self {
        Self {
            inner,
            bytes_per_second: bytes_per_second.max(1),
            total_size: None,
            started: None,
            emitted: 0,
            held: None,
            delay: None,
            finished: false,
        }
    }

    /// Announce the full length so progress can be traced as a percentage.
    #[must_use]
    pub fn with_total_size(mut self, total_size: Option<u64>) -> Self {
        self.total_size = total_size;
        self
    }

    pub fn bytes_per_second(&self) -> u64 { self.bytes_per_second }

    /// Bytes pulled from the source so far, including a chunk still held back.
    pub fn emitted(&self) -> u64 { self.emitted }

    /// `true` once the source is exhausted.
    pub fn is_finished(&self) -> bool { self.finished }
}

impl<S> Stream for ThrottledStream<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(delay) = this.delay.as_mut() {
                ready!(delay.as_mut().poll(cx));
                this.delay = None;
                if let Some(chunk) = this.held.take() {
                    return Poll::Ready(Some(Ok(chunk)));
                }
            }

            if this.finished {
                return Poll::Ready(None);
            }

            let started = *this.started.get_or_insert_with(Instant::now);

            match ready!(Pin::new(&mut this.inner).poll_next(cx)) {
                Some(Ok(chunk)) => {
                    this.emitted += chunk.len() as u64;
                    if this.total_size.is_some() {
                        let percent = progress(this.emitted, this.total_size).display_percentage();
                        trace!(bytes = this.emitted, percent = ?percent, "throttled chunk");
                    }

                    match pacing_delay(this.emitted, this.bytes_per_second, started.elapsed()) {
                        Some(wait) => {
                            this.held = Some(chunk);
                            this.delay = Some(Box::pin(tokio::time::sleep(wait)));
                        }
                        None => return Poll::Ready(Some(Ok(chunk))),
                    }
                }
                Some(Err(e)) => return Poll::Ready(Some(Err(e))),
                None => {
                    this.finished = true;
                    debug!(
                        bytes = this.emitted,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "throttled stream finished"
                    );
                    return Poll::Ready(None);
                }
            }
        }
    }
}
