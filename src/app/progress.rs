//! Download progress observation
//!
//! The downloader feeds every received chunk into a `ProgressTracker`, which
//! decides when the registered callback may fire. The gate is purely
//! time-based: at most one update per interval, each carrying the cumulative
//! byte count and the throughput since the previous update.

use std::fmt;
use std::time::{Duration, Instant};

use crate::constants::progress::UPDATE_INTERVAL;

/// A snapshot handed to the progress callback
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Bytes written so far
    pub bytes_downloaded: u64,
    /// Expected size, when the server announced one
    pub total_bytes: Option<u64>,
    /// `None` when the total is unknown
    pub percentage: Option<f64>,
    /// Bytes since the previous update divided by the time since it
    pub bytes_per_second: f64,
}

/// Callback invoked with progress snapshots
pub type ProgressCallback = Box<dyn Fn(&ProgressUpdate) + Send + Sync>;

/// Rate-limited progress bookkeeping for one transfer
pub struct ProgressTracker {
    total_bytes: Option<u64>,
    bytes_downloaded: u64,
    interval: Duration,
    last_emit: Instant,
    bytes_at_last_emit: u64,
}

impl ProgressTracker {
    /// Start tracking a transfer of `total_bytes` (if known) at `now`
    pub fn new(total_bytes: Option<u64>, now: Instant) -> Self {
        Self::with_interval(total_bytes, UPDATE_INTERVAL, now)
    }

    /// Start tracking with a custom gate interval
    pub fn with_interval(total_bytes: Option<u64>, interval: Duration, now: Instant) -> Self {
        Self {
            // a zero length carries no percentage information
            total_bytes: total_bytes.filter(|&t| t > 0),
            bytes_downloaded: 0,
            interval,
            last_emit: now,
            bytes_at_last_emit: 0,
        }
    }

    /// Record `bytes` more bytes received at `now`
    ///
    /// Returns an update when at least one interval has passed since the
    /// previous one.
    pub fn record(&mut self, bytes: u64, now: Instant) -> Option<ProgressUpdate> {
        self.bytes_downloaded += bytes;

        if now.saturating_duration_since(self.last_emit) >= self.interval {
            Some(self.emit(now))
        } else {
            None
        }
    }

    /// Final update once the body is complete
    ///
    /// Returns `None` when everything was already reported.
    pub fn finish(&mut self, now: Instant) -> Option<ProgressUpdate> {
        if self.bytes_downloaded > self.bytes_at_last_emit {
            Some(self.emit(now))
        } else {
            None
        }
    }

    /// Cumulative bytes recorded
    pub fn bytes_downloaded(&self) -> u64 {
        self.bytes_downloaded
    }

    fn emit(&mut self, now: Instant) -> ProgressUpdate {
        let elapsed = now.saturating_duration_since(self.last_emit).as_secs_f64();
        let delta = self.bytes_downloaded - self.bytes_at_last_emit;
        let bytes_per_second = if elapsed > 0.0 {
            delta as f64 / elapsed
        } else {
            0.0
        };

        self.last_emit = now;
        self.bytes_at_last_emit = self.bytes_downloaded;

        ProgressUpdate {
            bytes_downloaded: self.bytes_downloaded,
            total_bytes: self.total_bytes,
            percentage: self
                .total_bytes
                .map(|total| self.bytes_downloaded as f64 / total as f64 * 100.0),
            bytes_per_second,
        }
    }
}

impl fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("total_bytes", &self.total_bytes)
            .field("bytes_downloaded", &self.bytes_downloaded)
            .field("interval", &self.interval)
            .finish()
    }
}
