//! Pipeline statistics.
//!
//! Lock-free counters shared by both tasks and read by the log drain.
//! All updates are `Relaxed`: the counters are diagnostics and order
//! nothing else.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::logging::LogStream;

/// Counters for the ingest → process pipeline.
///
/// # Usage
///
/// ```ignore
/// static STATS: PipelineStats = PipelineStats::new();
///
/// // In ingest task:
/// STATS.record_commit(tx.pending_frames());
///
/// // In log drain:
/// let snap = STATS.snapshot();
/// ```
pub struct PipelineStats {
    /// Frames accepted by the ring.
    frames_committed: AtomicU32,

    /// Frames filtered and emitted.
    frames_consumed: AtomicU32,

    /// Commits rejected after exhausting the retry policy.
    backpressure: AtomicU32,

    /// Transport reads whose size was not a whole number of frames.
    unexpected_bursts: AtomicU32,

    /// Highest ready-frame count observed after a commit.
    peak_pending: AtomicU32,
}

impl PipelineStats {
    pub const fn new() -> Self {
        Self {
            frames_committed: AtomicU32::new(0),
            frames_consumed: AtomicU32::new(0),
            backpressure: AtomicU32::new(0),
            unexpected_bursts: AtomicU32::new(0),
            peak_pending: AtomicU32::new(0),
        }
    }

    /// Count a commit and the ready-frame depth right after it.
    #[inline]
    pub fn record_commit(&self, pending: u32) {
        self.frames_committed.fetch_add(1, Ordering::Relaxed);
        self.peak_pending.fetch_max(pending, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_consume(&self) {
        self.frames_consumed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_backpressure(&self) {
        self.backpressure.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_unexpected_burst(&self) {
        self.unexpected_bursts.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters.
    #[inline]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_committed: self.frames_committed.load(Ordering::Relaxed),
            frames_consumed: self.frames_consumed.load(Ordering::Relaxed),
            backpressure: self.backpressure.load(Ordering::Relaxed),
            unexpected_bursts: self.unexpected_bursts.load(Ordering::Relaxed),
            peak_pending: self.peak_pending.load(Ordering::Relaxed),
        }
    }
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of pipeline counters at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub frames_committed: u32,
    pub frames_consumed: u32,
    pub backpressure: u32,
    pub unexpected_bursts: u32,
    pub peak_pending: u32,
}

impl StatsSnapshot {
    /// Frames committed but not yet emitted at snapshot time.
    pub fn in_flight(&self) -> u32 {
        self.frames_committed.saturating_sub(self.frames_consumed)
    }
}

impl core::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "committed={} consumed={} backpressure={} odd_bursts={} peak_pending={}",
            self.frames_committed,
            self.frames_consumed,
            self.backpressure,
            self.unexpected_bursts,
            self.peak_pending
        )
    }
}

/// Everything a task needs to report on itself: counters, its log stream
/// and a microsecond clock for log timestamps.
#[derive(Clone, Copy)]
pub struct Telemetry<'a> {
    pub stats: &'a PipelineStats,
    pub log: &'a LogStream,
    clock: fn() -> i64,
}

impl<'a> Telemetry<'a> {
    pub fn new(stats: &'a PipelineStats, log: &'a LogStream, clock: fn() -> i64) -> Self {
        Self { stats, log, clock }
    }

    /// Current timestamp in microseconds.
    #[inline]
    pub fn now_us(&self) -> i64 {
        (self.clock)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::TaskId;

    #[test]
    fn test_counters_accumulate() {
        let stats = PipelineStats::new();

        stats.record_commit(1);
        stats.record_commit(4);
        stats.record_commit(2);
        stats.record_consume();
        stats.record_backpressure();
        stats.record_unexpected_burst();
        stats.record_unexpected_burst();

        let snap = stats.snapshot();
        assert_eq!(snap.frames_committed, 3);
        assert_eq!(snap.frames_consumed, 1);
        assert_eq!(snap.backpressure, 1);
        assert_eq!(snap.unexpected_bursts, 2);
        assert_eq!(snap.peak_pending, 4);
        assert_eq!(snap.in_flight(), 2);
    }

    #[test]
    fn test_telemetry_clock() {
        fn fixed() -> i64 {
            42
        }

        let stats = PipelineStats::new();
        let log: LogStream = LogStream::new(TaskId::System);
        let telemetry = Telemetry::new(&stats, &log, fixed);
        assert_eq!(telemetry.now_us(), 42);
    }
}
