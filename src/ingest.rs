//! Ingest task: transport bytes → whole frames → ring.
//!
//! # State Machine
//!
//! ```text
//!            bytes arrive            staging full
//!   Idle ─────────────────▶ Accumulating ─────────▶ Committing
//!    ▲                          ▲                       │
//!    │        committed         │     rejected (held)   │
//!    └──────────────────────────┴───────────────────────┘
//! ```
//!
//! Bytes are copied into a one-frame staging buffer. A full staging
//! buffer is committed under a [`RetryPolicy`]. When every attempt fails
//! the frame stays staged, [`Ingest::feed`] stops consuming input and
//! reports the rejection. Nothing is dropped. The caller offers the
//! remaining bytes again later.

use embedded_hal::delay::DelayNs;
use embedded_io::Read;

use crate::config::{BURST_LEN, COMMIT_RETRY_DELAY_MS, MAX_COMMIT_ATTEMPTS, RING_CAPACITY};
use crate::frame::FRAME_BYTES;
use crate::ring::RingProducer;
use crate::stats::Telemetry;
use crate::{rt_debug, rt_warn};

/// Producer state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestState {
    /// Staging buffer empty.
    Idle,
    /// Partial frame staged.
    Accumulating,
    /// Full frame staged, commit in progress or held after rejection.
    Committing,
}

/// Result of committing the staged frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// Ring stayed full for every attempt. The frame is still staged.
    Rejected,
}

/// Bounded commit retry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Commit attempts per call (at least one is always made).
    pub max_attempts: u32,
    /// Delay between attempts.
    pub delay_ms: u32,
}

impl RetryPolicy {
    pub const DEFAULT: Self = Self {
        max_attempts: MAX_COMMIT_ATTEMPTS,
        delay_ms: COMMIT_RETRY_DELAY_MS,
    };
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// What one [`Ingest::feed`] call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeedReport {
    /// Input bytes taken into the staging buffer.
    pub consumed: usize,
    /// Frames committed to the ring.
    pub committed: u32,
    /// Outcome of the last commit attempted, `None` if no frame filled up.
    pub outcome: Option<CommitOutcome>,
}

impl FeedReport {
    /// The call stopped early on a rejected commit.
    #[inline]
    pub fn is_rejected(&self) -> bool {
        self.outcome == Some(CommitOutcome::Rejected)
    }
}

/// Producer side of the pipeline.
pub struct Ingest<'a, const CAP: usize = RING_CAPACITY> {
    tx: RingProducer<'a, CAP>,
    policy: RetryPolicy,
    telemetry: Telemetry<'a>,
    staging: [u8; FRAME_BYTES],
    staged: usize,
    state: IngestState,
}

impl<'a, const CAP: usize> Ingest<'a, CAP> {
    pub fn new(tx: RingProducer<'a, CAP>, policy: RetryPolicy, telemetry: Telemetry<'a>) -> Self {
        Self {
            tx,
            policy,
            telemetry,
            staging: [0; FRAME_BYTES],
            staged: 0,
            state: IngestState::Idle,
        }
    }

    #[inline]
    pub fn state(&self) -> IngestState {
        self.state
    }

    /// Bytes of the current partial (or held) frame.
    #[inline]
    pub fn staged_bytes(&self) -> usize {
        self.staged
    }

    /// Stage `bytes`, committing every frame that fills up.
    ///
    /// A frame held from an earlier rejection is committed first, so
    /// `feed(&[], ..)` retries it. Stops at the first rejected commit,
    /// leaving the rest of `bytes` unconsumed.
    pub fn feed<D: DelayNs>(&mut self, bytes: &[u8], delay: &mut D) -> FeedReport {
        let mut report = FeedReport {
            consumed: 0,
            committed: 0,
            outcome: None,
        };

        while self.staged == FRAME_BYTES || report.consumed < bytes.len() {
            if self.staged == FRAME_BYTES {
                let outcome = self.commit_staged(delay);
                report.outcome = Some(outcome);
                match outcome {
                    CommitOutcome::Committed => report.committed += 1,
                    CommitOutcome::Rejected => return report,
                }
                continue;
            }

            let rest = &bytes[report.consumed..];
            let n = rest.len().min(FRAME_BYTES - self.staged);
            self.staging[self.staged..self.staged + n].copy_from_slice(&rest[..n]);
            self.staged += n;
            report.consumed += n;
            self.state = IngestState::Accumulating;
        }

        if self.staged == 0 {
            self.state = IngestState::Idle;
        }
        report
    }

    /// Commit the full staging buffer under the retry policy.
    pub fn commit_staged<D: DelayNs>(&mut self, delay: &mut D) -> CommitOutcome {
        debug_assert_eq!(self.staged, FRAME_BYTES);
        self.state = IngestState::Committing;

        let attempts = self.policy.max_attempts.max(1);
        for attempt in 1..=attempts {
            if self.tx.try_commit(&self.staging) {
                self.staged = 0;
                self.state = IngestState::Idle;
                self.telemetry.stats.record_commit(self.tx.pending_frames());
                return CommitOutcome::Committed;
            }
            if attempt < attempts {
                delay.delay_ms(self.policy.delay_ms);
            }
        }

        self.telemetry.stats.record_backpressure();
        rt_warn!(
            self.telemetry.log,
            self.telemetry.now_us(),
            "ring full after {} attempts, frame held ({} bytes free)",
            attempts,
            self.tx.free()
        );
        CommitOutcome::Rejected
    }

    /// Task loop: read bursts from `source` until it reports end of stream.
    ///
    /// A rejected commit is retried until it succeeds (block-and-retry),
    /// so no input is lost. Transport errors end the loop.
    pub fn run<R: Read, D: DelayNs>(&mut self, source: &mut R, delay: &mut D) -> Result<(), R::Error> {
        let mut burst = [0u8; BURST_LEN];

        loop {
            let n = source.read(&mut burst)?;
            if n == 0 {
                return Ok(());
            }

            if n % FRAME_BYTES != 0 {
                self.telemetry.stats.record_unexpected_burst();
                rt_debug!(
                    self.telemetry.log,
                    self.telemetry.now_us(),
                    "burst of {} bytes, {} staged",
                    n,
                    self.staged
                );
            }

            let mut offset = 0;
            loop {
                let report = self.feed(&burst[offset..n], delay);
                offset += report.consumed;
                if !report.is_rejected() {
                    break;
                }
            }
        }
    }
}
