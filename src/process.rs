//! Process task: ring → filter → framed output.
//!
//! # State Machine
//!
//! ```text
//!   Waiting ──frame ready──▶ Processing ──filtered──▶ Emitting
//!      ▲                                                 │
//!      └────────────────────── written ──────────────────┘
//! ```
//!
//! The task suspends (through `DelayNs`) only while no frame is ready.
//! Filtering is a pure function of the frame; emission blocks on the sink.

use core::convert::Infallible;
use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::delay::DelayNs;
use embedded_io::Write;

use crate::config::{CONSUMER_POLL_DELAY_MS, RING_CAPACITY};
use crate::dsp::FrameFilter;
use crate::frame::Frame;
use crate::ring::RingConsumer;
use crate::rt_debug;
use crate::stats::Telemetry;
use crate::wire::{encode_frame, WIRE_FRAME_BYTES};

/// Consumer state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessState {
    /// No frame in hand.
    Waiting,
    /// Running the filter.
    Processing,
    /// Writing the framed result.
    Emitting,
}

/// Consumer side of the pipeline.
pub struct Process<'a, const CAP: usize = RING_CAPACITY> {
    rx: RingConsumer<'a, CAP>,
    filter: FrameFilter,
    telemetry: Telemetry<'a>,
    poll_delay_ms: u32,
    state: ProcessState,
}

impl<'a, const CAP: usize> Process<'a, CAP> {
    pub fn new(rx: RingConsumer<'a, CAP>, filter: FrameFilter, telemetry: Telemetry<'a>) -> Self {
        Self {
            rx,
            filter,
            telemetry,
            poll_delay_ms: CONSUMER_POLL_DELAY_MS,
            state: ProcessState::Waiting,
        }
    }

    /// Use a different poll interval while waiting for frames.
    pub fn with_poll_delay_ms(mut self, ms: u32) -> Self {
        self.poll_delay_ms = ms;
        self
    }

    #[inline]
    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Handle one frame if one is ready. Never waits.
    ///
    /// Returns `Ok(true)` when a frame was emitted.
    pub fn poll<W: Write>(&mut self, sink: &mut W) -> Result<bool, W::Error> {
        match self.rx.try_consume_frame() {
            Some(frame) => {
                self.emit(&frame, sink)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Wait for one frame, then filter and emit it.
    pub fn step<W: Write, D: DelayNs>(&mut self, sink: &mut W, delay: &mut D) -> Result<(), W::Error> {
        let frame = self.rx.consume_frame(delay, self.poll_delay_ms);
        self.emit(&frame, sink)
    }

    /// Task loop for the firmware: runs until the sink fails.
    pub fn run<W: Write, D: DelayNs>(&mut self, sink: &mut W, delay: &mut D) -> Result<Infallible, W::Error> {
        loop {
            self.step(sink, delay)?;
        }
    }

    /// Task loop with shutdown: returns once `stop` is set and every
    /// committed frame has been emitted. Flushes the sink on exit.
    ///
    /// Returns the number of frames emitted.
    pub fn run_until<W: Write, D: DelayNs>(
        &mut self,
        sink: &mut W,
        delay: &mut D,
        stop: &AtomicBool,
    ) -> Result<u32, W::Error> {
        let mut emitted = 0u32;

        loop {
            if self.poll(sink)? {
                emitted += 1;
                continue;
            }

            // stop is set after the producer's last commit, so once it is
            // seen an empty ring stays empty
            if stop.load(Ordering::Acquire) && self.rx.pending_frames() == 0 {
                break;
            }

            delay.delay_ms(self.poll_delay_ms);
        }

        sink.flush()?;
        Ok(emitted)
    }

    fn emit<W: Write>(&mut self, frame: &Frame, sink: &mut W) -> Result<(), W::Error> {
        self.state = ProcessState::Processing;
        let filtered = self.filter.filter_frame(frame);

        self.state = ProcessState::Emitting;
        let mut wire = [0u8; WIRE_FRAME_BYTES];
        encode_frame(&filtered, &mut wire);
        let written = sink.write_all(&wire);

        self.state = ProcessState::Waiting;
        written?;

        self.telemetry.stats.record_consume();
        rt_debug!(
            self.telemetry.log,
            self.telemetry.now_us(),
            "frame peak {} -> {}, {} pending",
            frame.peak(),
            filtered.peak(),
            self.rx.pending_frames()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;
    use crate::frame::{FRAME_BYTES, FRAME_LEN};
    use crate::logging::{LogStream, TaskId};
    use crate::ring::FrameRing;
    use crate::stats::PipelineStats;
    use crate::wire::{END_DELIMITER, START_DELIMITER};

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn zero_clock() -> i64 {
        0
    }

    #[test]
    fn test_poll_empty_ring() {
        let ring = FrameRing::<1024>::new();
        let (_tx, rx) = ring.split().unwrap();
        let stats = PipelineStats::new();
        let log: LogStream = LogStream::new(TaskId::Process);
        let filter = FrameFilter::new(&FilterConfig::DEFAULT).unwrap();
        let mut process = Process::new(rx, filter, Telemetry::new(&stats, &log, zero_clock));

        let mut sink: Vec<u8> = Vec::new();
        assert!(!process.poll(&mut sink).unwrap());
        assert!(sink.is_empty());
        assert_eq!(process.state(), ProcessState::Waiting);
    }

    #[test]
    fn test_poll_emits_one_framed_frame() {
        let ring = FrameRing::<2048>::new();
        let (mut tx, rx) = ring.split().unwrap();
        let stats = PipelineStats::new();
        let log: LogStream = LogStream::new(TaskId::Process);
        let filter = FrameFilter::new(&FilterConfig::DEFAULT).unwrap();
        let mut process = Process::new(rx, filter, Telemetry::new(&stats, &log, zero_clock));

        assert!(tx.try_commit(&[0u8; FRAME_BYTES]));
        let mut sink: Vec<u8> = Vec::new();
        assert!(process.poll(&mut sink).unwrap());

        assert_eq!(sink.len(), WIRE_FRAME_BYTES);
        assert_eq!(sink[0], START_DELIMITER);
        assert_eq!(sink[WIRE_FRAME_BYTES - 1], END_DELIMITER);
        assert!(sink[1..=FRAME_BYTES].iter().all(|&b| b == 0));
        assert_eq!(stats.snapshot().frames_consumed, 1);
        assert_eq!(ring.pending_frames(), 0);
    }

    #[test]
    fn test_run_until_drains_before_stopping() {
        let ring = FrameRing::<4096>::new();
        let (mut tx, rx) = ring.split().unwrap();
        let stats = PipelineStats::new();
        let log: LogStream = LogStream::new(TaskId::Process);
        let filter = FrameFilter::new(&FilterConfig::DEFAULT).unwrap();
        let mut process = Process::new(rx, filter, Telemetry::new(&stats, &log, zero_clock));

        let dc = Frame::from_samples([500; FRAME_LEN]).to_le_bytes();
        for _ in 0..5 {
            assert!(tx.try_commit(&dc));
        }

        let stop = AtomicBool::new(true);
        let mut sink: Vec<u8> = Vec::new();
        let emitted = process.run_until(&mut sink, &mut NoDelay, &stop).unwrap();

        assert_eq!(emitted, 5);
        assert_eq!(sink.len(), 5 * WIRE_FRAME_BYTES);
        assert!(ring.is_empty());
    }
}
