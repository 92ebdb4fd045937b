//! # RustUartBandpass
//!
//! Real-time spectral band-pass filter for PCM audio streamed over UART.
//!
//! ## Architecture
//!
//! ```text
//! UART RX ──▶ Ingest ──▶ FrameRing ──▶ Process ──▶ UART TX
//!             (core 0)   (lock-free)   (core 1)
//!                                       │
//!                            FFT ─▶ mask ─▶ inverse DFT
//! ```
//!
//! The two tasks share nothing but the ring, the statistics counters and
//! their log streams. No mutexes, no allocation on the data path.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod dsp;
pub mod error;
pub mod frame;
pub mod hal;
pub mod ingest;
pub mod log_drain;
pub mod log_globals;
pub mod logging;
pub mod process;
pub mod ring;
pub mod stats;
pub mod wire;

pub use config::FilterConfig;
pub use dsp::{BandPassMask, Fft, FrameFilter, MaskMode};
pub use error::ConfigError;
pub use frame::{Frame, Sample, FRAME_BYTES, FRAME_LEN};
pub use ingest::{CommitOutcome, FeedReport, Ingest, IngestState, RetryPolicy};
pub use log_globals::{ALL_LOGS, INGEST_LOG, PROCESS_LOG, SYSTEM_LOG};
pub use process::{Process, ProcessState};
pub use ring::{FrameRing, RingConsumer, RingProducer};
pub use stats::{PipelineStats, StatsSnapshot, Telemetry};
pub use wire::{encode_frame, FrameDecoder, WIRE_FRAME_BYTES};
