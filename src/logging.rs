//! RT-safe logging for the filter pipeline.
//!
//! # Architecture
//!
//! ```text
//! Ingest task            LogStream            Drain thread
//! ───────────            ─────────            ────────────
//!
//! rt_warn!() ──────────▶ [L0][L1][L2] ──────▶ log UART / stderr
//! non-blocking            lock-free           blocking ok
//!                         one per task
//! ```
//!
//! # Rules
//!
//! - The data path never calls blocking log functions
//! - `println!` and `ESP_LOGx` are not used from the tasks, only `rt_log!`
//! - Each stream has exactly one producer task
//! - Messages are dropped (and counted) when a ring is full

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 120;

/// Log buffer size (number of entries).
pub const LOG_BUFFER_SIZE: usize = 64;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    /// Convert to string for output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

/// Task that owns a log stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskId {
    Ingest,
    Process,
    System,
}

impl TaskId {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskId::Ingest => "INGEST",
            TaskId::Process => "PROCESS",
            TaskId::System => "SYSTEM",
        }
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct LogEntry {
    /// Timestamp in microseconds.
    pub timestamp_us: i64,
    /// Log level.
    pub level: LogLevel,
    /// Message length.
    pub len: u8,
    /// Message bytes (not null-terminated).
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    const EMPTY: Self = Self {
        timestamp_us: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message bytes.
    pub fn message(&self) -> &[u8] {
        &self.msg[..self.len as usize]
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Lock-free log stream (SPSC: one task pushes, the drain thread pops).
///
/// - Push never blocks (drops message if full or below the level filter)
/// - Drain runs in a separate thread at leisure
pub struct LogStream<const N: usize = LOG_BUFFER_SIZE> {
    task: TaskId,
    entries: UnsafeCell<[LogEntry; N]>,
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
    min_level: AtomicU8,
}

// SAFETY: Single producer writes only the slot at write_idx before
// publishing it; single consumer reads only slots below write_idx.
unsafe impl<const N: usize> Sync for LogStream<N> {}
unsafe impl<const N: usize> Send for LogStream<N> {}

impl<const N: usize> LogStream<N> {
    const MASK: usize = N - 1;

    /// Create a new empty log stream for `task`, passing INFO and above.
    pub const fn new(task: TaskId) -> Self {
        assert!(N.is_power_of_two(), "Log buffer size must be power of 2");

        Self {
            task,
            entries: UnsafeCell::new([LogEntry::EMPTY; N]),
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            min_level: AtomicU8::new(LogLevel::Info as u8),
        }
    }

    /// Owning task.
    #[inline]
    pub fn task(&self) -> TaskId {
        self.task
    }

    /// Pass `level` and everything more severe.
    #[inline]
    pub fn set_min_level(&self, level: LogLevel) {
        self.min_level.store(level as u8, Ordering::Relaxed);
    }

    /// Whether a message at `level` would be kept.
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        (level as u8) <= self.min_level.load(Ordering::Relaxed)
    }

    /// Push a log entry (RT-safe, never blocks).
    ///
    /// Returns `true` if message was queued, `false` if filtered or
    /// dropped (ring full). Only drops are counted.
    ///
    /// # Timing
    ///
    /// Completes in O(1), one copy of at most `MAX_MSG_LEN` bytes.
    #[inline]
    pub fn push(&self, timestamp_us: i64, level: LogLevel, msg: &[u8]) -> bool {
        if !self.enabled(level) {
            return false;
        }

        // Only the owning task stores write_idx
        let write = self.write_idx.load(Ordering::Relaxed);
        let read = self.read_idx.load(Ordering::Acquire);

        if write.wrapping_sub(read) >= N as u32 {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let idx = (write as usize) & Self::MASK;

        // SAFETY: slot `write` is free (checked above) and the consumer
        // does not read it until write_idx is published.
        unsafe {
            let entry = &mut (*self.entries.get())[idx];
            entry.timestamp_us = timestamp_us;
            entry.level = level;
            entry.len = msg.len().min(MAX_MSG_LEN) as u8;
            entry.msg[..entry.len as usize].copy_from_slice(&msg[..entry.len as usize]);
        }

        self.write_idx.store(write.wrapping_add(1), Ordering::Release);
        true
    }

    /// Drain next log entry (for the drain thread).
    ///
    /// Returns `None` if no entries available.
    #[inline]
    pub fn drain(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        let idx = (read as usize) & Self::MASK;

        // SAFETY: Single consumer, slot published by the producer
        let entry = unsafe { (*self.entries.get())[idx] };

        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    /// Get count of dropped messages.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Reset dropped counter (e.g., after reporting).
    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }

    /// Check if there are entries to drain.
    #[inline]
    pub fn has_entries(&self) -> bool {
        self.pending() != 0
    }

    /// Get number of entries waiting to be drained.
    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }
}

/// `core::fmt::Write` into a fixed byte buffer, truncating on overflow.
pub struct BufWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> BufWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }
}

impl core::fmt::Write for BufWriter<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buf.len() - self.pos;
        let to_write = bytes.len().min(remaining);
        self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
        self.pos += to_write;
        Ok(())
    }
}

/// Format a message into a buffer.
///
/// Returns the number of bytes written.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    let mut writer = BufWriter::new(buf);
    let _ = core::fmt::write(&mut writer, args);
    writer.len()
}

/// RT-safe log macro.
///
/// Use this on the data path instead of println!, ESP_LOGx, etc.
/// Formatting is skipped entirely when the level is filtered out.
///
/// # Example
///
/// ```ignore
/// rt_log!(LogLevel::Warn, INGEST_LOG, now_us, "ring full after {} tries", n);
/// ```
#[macro_export]
macro_rules! rt_log {
    ($level:expr, $stream:expr, $timestamp:expr, $($arg:tt)*) => {{
        let level = $level;
        if $stream.enabled(level) {
            let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
            let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
            $stream.push($timestamp, level, &buf[..len]);
        }
    }};
}

/// RT-safe info log.
#[macro_export]
macro_rules! rt_info {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Info, $stream, $timestamp, $($arg)*)
    };
}

/// RT-safe warning log.
#[macro_export]
macro_rules! rt_warn {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Warn, $stream, $timestamp, $($arg)*)
    };
}

/// RT-safe error log.
#[macro_export]
macro_rules! rt_error {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Error, $stream, $timestamp, $($arg)*)
    };
}

/// RT-safe debug log.
#[macro_export]
macro_rules! rt_debug {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Debug, $stream, $timestamp, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_stream_basic() {
        let stream = LogStream::<16>::new(TaskId::Ingest);

        assert!(stream.push(1000, LogLevel::Info, b"test message"));
        assert!(stream.has_entries());
        assert_eq!(stream.pending(), 1);

        let entry = stream.drain().unwrap();
        assert_eq!(entry.timestamp_us, 1000);
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.message(), b"test message");

        assert!(!stream.has_entries());
    }

    #[test]
    fn test_log_stream_full() {
        let stream = LogStream::<4>::new(TaskId::Ingest);

        // Fill the buffer
        assert!(stream.push(1, LogLevel::Info, b"1"));
        assert!(stream.push(2, LogLevel::Info, b"2"));
        assert!(stream.push(3, LogLevel::Info, b"3"));
        assert!(stream.push(4, LogLevel::Info, b"4"));

        // Should drop
        assert!(!stream.push(5, LogLevel::Info, b"5"));
        assert_eq!(stream.dropped(), 1);

        // Drain one, should be able to push again
        stream.drain();
        assert!(stream.push(6, LogLevel::Info, b"6"));
    }

    #[test]
    fn test_level_filter() {
        let stream = LogStream::<8>::new(TaskId::Process);

        // INFO by default: debug is filtered, not counted as dropped
        assert!(!stream.push(1, LogLevel::Debug, b"hidden"));
        assert_eq!(stream.dropped(), 0);
        assert!(stream.push(2, LogLevel::Warn, b"shown"));

        stream.set_min_level(LogLevel::Debug);
        assert!(stream.enabled(LogLevel::Debug));
        assert!(stream.push(3, LogLevel::Debug, b"now shown"));
        assert_eq!(stream.pending(), 2);
    }

    #[test]
    fn test_long_message_truncated() {
        let stream = LogStream::<4>::new(TaskId::System);
        let long = [b'x'; MAX_MSG_LEN + 30];
        assert!(stream.push(0, LogLevel::Error, &long));
        assert_eq!(stream.drain().unwrap().len as usize, MAX_MSG_LEN);
    }

    #[test]
    fn test_format_to_buffer() {
        let mut buf = [0u8; 32];
        let len = format_to_buffer(&mut buf, format_args!("Hello {}", 42));
        assert_eq!(&buf[..len], b"Hello 42");

        let mut small = [0u8; 4];
        let len = format_to_buffer(&mut small, format_args!("Hello {}", 42));
        assert_eq!(&small[..len], b"Hell");
    }

    #[test]
    fn test_macros_respect_filter() {
        let stream = LogStream::<8>::new(TaskId::Ingest);
        crate::rt_debug!(stream, 5, "burst of {} bytes", 100);
        crate::rt_warn!(stream, 6, "rejected after {} tries", 10);

        let entry = stream.drain().unwrap();
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.message(), b"rejected after 10 tries");
        assert!(stream.drain().is_none());
    }

    #[test]
    fn test_spsc_cross_thread() {
        use std::sync::Arc;
        use std::thread;

        let stream = Arc::new(LogStream::<16>::new(TaskId::Ingest));
        let producer = {
            let stream = Arc::clone(&stream);
            thread::spawn(move || {
                let mut sent = 0;
                while sent < 200 {
                    let msg = format!("msg {}", sent);
                    if stream.push(sent as i64, LogLevel::Info, msg.as_bytes()) {
                        sent += 1;
                    }
                }
            })
        };

        // Entries arrive in order with no gaps
        let mut next = 0i64;
        while next < 200 {
            if let Some(entry) = stream.drain() {
                assert_eq!(entry.timestamp_us, next);
                next += 1;
            }
        }
        producer.join().unwrap();
    }
}
