//! Log drain: formats queued entries onto a blocking byte sink.
//!
//! Runs off the data path (log UART on the firmware, stderr on the host).
//!
//! ```text
//! INGEST_LOG ──┐
//! PROCESS_LOG ─┼──▶ LogDrain::pump ──▶ embedded_io::Write
//! SYSTEM_LOG ──┘
//! ```

use core::fmt::Write as _;

use embedded_io::Write;

use crate::logging::{BufWriter, LogEntry, LogStream, TaskId};

/// Formatted line buffer size. Fits the prefix plus `MAX_MSG_LEN`.
pub const LINE_BUF_LEN: usize = 192;

/// Default dropped-message report interval (10 s).
pub const DROP_REPORT_INTERVAL_US: i64 = 10_000_000;

/// Format log entry to bytes.
///
/// Format: `[timestamp_us] TASK LEVEL: message\n`
pub fn format_log_entry(task: TaskId, entry: &LogEntry, buf: &mut [u8]) -> usize {
    let mut writer = BufWriter::new(buf);

    let _ = write!(
        writer,
        "[{:10}] {} {}: {}\n",
        entry.timestamp_us,
        task.as_str(),
        entry.level.as_str(),
        core::str::from_utf8(entry.message()).unwrap_or("<invalid utf8>")
    );

    writer.len()
}

/// Write every queued entry of `stream` to `sink`.
///
/// Returns the number of entries written.
pub fn drain_into<W: Write, const N: usize>(stream: &LogStream<N>, sink: &mut W) -> Result<usize, W::Error> {
    let mut line = [0u8; LINE_BUF_LEN];
    let mut count = 0;

    while let Some(entry) = stream.drain() {
        let len = format_log_entry(stream.task(), &entry, &mut line);
        sink.write_all(&line[..len])?;
        count += 1;
    }

    Ok(count)
}

/// Periodic drain over a set of streams, with dropped-message reports.
pub struct LogDrain {
    last_report_us: i64,
    interval_us: i64,
}

impl LogDrain {
    pub const fn new(interval_us: i64) -> Self {
        Self {
            last_report_us: 0,
            interval_us,
        }
    }

    /// Drain all streams in order, then report drops if the interval has
    /// elapsed.
    ///
    /// Returns the number of lines written, so the caller can back off
    /// when there was no work.
    pub fn pump<W: Write>(&mut self, streams: &[&LogStream], sink: &mut W, now_us: i64) -> Result<usize, W::Error> {
        let mut lines = 0;

        for stream in streams {
            lines += drain_into(*stream, sink)?;
        }

        if now_us - self.last_report_us >= self.interval_us {
            for stream in streams {
                let dropped = stream.dropped();
                if dropped == 0 {
                    continue;
                }

                let mut line = [0u8; LINE_BUF_LEN];
                let mut writer = BufWriter::new(&mut line);
                let _ = write!(
                    writer,
                    "[{:10}] {} WARN: {} log messages dropped\n",
                    now_us,
                    stream.task().as_str(),
                    dropped
                );
                let len = writer.len();
                sink.write_all(&line[..len])?;

                stream.reset_dropped();
                lines += 1;
            }

            self.last_report_us = now_us;
        }

        Ok(lines)
    }
}

impl Default for LogDrain {
    fn default() -> Self {
        Self::new(DROP_REPORT_INTERVAL_US)
    }
}
