#![forbid(unsafe_code)]

//! Counting writer for tracking bytes emitted.
//!
//! This module provides a wrapper around any `Write` implementation that
//! counts the number of bytes written. This is used to verify O(changes)
//! output size for diff-based rendering.
//!
//! # Usage
//!
//! ```
//! use ftui_render::counting_writer::CountingWriter;
//! use std::io::Write;
//!
//! let mut buffer = Vec::new();
//! let mut writer = CountingWriter::new(&mut buffer);
//!
//! writer.write_all(b"Hello, world!").unwrap();
//! assert_eq!(writer.bytes_written(), 13);
//!
//! writer.reset_counter();
//! writer.write_all(b"Hi").unwrap();
//! assert_eq!(writer.bytes_written(), 2);
//! ```

use std::io::{self, Write};
use std::time::{Duration, Instant};

/// A write wrapper that counts bytes written.
///
/// Wraps any `Write` implementation and tracks the total number of bytes
/// written through it. The counter can be reset between operations.
#[derive(Debug)]
pub struct CountingWriter<W> {
    /// The underlying writer.
    inner: W,
    /// Total bytes written since last reset.
    bytes_written: u64,
}

impl<W> CountingWriter<W> {
    /// Create a new counting writer wrapping the given writer.
    #[inline]
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            bytes_written: 0,
        }
    }

    /// Get the number of bytes written since the last reset.
    #[inline]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Reset the byte counter to zero.
    #[inline]
    pub fn reset_counter(&mut self) {
        self.bytes_written = 0;
    }

    /// Get a reference to the underlying writer.
    #[inline]
    pub fn inner(&self) -> &W {
        &self.inner
    }

    /// Get a mutable reference to the underlying writer.
    #[inline]
    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consume the counting writer and return the inner writer.
    #[inline]
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)?;
        self.bytes_written += buf.len() as u64;
        Ok(())
    }
}

/// Statistics from a present() operation.
///
/// Captures metrics for verifying O(changes) output size and detecting
/// performance regressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentStats {
    /// Bytes emitted for this frame.
    pub bytes_emitted: u64,
    /// Number of cells changed.
    pub cells_changed: usize,
    /// Number of runs (groups of consecutive changes).
    pub run_count: usize,
    /// Time spent in present().
    pub duration: Duration,
}

impl PresentStats {
    /// Create new stats with the given values.
    #[inline]
    pub fn new(
        bytes_emitted: u64,
        cells_changed: usize,
        run_count: usize,
        duration: Duration,
    ) -> Self {
        Self {
            bytes_emitted,
            cells_changed,
            run_count,
            duration,
        }
    }

    /// Calculate bytes per cell changed.
    ///
    /// Returns 0.0 if no cells were changed.
    #[inline]
    pub fn bytes_per_cell(&self) -> f64 {
        if self.cells_changed == 0 {
            0.0
        } else {
            self.bytes_emitted as f64 / self.cells_changed as f64
        }
    }

    /// Calculate bytes per run.
    ///
    /// Returns 0.0 if no runs.
    #[inline]
    pub fn bytes_per_run(&self) -> f64 {
        if self.run_count == 0 {
            0.0
        } else {
            self.bytes_emitted as f64 / self.run_count as f64
        }
    }

    /// Check if output is within the expected budget.
    ///
    /// Uses conservative estimates for worst-case bytes per cell.
    #[inline]
    pub fn within_budget(&self) -> bool {
        let budget = expected_max_bytes(self.cells_changed, self.run_count);
        self.bytes_emitted <= budget
    }

    /// Log stats at debug level (requires tracing feature).
    #[cfg(feature = "tracing")]
    pub fn log(&self) {
        tracing::debug!(
            bytes = self.bytes_emitted,
            cells_changed = self.cells_changed,
            runs = self.run_count,
            duration_us = self.duration.as_micros() as u64,
            bytes_per_cell = format!("{:.1}", self.bytes_per_cell()),
            "Present stats"
        );
    }

    /// Log stats at debug level (no-op without tracing feature).
    #[cfg(not(feature = "tracing"))]
    pub fn log(&self) {
        // No-op without tracing
    }
}

impl Default for PresentStats {
    fn default() -> Self {
        Self {
            bytes_emitted: 0,
            cells_changed: 0,
            run_count: 0,
            duration: Duration::ZERO,
        }
    }
}

/// Expected bytes per cell change (approximate worst case).
///
/// Worst case: cursor move (10) + full SGR reset+apply (25) + 4-byte UTF-8 char
pub const BYTES_PER_CELL_MAX: u64 = 40;

/// Bytes for sync output wrapper.
pub const SYNC_OVERHEAD: u64 = 20;

/// Bytes for cursor move sequence (CUP).
pub const BYTES_PER_CURSOR_MOVE: u64 = 10;

/// Calculate expected maximum bytes for a frame with given changes.
///
/// This is a conservative budget for regression testing.
#[inline]
pub fn expected_max_bytes(cells_changed: usize, runs: usize) -> u64 {
    // cursor move per run + cells * max_per_cell + sync overhead
    (runs as u64 * BYTES_PER_CURSOR_MOVE)
        + (cells_changed as u64 * BYTES_PER_CELL_MAX)
        + SYNC_OVERHEAD
}

/// A stats collector for measuring present operations.
///
/// Use this to wrap present() calls and collect statistics.
#[derive(Debug)]
pub struct StatsCollector {
    start: Instant,
    cells_changed: usize,
    run_count: usize,
}

impl StatsCollector {
    /// Start collecting stats for a present operation.
    #[inline]
    pub fn start(cells_changed: usize, run_count: usize) -> Self {
        Self {
            start: Instant::now(),
            cells_changed,
            run_count,
        }
    }

    /// Finish collecting and return stats.
    #[inline]
    pub fn finish(self, bytes_emitted: u64) -> PresentStats {
        PresentStats {
            bytes_emitted,
            cells_changed: self.cells_changed,
            run_count: self.run_count,
            duration: self.start.elapsed(),
        }
    }
}
