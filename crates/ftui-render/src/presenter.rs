#![forbid(unsafe_code)]

//! Presenter: state-tracked ANSI emission.
//!
//! The Presenter transforms buffer diffs into minimal terminal output by tracking
//! the current terminal state and only emitting sequences when changes are needed.
//!
//! # Design Principles
//!
//! - **State tracking**: Track current style, link, and cursor to avoid redundant output
//! - **Run grouping**: Use ChangeRuns to minimize cursor positioning
//! - **Single write**: Buffer all output and flush once per frame
//! - **Synchronized output**: Use DEC 2026 to prevent flicker on supported terminals
//!
//! # Usage
//!
//! ```ignore
//! use ftui_render::presenter::Presenter;
//! use ftui_render::buffer::Buffer;
//! use ftui_render::diff::BufferDiff;
//! use ftui_core::terminal_capabilities::TerminalCapabilities;
//!
//! let caps = TerminalCapabilities::detect();
//! let mut presenter = Presenter::new(std::io::stdout(), caps);
//!
//! let mut current = Buffer::new(80, 24);
//! let mut next = Buffer::new(80, 24);
//! // ... render widgets into `next` ...
//!
//! let diff = BufferDiff::compute(&current, &next);
//! presenter.present(&next, &diff)?;
//! std::mem::swap(&mut current, &mut next);
//! ```

use std::io::{self, BufWriter, Write};

use crate::ansi::{self, EraseLineMode};
use crate::buffer::Buffer;
use crate::cell::{Cell, CellAttrs, PackedRgba, StyleFlags};
use crate::counting_writer::{CountingWriter, PresentStats, StatsCollector};
use crate::diff::{BufferDiff, ChangeRun};
use crate::grapheme_pool::GraphemePool;
use crate::link_registry::LinkRegistry;

pub use ftui_core::terminal_capabilities::TerminalCapabilities;

/// Size of the internal write buffer (64KB).
const BUFFER_CAPACITY: usize = 64 * 1024;

// =============================================================================
// DP Cost Model for ANSI Emission
// =============================================================================

/// Byte-cost estimates for ANSI cursor and output operations.
///
/// The cost model computes the cheapest emission plan for each row by comparing
/// sparse-run emission (CUP per run) against merged write-through (one CUP,
/// fill gaps with buffer content). This is a shortest-path problem on a small
/// state graph per row.
mod cost_model {
    use smallvec::SmallVec;

    use super::ChangeRun;

    /// Number of decimal digits needed to represent `n`.
    #[inline]
    fn digit_count(n: u16) -> usize {
        if n >= 10000 {
            5
        } else if n >= 1000 {
            4
        } else if n >= 100 {
            3
        } else if n >= 10 {
            2
        } else {
            1
        }
    }

    /// Byte cost of CUP: `\x1b[{row+1};{col+1}H`
    #[inline]
    pub fn cup_cost(row: u16, col: u16) -> usize {
        // CSI (2) + row digits + ';' (1) + col digits + 'H' (1)
        4 + digit_count(row.saturating_add(1)) + digit_count(col.saturating_add(1))
    }

    /// Byte cost of CHA (column-only): `\x1b[{col+1}G`
    #[inline]
    pub fn cha_cost(col: u16) -> usize {
        // CSI (2) + col digits + 'G' (1)
        3 + digit_count(col.saturating_add(1))
    }

    /// Byte cost of CUF (cursor forward): `\x1b[{n}C` or `\x1b[C` for n=1.
    #[inline]
    pub fn cuf_cost(n: u16) -> usize {
        match n {
            0 => 0,
            1 => 3, // \x1b[C
            _ => 3 + digit_count(n),
        }
    }

    /// Cheapest cursor movement cost from (from_x, from_y) to (to_x, to_y).
    /// Returns 0 if already at the target position.
    pub fn cheapest_move_cost(
        from_x: Option<u16>,
        from_y: Option<u16>,
        to_x: u16,
        to_y: u16,
    ) -> usize {
        // Already at target?
        if from_x == Some(to_x) && from_y == Some(to_y) {
            return 0;
        }

        let cup = cup_cost(to_y, to_x);

        match (from_x, from_y) {
            (Some(fx), Some(fy)) if fy == to_y => {
                // Same row: compare CHA, CUF, and CUP
                let cha = cha_cost(to_x);
                if to_x > fx {
                    let cuf = cuf_cost(to_x - fx);
                    cup.min(cha).min(cuf)
                } else if to_x == fx {
                    0
                } else {
                    // Moving backward: CHA or CUP
                    cup.min(cha)
                }
            }
            _ => cup,
        }
    }

    /// Planned contiguous span to emit on a single row.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RowSpan {
        /// Row index.
        pub y: u16,
        /// Start column (inclusive).
        pub x0: u16,
        /// End column (inclusive).
        pub x1: u16,
    }

    /// Row emission plan (possibly multiple merged spans).
    ///
    /// Uses SmallVec<[RowSpan; 4]> to avoid heap allocation for the common case
    /// of 1-4 spans per row. RowSpan is 6 bytes, so 4 spans = 24 bytes inline.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RowPlan {
        spans: SmallVec<[RowSpan; 4]>,
        total_cost: usize,
    }

    impl RowPlan {
        #[inline]
        pub fn spans(&self) -> &[RowSpan] {
            &self.spans
        }

        /// Total cost of this row plan (for strategy selection).
        #[inline]
        #[allow(dead_code)] // API for future diff strategy integration
        pub fn total_cost(&self) -> usize {
            self.total_cost
        }
    }

    /// Reusable scratch buffers for `plan_row_reuse`, avoiding per-call heap
    /// allocations. Store one instance in `Presenter` and pass it into every
    /// `plan_row_reuse` call so that the buffers are reused across rows and
    /// frames.
    #[derive(Debug, Default)]
    pub struct RowPlanScratch {
        prefix_cells: Vec<usize>,
        dp: Vec<usize>,
        prev: Vec<usize>,
    }

    /// Compute the optimal emission plan for a set of runs on the same row.
    ///
    /// This is a shortest-path / DP partitioning problem over contiguous run
    /// segments. Each segment may be emitted as a merged span (writing through
    /// gaps). Single-run segments correspond to sparse emission.
    ///
    /// Gap cells cost ~1 byte each (character content), plus potential style
    /// overhead estimated at 1 byte per gap cell (conservative).
    pub fn plan_row(row_runs: &[ChangeRun], prev_x: Option<u16>, prev_y: Option<u16>) -> RowPlan {
        let mut scratch = RowPlanScratch::default();
        plan_row_reuse(row_runs, prev_x, prev_y, &mut scratch)
    }

    /// Like `plan_row` but reuses heap allocations via the provided scratch
    /// buffers, eliminating per-call allocations in the hot path.
    pub fn plan_row_reuse(
        row_runs: &[ChangeRun],
        prev_x: Option<u16>,
        prev_y: Option<u16>,
        scratch: &mut RowPlanScratch,
    ) -> RowPlan {
        debug_assert!(!row_runs.is_empty());

        let row_y = row_runs[0].y;
        let run_count = row_runs.len();

        // Resize scratch buffers (no-op if already large enough).
        scratch.prefix_cells.clear();
        scratch.prefix_cells.resize(run_count + 1, 0);
        scratch.dp.clear();
        scratch.dp.resize(run_count, usize::MAX);
        scratch.prev.clear();
        scratch.prev.resize(run_count, 0);

        // Prefix sum of changed cell counts for O(1) segment cost.
        for (i, run) in row_runs.iter().enumerate() {
            scratch.prefix_cells[i + 1] = scratch.prefix_cells[i] + run.len() as usize;
        }

        // DP over segments: dp[j] is min cost to emit runs[0..=j].
        for j in 0..run_count {
            let mut best_cost = usize::MAX;
            let mut best_i = j;

            // Optimization: iterate backwards and break if the gap becomes too large.
            // The gap cost grows linearly, while cursor movement cost is bounded (~10-15 bytes).
            // Once the gap exceeds ~20 cells, merging is strictly worse than moving.
            // We use 32 as a conservative safety bound.
            for i in (0..=j).rev() {
                let changed_cells = scratch.prefix_cells[j + 1] - scratch.prefix_cells[i];
                let total_cells = (row_runs[j].x1 - row_runs[i].x0 + 1) as usize;
                let gap_cells = total_cells - changed_cells;

                if gap_cells > 32 {
                    break;
                }

                let from_x = if i == 0 {
                    prev_x
                } else {
                    Some(row_runs[i - 1].x1.saturating_add(1))
                };
                let from_y = if i == 0 { prev_y } else { Some(row_y) };

                let move_cost = cheapest_move_cost(from_x, from_y, row_runs[i].x0, row_y);
                let gap_overhead = gap_cells * 2; // conservative: char + style amortized
                let emit_cost = changed_cells + gap_overhead;

                let prev_cost = if i == 0 { 0 } else { scratch.dp[i - 1] };
                let cost = prev_cost
                    .saturating_add(move_cost)
                    .saturating_add(emit_cost);

                if cost < best_cost {
                    best_cost = cost;
                    best_i = i;
                }
            }

            scratch.dp[j] = best_cost;
            scratch.prev[j] = best_i;
        }

        // Reconstruct spans from back to front.
        let mut spans: SmallVec<[RowSpan; 4]> = SmallVec::new();
        let mut j = run_count - 1;
        loop {
            let i = scratch.prev[j];
            spans.push(RowSpan {
                y: row_y,
                x0: row_runs[i].x0,
                x1: row_runs[j].x1,
            });
            if i == 0 {
                break;
            }
            j = i - 1;
        }
        spans.reverse();

        RowPlan {
            spans,
            total_cost: scratch.dp[run_count - 1],
        }
    }
}

/// Cached style state for comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellStyle {
    fg: PackedRgba,
    bg: PackedRgba,
    attrs: StyleFlags,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            fg: PackedRgba::TRANSPARENT,
            bg: PackedRgba::TRANSPARENT,
            attrs: StyleFlags::empty(),
        }
    }
}
impl CellStyle {
    fn from_cell(cell: &Cell) -> Self {
        Self {
            fg: cell.fg,
            bg: cell.bg,
            attrs: cell.attrs.flags(),
        }
    }
}

/// State-tracked ANSI presenter.
///
/// Transforms buffer diffs into minimal terminal output by tracking
/// the current terminal state and only emitting necessary escape sequences.
pub struct Presenter<W: Write> {
    /// Buffered writer for efficient output, with byte counting.
    writer: CountingWriter<BufWriter<W>>,
    /// Current style state (None = unknown/reset).
    current_style: Option<CellStyle>,
    /// Current hyperlink ID (None = no link).
    current_link: Option<u32>,
    /// Current cursor X position (0-indexed). None = unknown.
    cursor_x: Option<u16>,
    /// Current cursor Y position (0-indexed). None = unknown.
    cursor_y: Option<u16>,
    /// Terminal capabilities for conditional output.
    capabilities: TerminalCapabilities,
    /// Reusable scratch buffers for the cost-model DP, avoiding per-row
    /// heap allocations in the hot presentation path.
    plan_scratch: cost_model::RowPlanScratch,
    /// Reusable buffer for change runs, avoiding per-frame allocation.
    runs_buf: Vec<ChangeRun>,
}

impl<W: Write> Presenter<W> {
    /// Create a new presenter with the given writer and capabilities.
    pub fn new(writer: W, capabilities: TerminalCapabilities) -> Self {
        Self {
            writer: CountingWriter::new(BufWriter::with_capacity(BUFFER_CAPACITY, writer)),
            current_style: None,
            current_link: None,
            cursor_x: None,
            cursor_y: None,
            capabilities,
            plan_scratch: cost_model::RowPlanScratch::default(),
            runs_buf: Vec::new(),
        }
    }

    /// Get the terminal capabilities.
    #[inline]
    pub fn capabilities(&self) -> &TerminalCapabilities {
        &self.capabilities
    }

    /// Present a frame using the given buffer and diff.
    ///
    /// This is the main entry point for rendering. It:
    /// 1. Begins synchronized output (if supported)
    /// 2. Emits changes based on the diff
    /// 3. Resets style and closes links
    /// 4. Ends synchronized output
    /// 5. Flushes all buffered output
    pub fn present(&mut self, buffer: &Buffer, diff: &BufferDiff) -> io::Result<PresentStats> {
        self.present_with_pool(buffer, diff, None, None)
    }

    /// Present a frame with grapheme pool and link registry.
    pub fn present_with_pool(
        &mut self,
        buffer: &Buffer,
        diff: &BufferDiff,
        pool: Option<&GraphemePool>,
        links: Option<&LinkRegistry>,
    ) -> io::Result<PresentStats> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "present",
            width = buffer.width(),
            height = buffer.height(),
            changes = diff.len()
        );
        #[cfg(feature = "tracing")]
        let _guard = _span.enter();

        // Calculate runs upfront for stats, reusing the runs buffer.
        diff.runs_into(&mut self.runs_buf);
        let run_count = self.runs_buf.len();
        let cells_changed = diff.len();

        // Start stats collection
        self.writer.reset_counter();
        let collector = StatsCollector::start(cells_changed, run_count);

        // Begin synchronized output to prevent flicker
        if self.capabilities.sync_output {
            ansi::sync_begin(&mut self.writer)?;
        }

        // Emit diff using run grouping for efficiency
        self.emit_runs_reuse(buffer, pool, links)?;

        // Reset style at end (clean state for next frame)
        ansi::sgr_reset(&mut self.writer)?;
        self.current_style = None;

        // Close any open hyperlink
        if self.current_link.is_some() {
            ansi::hyperlink_end(&mut self.writer)?;
            self.current_link = None;
        }

        // End synchronized output
        if self.capabilities.sync_output {
            ansi::sync_end(&mut self.writer)?;
        }

        self.writer.flush()?;

        let stats = collector.finish(self.writer.bytes_written());

        #[cfg(feature = "tracing")]
        {
            stats.log();
            tracing::trace!("frame presented");
        }

        Ok(stats)
    }

    /// Emit runs of changed cells using the DP cost model.
    ///
    /// Groups runs by row, then for each row decides whether to emit runs
    /// individually (sparse) or merge them (write through gaps) based on
    /// byte cost estimation.
    #[allow(dead_code)] // Kept for reference; production path uses emit_runs_reuse
    fn emit_runs(
        &mut self,
        buffer: &Buffer,
        runs: &[ChangeRun],
        pool: Option<&GraphemePool>,
        links: Option<&LinkRegistry>,
    ) -> io::Result<()> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("emit_diff");
        #[cfg(feature = "tracing")]
        let _guard = _span.enter();

        #[cfg(feature = "tracing")]
        tracing::trace!(run_count = runs.len(), "emitting runs");

        // Group runs by row and apply cost model per row
        let mut i = 0;
        while i < runs.len() {
            let row_y = runs[i].y;

            // Collect all runs on this row
            let row_start = i;
            while i < runs.len() && runs[i].y == row_y {
                i += 1;
            }
            let row_runs = &runs[row_start..i];

            let plan = cost_model::plan_row(row_runs, self.cursor_x, self.cursor_y);

            #[cfg(feature = "tracing")]
            tracing::trace!(
                row = row_y,
                spans = plan.spans().len(),
                cost = plan.total_cost(),
                "row plan"
            );

            let row = buffer.row_cells(row_y);
            for span in plan.spans() {
                self.move_cursor_optimal(span.x0, span.y)?;
                // Hot path: avoid recomputing `y * width + x` for every cell.
                let start = span.x0 as usize;
                let end = span.x1 as usize;
                debug_assert!(start <= end);
                debug_assert!(end < row.len());

                let mut idx = start;
                for cell in &row[start..=end] {
                    self.emit_cell(idx as u16, cell, pool, links)?;
                    idx += 1;
                }
            }
        }
        Ok(())
    }

    /// Like `emit_runs` but uses the internal `runs_buf` and `plan_scratch`
    /// to avoid per-row and per-frame allocations.
    fn emit_runs_reuse(
        &mut self,
        buffer: &Buffer,
        pool: Option<&GraphemePool>,
        links: Option<&LinkRegistry>,
    ) -> io::Result<()> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("emit_diff");
        #[cfg(feature = "tracing")]
        let _guard = _span.enter();

        #[cfg(feature = "tracing")]
        tracing::trace!(run_count = self.runs_buf.len(), "emitting runs (reuse)");

        // Group runs by row and apply cost model per row
        let mut i = 0;
        while i < self.runs_buf.len() {
            let row_y = self.runs_buf[i].y;

            // Collect all runs on this row
            let row_start = i;
            while i < self.runs_buf.len() && self.runs_buf[i].y == row_y {
                i += 1;
            }
            let row_runs = &self.runs_buf[row_start..i];

            let plan = cost_model::plan_row_reuse(
                row_runs,
                self.cursor_x,
                self.cursor_y,
                &mut self.plan_scratch,
            );

            #[cfg(feature = "tracing")]
            tracing::trace!(
                row = row_y,
                spans = plan.spans().len(),
                cost = plan.total_cost(),
                "row plan"
            );

            let row = buffer.row_cells(row_y);
            for span in plan.spans() {
                self.move_cursor_optimal(span.x0, span.y)?;
                // Hot path: avoid recomputing `y * width + x` for every cell.
                let start = span.x0 as usize;
                let end = span.x1 as usize;
                debug_assert!(start <= end);
                debug_assert!(end < row.len());

                let mut idx = start;
                for cell in &row[start..=end] {
                    self.emit_cell(idx as u16, cell, pool, links)?;
                    idx += 1;
                }
            }
        }
        Ok(())
    }

    /// Emit a single cell.
    fn emit_cell(
        &mut self,
        x: u16,
        cell: &Cell,
        pool: Option<&GraphemePool>,
        links: Option<&LinkRegistry>,
    ) -> io::Result<()> {
        // Continuation cells are the tail cells of wide glyphs. Emitting the
        // head glyph already advanced the terminal cursor by the full width, so
        // we normally skip emitting these cells.
        //
        // If we ever start emitting at a continuation cell (e.g. a run begins
        // mid-wide-character), we must still advance the terminal cursor by one
        // cell to keep subsequent emissions aligned. Prefer CUF over writing a
        // space so we don't overwrite a valid wide-glyph tail.
        if cell.is_continuation() {
            match self.cursor_x {
                // Cursor already advanced past this cell by a previously-emitted wide head.
                Some(cx) if cx > x => return Ok(()),
                // Cursor is positioned at (or before) this continuation cell: advance by 1.
                Some(cx) => {
                    ansi::cuf(&mut self.writer, 1)?;
                    self.cursor_x = Some(cx.saturating_add(1));
                    return Ok(());
                }
                // Defensive: move_cursor_optimal should always set cursor_x before emit_cell is called.
                None => {
                    ansi::cuf(&mut self.writer, 1)?;
                    self.cursor_x = Some(x.saturating_add(1));
                    return Ok(());
                }
            }
        }

        // Emit style changes if needed
        self.emit_style_changes(cell)?;

        // Emit link changes if needed
        self.emit_link_changes(cell, links)?;

        // Calculate effective width and check for zero-width content (e.g. combining marks)
        // stored as standalone cells. These must be replaced to maintain grid alignment.
        let raw_width = cell.content.width();
        let is_zero_width_content = raw_width == 0 && !cell.is_empty() && !cell.is_continuation();

        if is_zero_width_content {
            // Replace with U+FFFD Replacement Character (width 1)
            self.writer.write_all(b"\xEF\xBF\xBD")?;
        } else {
            // Emit normal content
            self.emit_content(cell, pool)?;
        }

        // Update cursor position (character output advances cursor)
        if let Some(cx) = self.cursor_x {
            // Empty cells are emitted as spaces (width 1).
            // Zero-width content replaced by U+FFFD is width 1.
            let width = if cell.is_empty() || is_zero_width_content {
                1
            } else {
                raw_width
            };
            self.cursor_x = Some(cx.saturating_add(width as u16));
        }

        Ok(())
    }

    /// Emit style changes if the cell style differs from current.
    ///
    /// Uses SGR delta: instead of resetting and re-applying all style properties,
    /// we compute the minimal set of changes needed (fg delta, bg delta, attr
    /// toggles). Falls back to reset+apply only when a full reset would be cheaper.
    fn emit_style_changes(&mut self, cell: &Cell) -> io::Result<()> {
        let new_style = CellStyle::from_cell(cell);

        // Check if style changed
        if self.current_style == Some(new_style) {
            return Ok(());
        }

        match self.current_style {
            None => {
                // No known state - must do full apply (but skip reset if we haven't
                // emitted anything yet, the frame-start reset handles that).
                self.emit_style_full(new_style)?;
            }
            Some(old_style) => {
                self.emit_style_delta(old_style, new_style)?;
            }
        }

        self.current_style = Some(new_style);
        Ok(())
    }

    /// Full style apply (reset + set all properties). Used when previous state is unknown.
    fn emit_style_full(&mut self, style: CellStyle) -> io::Result<()> {
        ansi::sgr_reset(&mut self.writer)?;
        if style.fg.a() > 0 {
            ansi::sgr_fg_packed(&mut self.writer, style.fg)?;
        }
        if style.bg.a() > 0 {
            ansi::sgr_bg_packed(&mut self.writer, style.bg)?;
        }
        if !style.attrs.is_empty() {
            ansi::sgr_flags(&mut self.writer, style.attrs)?;
        }
        Ok(())
    }

    #[inline]
    fn dec_len_u8(value: u8) -> u32 {
        if value >= 100 {
            3
        } else if value >= 10 {
            2
        } else {
            1
        }
    }

    #[inline]
    fn sgr_code_len(code: u8) -> u32 {
        2 + Self::dec_len_u8(code) + 1
    }

    #[inline]
    fn sgr_flags_len(flags: StyleFlags) -> u32 {
        if flags.is_empty() {
            return 0;
        }
        let mut count = 0u32;
        let mut digits = 0u32;
        for (flag, codes) in ansi::FLAG_TABLE {
            if flags.contains(flag) {
                count += 1;
                digits += Self::dec_len_u8(codes.on);
            }
        }
        if count == 0 {
            return 0;
        }
        3 + digits + (count - 1)
    }

    #[inline]
    fn sgr_flags_off_len(flags: StyleFlags) -> u32 {
        if flags.is_empty() {
            return 0;
        }
        let mut len = 0u32;
        for (flag, codes) in ansi::FLAG_TABLE {
            if flags.contains(flag) {
                len += Self::sgr_code_len(codes.off);
            }
        }
        len
    }

    #[inline]
    fn sgr_rgb_len(color: PackedRgba) -> u32 {
        10 + Self::dec_len_u8(color.r()) + Self::dec_len_u8(color.g()) + Self::dec_len_u8(color.b())
    }

    /// Emit minimal SGR delta between old and new styles.
    ///
    /// Computes which properties changed and emits only those.
    /// Falls back to reset+apply when that would produce fewer bytes.
    fn emit_style_delta(&mut self, old: CellStyle, new: CellStyle) -> io::Result<()> {
        let attrs_removed = old.attrs & !new.attrs;
        let attrs_added = new.attrs & !old.attrs;
        let fg_changed = old.fg != new.fg;
        let bg_changed = old.bg != new.bg;

        // Hot path for VFX-style workloads: attributes are unchanged and only
        // colors vary. In this case, delta emission is always no worse than a
        // reset+reapply baseline, so skip cost estimation and flag diff logic.
        if old.attrs == new.attrs {
            if fg_changed {
                ansi::sgr_fg_packed(&mut self.writer, new.fg)?;
            }
            if bg_changed {
                ansi::sgr_bg_packed(&mut self.writer, new.bg)?;
            }
            return Ok(());
        }

        let mut collateral = StyleFlags::empty();
        if attrs_removed.contains(StyleFlags::BOLD) && new.attrs.contains(StyleFlags::DIM) {
            collateral |= StyleFlags::DIM;
        }
        if attrs_removed.contains(StyleFlags::DIM) && new.attrs.contains(StyleFlags::BOLD) {
            collateral |= StyleFlags::BOLD;
        }

        let mut delta_len = 0u32;
        delta_len += Self::sgr_flags_off_len(attrs_removed);
        delta_len += Self::sgr_flags_len(collateral);
        delta_len += Self::sgr_flags_len(attrs_added);
        if fg_changed {
            delta_len += if new.fg.a() == 0 {
                5
            } else {
                Self::sgr_rgb_len(new.fg)
            };
        }
        if bg_changed {
            delta_len += if new.bg.a() == 0 {
                5
            } else {
                Self::sgr_rgb_len(new.bg)
            };
        }

        let mut baseline_len = 4u32;
        if new.fg.a() > 0 {
            baseline_len += Self::sgr_rgb_len(new.fg);
        }
        if new.bg.a() > 0 {
            baseline_len += Self::sgr_rgb_len(new.bg);
        }
        baseline_len += Self::sgr_flags_len(new.attrs);

        if delta_len > baseline_len {
            return self.emit_style_full(new);
        }

        // Handle attr removal: emit individual off codes
        if !attrs_removed.is_empty() {
            let collateral = ansi::sgr_flags_off(&mut self.writer, attrs_removed, new.attrs)?;
            // Re-enable any collaterally disabled flags
            if !collateral.is_empty() {
                ansi::sgr_flags(&mut self.writer, collateral)?;
            }
        }

        // Handle attr addition: emit on codes for newly added flags
        if !attrs_added.is_empty() {
            ansi::sgr_flags(&mut self.writer, attrs_added)?;
        }

        // Handle fg color change
        if fg_changed {
            ansi::sgr_fg_packed(&mut self.writer, new.fg)?;
        }

        // Handle bg color change
        if bg_changed {
            ansi::sgr_bg_packed(&mut self.writer, new.bg)?;
        }

        Ok(())
    }

    /// Emit hyperlink changes if the cell link differs from current.
    fn emit_link_changes(&mut self, cell: &Cell, links: Option<&LinkRegistry>) -> io::Result<()> {
        let raw_link_id = cell.attrs.link_id();
        let new_link = if raw_link_id == CellAttrs::LINK_ID_NONE {
            None
        } else {
            Some(raw_link_id)
        };

        // Check if link changed
        if self.current_link == new_link {
            return Ok(());
        }

        // Close current link if open
        if self.current_link.is_some() {
            ansi::hyperlink_end(&mut self.writer)?;
        }

        // Open new link if present and resolvable
        let actually_opened = if let (Some(link_id), Some(registry)) = (new_link, links)
            && let Some(url) = registry.get(link_id)
        {
            ansi::hyperlink_start(&mut self.writer, url)?;
            true
        } else {
            false
        };

        // Only track as current if we actually opened it
        self.current_link = if actually_opened { new_link } else { None };
        Ok(())
    }

    /// Emit cell content (character or grapheme).
    fn emit_content(&mut self, cell: &Cell, pool: Option<&GraphemePool>) -> io::Result<()> {
        // Check if this is a grapheme reference
        if let Some(grapheme_id) = cell.content.grapheme_id() {
            if let Some(pool) = pool
                && let Some(text) = pool.get(grapheme_id)
            {
                return self.writer.write_all(text.as_bytes());
            }
            // Fallback: emit replacement characters matching expected width
            // to maintain cursor synchronization.
            let width = cell.content.width();
            if width > 0 {
                for _ in 0..width {
                    self.writer.write_all(b"?")?;
                }
            }
            return Ok(());
        }

        // Regular character content
        if let Some(ch) = cell.content.as_char() {
            // Sanitize control characters that would break the grid.
            let safe_ch = if ch.is_control() { ' ' } else { ch };
            let mut buf = [0u8; 4];
            let encoded = safe_ch.encode_utf8(&mut buf);
            self.writer.write_all(encoded.as_bytes())
        } else {
            // Empty cell - emit space
            self.writer.write_all(b" ")
        }
    }

    /// Move cursor to the specified position.
    fn move_cursor_to(&mut self, x: u16, y: u16) -> io::Result<()> {
        // Skip if already at position
        if self.cursor_x == Some(x) && self.cursor_y == Some(y) {
            return Ok(());
        }

        // Use CUP (cursor position) for absolute positioning
        ansi::cup(&mut self.writer, y, x)?;
        self.cursor_x = Some(x);
        self.cursor_y = Some(y);
        Ok(())
    }

    /// Move cursor using the cheapest available operation.
    ///
    /// Compares CUP (absolute), CHA (column-only), and CUF (relative forward)
    /// to select the minimum-cost cursor movement.
    fn move_cursor_optimal(&mut self, x: u16, y: u16) -> io::Result<()> {
        // Skip if already at position
        if self.cursor_x == Some(x) && self.cursor_y == Some(y) {
            return Ok(());
        }

        // Decide cheapest move
        let same_row = self.cursor_y == Some(y);
        let forward = same_row && self.cursor_x.is_some_and(|cx| x > cx);

        if same_row && forward {
            let dx = x - self.cursor_x.expect("cursor_x guaranteed by forward check");
            let cuf = cost_model::cuf_cost(dx);
            let cha = cost_model::cha_cost(x);
            let cup = cost_model::cup_cost(y, x);

            if cuf <= cha && cuf <= cup {
                ansi::cuf(&mut self.writer, dx)?;
            } else if cha <= cup {
                ansi::cha(&mut self.writer, x)?;
            } else {
                ansi::cup(&mut self.writer, y, x)?;
            }
        } else if same_row {
            // Same row, backward or same column
            let cha = cost_model::cha_cost(x);
            let cup = cost_model::cup_cost(y, x);
            if cha <= cup {
                ansi::cha(&mut self.writer, x)?;
            } else {
                ansi::cup(&mut self.writer, y, x)?;
            }
        } else {
            // Different row: CUP is the only option
            ansi::cup(&mut self.writer, y, x)?;
        }

        self.cursor_x = Some(x);
        self.cursor_y = Some(y);
        Ok(())
    }

    /// Clear the entire screen.
    pub fn clear_screen(&mut self) -> io::Result<()> {
        ansi::erase_display(&mut self.writer, ansi::EraseDisplayMode::All)?;
        ansi::cup(&mut self.writer, 0, 0)?;
        self.cursor_x = Some(0);
        self.cursor_y = Some(0);
        self.writer.flush()
    }

    /// Clear a single line.
    pub fn clear_line(&mut self, y: u16) -> io::Result<()> {
        self.move_cursor_to(0, y)?;
        ansi::erase_line(&mut self.writer, EraseLineMode::All)?;
        self.writer.flush()
    }

    /// Hide the cursor.
    pub fn hide_cursor(&mut self) -> io::Result<()> {
        ansi::cursor_hide(&mut self.writer)?;
        self.writer.flush()
    }

    /// Show the cursor.
    pub fn show_cursor(&mut self) -> io::Result<()> {
        ansi::cursor_show(&mut self.writer)?;
        self.writer.flush()
    }

    /// Position the cursor at the specified coordinates.
    pub fn position_cursor(&mut self, x: u16, y: u16) -> io::Result<()> {
        self.move_cursor_to(x, y)?;
        self.writer.flush()
    }

    /// Reset the presenter state.
    ///
    /// Useful after resize or when terminal state is unknown.
    pub fn reset(&mut self) {
        self.current_style = None;
        self.current_link = None;
        self.cursor_x = None;
        self.cursor_y = None;
    }

    /// Flush any buffered output.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Get the inner writer (consuming the presenter).
    ///
    /// Flushes any buffered data before returning the writer.
    pub fn into_inner(self) -> Result<W, io::Error> {
        self.writer
            .into_inner() // CountingWriter -> BufWriter<W>
            .into_inner() // BufWriter<W> -> Result<W, IntoInnerError>
            .map_err(|e| e.into_error())
    }
}
