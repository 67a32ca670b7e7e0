//! The screen model: a `Ring` of `Line`s plus the cursor and viewport
//! bookkeeping that turns parsed terminal commands into grid mutations.
//!
//! `Buffer` is the normal-or-alternate half of a [`BufferSet`]; `BufferSet`
//! owns both and the "which one is active" pointer the 47/1047/1049
//! alternate-screen modes flip.

use crate::cell::{Cell, CellFlags, SgrAttrs};
use crate::cursor::{Cursor, SavedCursor};
use crate::line::{cell_has_content, Line};
use crate::ring::Ring;

/// Which rows `erase_in_display` / `erase_in_line` affect, relative to the
/// cursor (mirrors the ED/EL parameter values 0/1/2(/3)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseMode {
    ToEnd,
    ToStart,
    All,
}

/// One screen buffer: its own grid of lines, cursor, and (for the normal
/// buffer only) scrollback history folded into the same `Ring`.
#[derive(Debug, Clone)]
pub struct Buffer {
    cols: u16,
    rows: u16,
    lines: Ring<Line>,
    cursor: Cursor,
    saved_cursor: Option<SavedCursor>,
    /// Index into `lines` of the top visible row when the viewport is
    /// scrolled all the way down to "now".
    y_base: usize,
    /// Index into `lines` of the row currently displayed at the top; equal
    /// to `y_base` unless the user has scrolled back into history.
    y_disp: usize,
    has_scrollback: bool,
    scrollback_capacity: usize,
    /// Attributes used to fill newly exposed cells/lines (erase/scroll).
    pub erase_attrs: SgrAttrs,
}

impl Buffer {
    /// Construct a buffer of `cols` x `rows`. `scrollback_capacity` is
    /// ignored when `has_scrollback` is false (the alternate buffer never
    /// accumulates history, per spec: its `Ring` is sized to exactly `rows`).
    #[must_use]
    pub fn new(cols: u16, rows: u16, scrollback_capacity: usize, has_scrollback: bool) -> Self {
        let max_length = if has_scrollback {
            rows as usize + scrollback_capacity
        } else {
            rows as usize
        };
        let mut lines = Ring::new(max_length);
        for _ in 0..rows {
            lines.push(Line::new(cols, Cell::default()));
        }
        Self {
            cols,
            rows,
            lines,
            cursor: Cursor::new(cols, rows),
            saved_cursor: None,
            y_base: 0,
            y_disp: 0,
            has_scrollback,
            scrollback_capacity,
            erase_attrs: SgrAttrs::default(),
        }
    }

    #[must_use]
    pub fn cols(&self) -> u16 {
        self.cols
    }

    #[must_use]
    pub fn rows(&self) -> u16 {
        self.rows
    }

    #[must_use]
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    #[must_use]
    pub fn y_base(&self) -> usize {
        self.y_base
    }

    #[must_use]
    pub fn y_disp(&self) -> usize {
        self.y_disp
    }

    #[must_use]
    pub fn has_scrollback(&self) -> bool {
        self.has_scrollback
    }

    /// Total number of lines currently retained (visible + history).
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// The viewport row `row` (0..rows), relative to `y_base` (the "live"
    /// bottom-of-history position, not wherever the user scrolled to).
    #[must_use]
    pub fn line(&self, row: u16) -> Option<&Line> {
        self.lines.get(self.y_base + row as usize)
    }

    fn line_mut(&mut self, row: u16) -> Option<&mut Line> {
        self.lines.get_mut(self.y_base + row as usize)
    }

    /// A line addressed by absolute history index (0 = oldest retained),
    /// for scrollback rendering / selection.
    #[must_use]
    pub fn history_line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    #[must_use]
    pub fn cell(&self, row: u16, col: u16) -> Option<&Cell> {
        self.line(row).and_then(|l| l.cell(col))
    }

    /// Mutable access to a single cell, for callers that need to stamp
    /// metadata (e.g. a hyperlink id) onto a cell just written via
    /// [`Buffer::print_char`] without re-deriving its row/col bookkeeping.
    pub fn cell_mut(&mut self, row: u16, col: u16) -> Option<&mut Cell> {
        self.line_mut(row).and_then(|l| l.cell_mut(col))
    }

    fn blank_cell(&self) -> Cell {
        Cell::with_attrs(' ', 1, self.erase_attrs)
    }

    fn blank_line(&self, wrapped: bool) -> Line {
        let mut line = Line::new(self.cols, self.blank_cell());
        line.wrapped = wrapped;
        line
    }

    /// Push a new blank line at the bottom of history, following spec's
    /// "Scroll(wrapped)" full-screen-region case. Returns whether an
    /// eviction of the oldest retained line happened.
    fn push_blank_line(&mut self, wrapped: bool) -> bool {
        let blank = self.blank_line(wrapped);
        let was_following = self.y_disp == self.y_base;
        let evicted = self.lines.push(blank);
        if !evicted {
            self.y_base += 1;
        }
        if was_following {
            self.y_disp = self.y_base;
        }
        evicted
    }

    /// Shift the `region_len` lines starting at absolute index `start` by
    /// `delta` rows (positive = toward the bottom, negative = toward the
    /// top), strictly within `[start, start + region_len)` — lines that
    /// would fall outside the region are dropped rather than spilling into
    /// neighboring rows, and the vacated end fills with blank lines.
    fn shift_region(&mut self, start: usize, region_len: usize, delta: isize) {
        if region_len == 0 || delta == 0 {
            return;
        }
        let region: Vec<Line> = (0..region_len)
            .map(|i| {
                self.lines
                    .get(start + i)
                    .cloned()
                    .unwrap_or_else(|| self.blank_line(false))
            })
            .collect();
        let magnitude = (delta.unsigned_abs()).min(region_len);
        let mut new_region = Vec::with_capacity(region_len);
        if delta > 0 {
            new_region.extend((0..magnitude).map(|_| self.blank_line(false)));
            new_region.extend(region.into_iter().take(region_len - magnitude));
        } else {
            new_region.extend(region.into_iter().skip(magnitude));
            new_region.extend((0..magnitude).map(|_| self.blank_line(false)));
        }
        for (i, line) in new_region.into_iter().enumerate() {
            self.lines.set(start + i, line);
        }
    }

    /// Scroll the current scroll region up by one line. At the full-screen
    /// region this grows history (or evicts the oldest line once at
    /// capacity); for a sub-rectangle scroll region, rows are shifted in
    /// place and the vacated bottom row is blanked.
    pub fn scroll(&mut self, wrapped: bool) {
        let top = self.cursor.scroll_top() as usize;
        let bottom = self.cursor.scroll_bottom() as usize;
        if top == 0 && bottom == self.rows as usize {
            self.push_blank_line(wrapped);
        } else if bottom > top {
            let start = self.y_base + top;
            self.shift_region(start, bottom - top, -1);
        }
    }

    /// Index (IND): move the cursor down one row within the scroll region,
    /// scrolling the region up only once the cursor is already on its
    /// bottom row. Shared by LF/VT/FF, IND, and NEL — none of those should
    /// scroll unconditionally; they scroll only when there is no room left
    /// to simply advance the cursor.
    pub fn index(&mut self) {
        if self.cursor.row + 1 >= self.cursor.scroll_bottom() {
            self.scroll(false);
        } else {
            self.cursor.row += 1;
        }
        self.cursor.pending_wrap = false;
    }

    /// Reverse index (RI): at the scroll region's top row, shift the region
    /// down and blank the top row; otherwise just move the cursor up.
    pub fn reverse_index(&mut self) {
        let top = self.cursor.scroll_top();
        if self.cursor.row == top {
            let bottom = self.cursor.scroll_bottom() as usize;
            let start = self.y_base + top as usize;
            self.shift_region(start, bottom.saturating_sub(top as usize), 1);
        } else {
            self.cursor.move_up(1);
        }
    }

    /// Move the cursor to `left_bound` on the next row, scrolling the
    /// region if already at its bottom, and mark the destination line as a
    /// wrap continuation. Shared by the deferred-wrap check at the top of
    /// `print_char` (consuming a prior `pending_wrap`) and the right-margin
    /// overflow check below it (wrapping a character that doesn't fit).
    fn wrap_cursor_to_next_line(&mut self, left_bound: u16) {
        self.cursor.col = left_bound;
        self.cursor.pending_wrap = false;
        if self.cursor.row + 1 >= self.cursor.scroll_bottom() {
            self.scroll(true);
        } else {
            self.cursor.row += 1;
            if let Some(line) = self.line_mut(self.cursor.row) {
                line.wrapped = true;
            }
        }
    }

    /// Print one character of display width `width` (1 or 2; callers must
    /// route width-0 combining marks elsewhere — they merge into the
    /// previous cell rather than occupying one of their own).
    pub fn print_char(&mut self, ch: char, width: u8, insert_mode: bool, margin_mode: bool) {
        let width = width.max(1);
        let left_bound = if margin_mode { self.cursor.margin_left() } else { 0 };
        let right_bound = if margin_mode {
            self.cursor.margin_right()
        } else {
            self.cols.saturating_sub(1)
        };

        if self.cursor.pending_wrap && self.cursor.autowrap {
            self.wrap_cursor_to_next_line(left_bound);
        }
        if self.cursor.col >= self.cols {
            self.cursor.col = self.cols.saturating_sub(1);
        }

        if i32::from(self.cursor.col) + i32::from(width) - 1 > i32::from(right_bound) {
            if self.cursor.autowrap {
                self.wrap_cursor_to_next_line(left_bound);
            } else if width == 2 {
                return;
            } else {
                self.cursor.col = right_bound;
            }
        }

        if insert_mode {
            let (col, row) = (self.cursor.col, self.cursor.row);
            let fill = self.blank_cell();
            if let Some(line) = self.line_mut(row) {
                line.insert_cells(col, u16::from(width), right_bound, fill);
            }
        }

        let attrs = self.cursor.attrs;
        let (row, col) = (self.cursor.row, self.cursor.col);
        if width == 2 {
            let (lead, cont) = Cell::wide(ch, attrs);
            if let Some(line) = self.line_mut(row) {
                if let Some(cell) = line.cell_mut(col) {
                    *cell = lead;
                }
                if let Some(cell) = line.cell_mut(col + 1) {
                    *cell = cont;
                }
            }
        } else {
            let cell = Cell::with_attrs(ch, width, attrs);
            if let Some(line) = self.line_mut(row) {
                if let Some(slot) = line.cell_mut(col) {
                    *slot = cell;
                }
            }
        }

        self.cursor.col = self.cursor.col.saturating_add(u16::from(width));
        self.cursor.pending_wrap = self.cursor.col >= self.cols;
    }

    /// Erase within the cursor's line (EL 0/1/2).
    pub fn erase_in_line(&mut self, mode: EraseMode) {
        let fill = self.blank_cell();
        let col = self.cursor.col;
        let cols = self.cols;
        let row = self.cursor.row;
        if let Some(line) = self.line_mut(row) {
            match mode {
                EraseMode::ToEnd => line.replace_cells(col, cols, fill),
                EraseMode::ToStart => line.replace_cells(0, col + 1, fill),
                EraseMode::All => line.replace_cells(0, cols, fill),
            }
        }
    }

    /// Erase within the display (ED 0/1/2).
    pub fn erase_in_display(&mut self, mode: EraseMode) {
        let fill = self.blank_cell();
        let (rows, cols) = (self.rows, self.cols);
        match mode {
            EraseMode::ToEnd => {
                self.erase_in_line(EraseMode::ToEnd);
                for row in (self.cursor.row + 1)..rows {
                    if let Some(line) = self.line_mut(row) {
                        line.replace_cells(0, cols, fill);
                    }
                }
            }
            EraseMode::ToStart => {
                self.erase_in_line(EraseMode::ToStart);
                for row in 0..self.cursor.row {
                    if let Some(line) = self.line_mut(row) {
                        line.replace_cells(0, cols, fill);
                    }
                }
            }
            EraseMode::All => {
                for row in 0..rows {
                    if let Some(line) = self.line_mut(row) {
                        line.replace_cells(0, cols, fill);
                    }
                }
            }
        }
    }

    /// ECH — erase `count` characters starting at the cursor, same row.
    pub fn erase_chars(&mut self, count: u16) {
        let fill = self.blank_cell();
        let (col, cols, row) = (self.cursor.col, self.cols, self.cursor.row);
        if let Some(line) = self.line_mut(row) {
            line.replace_cells(col, (col + count).min(cols), fill);
        }
    }

    /// Replace `start..end` of `row` with `fill`, skipping cells carrying
    /// [`CellFlags::PROTECTED`] (DECSED/DECSEL's "selective" half).
    fn selective_replace(&mut self, row: u16, start: u16, end: u16, fill: Cell) {
        if let Some(line) = self.line_mut(row) {
            let end = end.min(line.len());
            for col in start..end {
                if let Some(cell) = line.cell_mut(col) {
                    if !cell.flags.contains(CellFlags::PROTECTED) {
                        *cell = fill;
                    }
                }
            }
        }
    }

    /// DECSED — like [`Buffer::erase_in_display`] but leaves DECSCA-protected
    /// cells untouched.
    pub fn selective_erase_in_display(&mut self, mode: EraseMode) {
        let fill = self.blank_cell();
        let (rows, cols) = (self.rows, self.cols);
        let (row, col) = (self.cursor.row, self.cursor.col);
        match mode {
            EraseMode::ToEnd => {
                self.selective_replace(row, col, cols, fill);
                for r in (row + 1)..rows {
                    self.selective_replace(r, 0, cols, fill);
                }
            }
            EraseMode::ToStart => {
                self.selective_replace(row, 0, col + 1, fill);
                for r in 0..row {
                    self.selective_replace(r, 0, cols, fill);
                }
            }
            EraseMode::All => {
                for r in 0..rows {
                    self.selective_replace(r, 0, cols, fill);
                }
            }
        }
    }

    /// DECSEL — like [`Buffer::erase_in_line`] but leaves protected cells
    /// untouched.
    pub fn selective_erase_in_line(&mut self, mode: EraseMode) {
        let fill = self.blank_cell();
        let (col, cols, row) = (self.cursor.col, self.cols, self.cursor.row);
        match mode {
            EraseMode::ToEnd => self.selective_replace(row, col, cols, fill),
            EraseMode::ToStart => self.selective_replace(row, 0, col + 1, fill),
            EraseMode::All => self.selective_replace(row, 0, cols, fill),
        }
    }

    /// DECERA — erase the rectangle to blanks, ignoring scroll/margin state.
    /// `top`/`left` are 1-based (`0` defaults to the first row/column);
    /// `bottom`/`right` are 1-based inclusive (`0` defaults to the last row
    /// or column).
    pub fn erase_rect_area(&mut self, top: u16, left: u16, bottom: u16, right: u16) {
        let fill = self.blank_cell();
        let (rows, cols) = (self.rows, self.cols);
        let top = top.max(1) - 1;
        let left = left.max(1) - 1;
        let bottom = if bottom == 0 { rows } else { bottom.min(rows) };
        let right = if right == 0 { cols } else { right.min(cols) };
        for row in top..bottom {
            if let Some(line) = self.line_mut(row) {
                line.replace_cells(left, right, fill);
            }
        }
    }

    /// DECFRA — fill the rectangle with `ch`, drawn with the cursor's
    /// current SGR attributes. Same bound conventions as
    /// [`Buffer::erase_rect_area`].
    pub fn fill_rect_area(&mut self, ch: char, top: u16, left: u16, bottom: u16, right: u16) {
        let width = Cell::display_width(ch).max(1);
        let fill = Cell::with_attrs(ch, width, self.cursor.attrs);
        let (rows, cols) = (self.rows, self.cols);
        let top = top.max(1) - 1;
        let left = left.max(1) - 1;
        let bottom = if bottom == 0 { rows } else { bottom.min(rows) };
        let right = if right == 0 { cols } else { right.min(cols) };
        for row in top..bottom {
            if let Some(line) = self.line_mut(row) {
                let right = right.min(line.len());
                for col in left..right {
                    if let Some(cell) = line.cell_mut(col) {
                        *cell = fill;
                    }
                }
            }
        }
    }

    /// DECCRA — copy the source rectangle to a destination whose top-left is
    /// `(dst_top, dst_left)` (1-based). Overlapping source/destination
    /// ranges are handled correctly by snapshotting the source first.
    pub fn copy_rect_area(
        &mut self,
        src_top: u16,
        src_left: u16,
        src_bottom: u16,
        src_right: u16,
        dst_top: u16,
        dst_left: u16,
    ) {
        let (rows, cols) = (self.rows, self.cols);
        let top = src_top.max(1) - 1;
        let left = src_left.max(1) - 1;
        let bottom = if src_bottom == 0 { rows } else { src_bottom.min(rows) };
        let right = if src_right == 0 { cols } else { src_right.min(cols) };
        if top >= bottom || left >= right {
            return;
        }
        let dst_top = dst_top.max(1) - 1;
        let dst_left = dst_left.max(1) - 1;
        let snapshot: Vec<Vec<Cell>> = (top..bottom)
            .map(|r| {
                self.line(r)
                    .map(|line| line.cells()[left as usize..right as usize].to_vec())
                    .unwrap_or_default()
            })
            .collect();
        for (i, src_row) in snapshot.into_iter().enumerate() {
            let dst_row = dst_top + i as u16;
            if dst_row >= rows {
                break;
            }
            if let Some(line) = self.line_mut(dst_row) {
                for (j, cell) in src_row.into_iter().enumerate() {
                    let dst_col = dst_left + j as u16;
                    if dst_col >= cols {
                        break;
                    }
                    if let Some(target) = line.cell_mut(dst_col) {
                        *target = cell;
                    }
                }
            }
        }
    }

    /// DECIC — insert `count` blank columns at the cursor, across every row
    /// in the scroll region, honoring the right margin (same shifting rule
    /// as [`Buffer::insert_chars`]'s margin-mode case).
    pub fn insert_columns(&mut self, count: u16) {
        let fill = self.blank_cell();
        let (col, right_bound) = (self.cursor.col, self.cursor.margin_right());
        let (top, bottom) = (self.cursor.scroll_top(), self.cursor.scroll_bottom());
        for row in top..bottom {
            if let Some(line) = self.line_mut(row) {
                line.insert_cells(col, count, right_bound, fill);
            }
        }
    }

    /// DECDC — delete `count` columns at the cursor, across every row in the
    /// scroll region.
    pub fn delete_columns(&mut self, count: u16) {
        let fill = self.blank_cell();
        let col = self.cursor.col;
        let (top, bottom) = (self.cursor.scroll_top(), self.cursor.scroll_bottom());
        for row in top..bottom {
            if let Some(line) = self.line_mut(row) {
                line.delete_cells(col, count, fill);
            }
        }
    }

    /// ICH — insert `count` blank cells at the cursor (shifts right, drops
    /// overflow at the right margin).
    pub fn insert_chars(&mut self, count: u16, margin_mode: bool) {
        let fill = self.blank_cell();
        let right_bound = if margin_mode {
            self.cursor.margin_right()
        } else {
            self.cols.saturating_sub(1)
        };
        let (col, row) = (self.cursor.col, self.cursor.row);
        if let Some(line) = self.line_mut(row) {
            line.insert_cells(col, count, right_bound, fill);
        }
    }

    /// DCH — delete `count` cells at the cursor (shifts left, blanks the
    /// vacated right edge).
    pub fn delete_chars(&mut self, count: u16) {
        let fill = self.blank_cell();
        let (col, row) = (self.cursor.col, self.cursor.row);
        if let Some(line) = self.line_mut(row) {
            line.delete_cells(col, count, fill);
        }
    }

    /// IL — insert `count` blank lines at the cursor row within the scroll
    /// region, pushing lines below it down and dropping overflow at the
    /// region's bottom.
    pub fn insert_lines(&mut self, count: u16) {
        let top = self.cursor.row;
        let bottom = self.cursor.scroll_bottom();
        if top >= bottom {
            return;
        }
        let region_len = (bottom - top) as usize;
        let start = self.y_base + top as usize;
        self.shift_region(start, region_len, isize::from(count));
    }

    /// DL — delete `count` lines at the cursor row within the scroll
    /// region, pulling lines below it up and blanking the vacated bottom.
    pub fn delete_lines(&mut self, count: u16) {
        let top = self.cursor.row;
        let bottom = self.cursor.scroll_bottom();
        if top >= bottom {
            return;
        }
        let region_len = (bottom - top) as usize;
        let start = self.y_base + top as usize;
        self.shift_region(start, region_len, -isize::from(count));
    }

    /// DECSC: snapshot the cursor into this buffer's saved-cursor slot.
    pub fn save_cursor(&mut self) {
        self.saved_cursor = Some(self.cursor.save());
    }

    /// DECRC: restore the cursor from this buffer's saved-cursor slot, if
    /// one was ever captured; otherwise a no-op.
    pub fn restore_cursor(&mut self) {
        if let Some(saved) = self.saved_cursor {
            self.cursor.restore(&saved);
        }
    }

    #[must_use]
    pub fn saved_cursor(&self) -> Option<SavedCursor> {
        self.saved_cursor
    }

    pub fn set_saved_cursor(&mut self, saved: Option<SavedCursor>) {
        self.saved_cursor = saved;
    }

    /// Scroll the viewport (user scrollback navigation); `y_disp` is
    /// clamped to `[0, y_base]`.
    pub fn scroll_viewport_to(&mut self, y_disp: usize) {
        self.y_disp = y_disp.min(self.y_base);
    }

    /// Change this buffer's tab-stop spacing, regenerating the default
    /// stops at the new width (see [`crate::cursor::Cursor::set_tab_stop_width`]).
    pub fn set_tab_stop_width(&mut self, width: u16) {
        let cols = self.cols;
        self.cursor.set_tab_stop_width(width, cols);
    }

    /// ED 3 (erase scrollback): drop every history row above the live
    /// viewport, re-anchoring `y_base`/`y_disp` to 0. The visible rows and
    /// cursor position are untouched.
    pub fn erase_scrollback(&mut self) {
        if self.y_base == 0 {
            return;
        }
        self.lines.trim_start(self.y_base);
        self.y_base = 0;
        self.y_disp = 0;
    }

    /// Clear every cell in the buffer and reset the scrollback/viewport to
    /// empty (used when entering/leaving the alternate buffer, and by RIS).
    pub fn reset_contents(&mut self) {
        let max_length = self.lines.max_length();
        self.lines = Ring::new(max_length);
        for _ in 0..self.rows {
            self.lines.push(Line::new(self.cols, self.blank_cell()));
        }
        self.y_base = 0;
        self.y_disp = 0;
    }

    /// Resize to `new_cols` x `new_rows`. The scrollback-bearing buffer
    /// reflows wrapped content to the new column count; the alternate
    /// buffer (no scrollback) just truncates/extends rows and columns.
    pub fn resize(&mut self, new_cols: u16, new_rows: u16) {
        if self.has_scrollback && new_cols != self.cols {
            self.reflow(new_cols);
        } else if new_cols != self.cols {
            for i in 0..self.lines.len() {
                if let Some(line) = self.lines.get_mut(i) {
                    line.resize(new_cols, self.blank_cell());
                }
            }
        }
        self.cols = new_cols;
        self.resize_rows(new_rows);
        self.cursor.resize(new_cols, new_rows);
    }

    fn resize_rows(&mut self, new_rows: u16) {
        let max_length = if self.has_scrollback {
            new_rows as usize + self.scrollback_capacity
        } else {
            new_rows as usize
        };
        self.lines.set_max_length(max_length);
        while self.lines.len() < new_rows as usize {
            self.lines.push(Line::new(self.cols, self.blank_cell()));
        }
        self.rows = new_rows;
        self.y_base = self.lines.len().saturating_sub(new_rows as usize);
        self.y_disp = self.y_disp.min(self.y_base);
    }

    /// Logically concatenate wrapped runs and re-wrap them at `new_cols`,
    /// per spec's `reflow_wider`/`reflow_narrower` (the same operation
    /// services both directions: growing re-wraps into fewer, longer
    /// lines; shrinking re-wraps into more, shorter ones).
    fn reflow(&mut self, new_cols: u16) {
        let old_cols = self.cols;
        let old_lines: Vec<Line> = self.lines.iter().cloned().collect();
        let cursor_abs = self.y_base + self.cursor.row as usize;
        let cursor_col = self.cursor.col;
        let y_disp_abs = self.y_disp;
        let saved_abs = self.saved_cursor.map(|s| (self.y_base + s.row as usize, s.col));

        let fill = self.blank_cell();
        let mut new_lines: Vec<Line> = Vec::new();
        let mut mappings: Vec<ParagraphMap> = Vec::new();

        let mut i = 0;
        while i < old_lines.len() {
            let para_start = i;
            let mut cells: Vec<Cell> = old_lines[i].cells().to_vec();
            i += 1;
            while i < old_lines.len() && old_lines[i].wrapped {
                cells.extend_from_slice(old_lines[i].cells());
                i += 1;
            }
            let para_end = i;

            let min_len = paragraph_min_len(cursor_abs, para_start, para_end, old_cols, cursor_col)
                .max(trimmed_cell_len(&cells));
            cells.truncate(cells.len().max(min_len));
            while cells.len() > min_len && !cell_has_content(&cells[cells.len() - 1]) {
                cells.pop();
            }

            let new_start = new_lines.len();
            let mut rewrapped = rewrap_cells(&cells, new_cols, fill);
            let new_count = rewrapped.len();
            new_lines.append(&mut rewrapped);

            mappings.push(ParagraphMap {
                old_start: para_start,
                old_cols,
                new_start,
                new_count,
                new_cols,
            });
        }

        if new_lines.is_empty() {
            new_lines.push(Line::new(new_cols, fill));
            mappings.push(ParagraphMap {
                old_start: 0,
                old_cols,
                new_start: 0,
                new_count: 1,
                new_cols,
            });
        }

        let max_length = if self.has_scrollback {
            self.rows as usize + self.scrollback_capacity
        } else {
            new_lines.len()
        };
        let dropped = new_lines.len().saturating_sub(max_length.max(1));
        if dropped > 0 {
            new_lines.drain(0..dropped);
        }

        let map_abs = |abs: usize, col: u16| -> (usize, u16) {
            for pm in &mappings {
                if abs >= pm.old_start && abs < pm.old_start + pm_old_count(pm, &old_lines) {
                    let (row, c) = pm.map(abs, col);
                    return (row.saturating_sub(dropped), c);
                }
            }
            (0, 0)
        };

        let (new_cursor_abs, new_cursor_col) = map_abs(cursor_abs, cursor_col);
        let new_y_disp = map_abs(y_disp_abs, 0).0;

        self.lines = Ring::new(max_length);
        for line in new_lines {
            self.lines.push(line);
        }

        self.y_base = self.lines.len().saturating_sub(self.rows as usize);
        self.y_disp = new_y_disp.min(self.y_base);
        self.cursor.row = new_cursor_abs.saturating_sub(self.y_base).min(self.rows.saturating_sub(1)) as u16;
        self.cursor.col = new_cursor_col;

        if let Some((abs, col)) = saved_abs {
            let (new_abs, new_col) = map_abs(abs, col);
            if let Some(saved) = self.saved_cursor.as_mut() {
                saved.row = new_abs.saturating_sub(self.y_base) as u16;
                saved.col = new_col;
            }
        }
    }
}

struct ParagraphMap {
    old_start: usize,
    old_cols: u16,
    new_start: usize,
    new_count: usize,
    new_cols: u16,
}

impl ParagraphMap {
    fn map(&self, abs: usize, col: u16) -> (usize, u16) {
        let rel_row = abs - self.old_start;
        let offset = rel_row * self.old_cols as usize + col as usize;
        let new_cols = self.new_cols.max(1) as usize;
        let dest_line = (offset / new_cols).min(self.new_count.saturating_sub(1));
        let dest_col = (offset % new_cols) as u16;
        (self.new_start + dest_line, dest_col)
    }
}

fn pm_old_count(pm: &ParagraphMap, old_lines: &[Line]) -> usize {
    let mut count = 1;
    let mut i = pm.old_start + 1;
    while i < old_lines.len() && old_lines[i].wrapped {
        count += 1;
        i += 1;
    }
    count
}

fn paragraph_min_len(
    cursor_abs: usize,
    para_start: usize,
    para_end: usize,
    old_cols: u16,
    cursor_col: u16,
) -> usize {
    if cursor_abs >= para_start && cursor_abs < para_end {
        (cursor_abs - para_start) * old_cols as usize + cursor_col as usize + 1
    } else {
        0
    }
}

fn trimmed_cell_len(cells: &[Cell]) -> usize {
    for (i, cell) in cells.iter().enumerate().rev() {
        if cell_has_content(cell) {
            return i + usize::from(cell.width().max(1));
        }
    }
    0
}

/// Re-wrap a flat cell sequence into lines of `new_cols` width, never
/// splitting a wide character's leading/continuation pair across a line
/// boundary (the whole pair moves to the start of the next line instead).
fn rewrap_cells(cells: &[Cell], new_cols: u16, fill: Cell) -> Vec<Line> {
    let new_cols_usize = (new_cols as usize).max(1);
    if cells.is_empty() {
        return vec![Line::new(new_cols, fill)];
    }
    let mut lines = Vec::new();
    let mut idx = 0;
    while idx < cells.len() {
        let mut take = new_cols_usize.min(cells.len() - idx);
        if take == new_cols_usize && take > 0 && cells[idx + take - 1].is_wide() {
            take -= 1;
        }
        let take = take.max(1);
        let mut line_cells: Vec<Cell> = cells[idx..(idx + take).min(cells.len())].to_vec();
        line_cells.resize(new_cols_usize, fill);
        lines.push(Line::from_cells(line_cells, idx > 0));
        idx += take;
    }
    lines
}

/// `normal` (scrollback-enabled) and `alternate` (no scrollback) buffers,
/// with a pointer to whichever is active.
#[derive(Debug, Clone)]
pub struct BufferSet {
    pub normal: Buffer,
    pub alternate: Buffer,
    active_is_alternate: bool,
}

impl BufferSet {
    #[must_use]
    pub fn new(cols: u16, rows: u16, scrollback_capacity: usize) -> Self {
        Self {
            normal: Buffer::new(cols, rows, scrollback_capacity, true),
            alternate: Buffer::new(cols, rows, 0, false),
            active_is_alternate: false,
        }
    }

    /// Change the tab-stop spacing on both buffers.
    pub fn set_tab_stop_width(&mut self, width: u16) {
        self.normal.set_tab_stop_width(width);
        self.alternate.set_tab_stop_width(width);
    }

    #[must_use]
    pub fn active(&self) -> &Buffer {
        if self.active_is_alternate {
            &self.alternate
        } else {
            &self.normal
        }
    }

    pub fn active_mut(&mut self) -> &mut Buffer {
        if self.active_is_alternate {
            &mut self.alternate
        } else {
            &mut self.normal
        }
    }

    #[must_use]
    pub fn is_alternate(&self) -> bool {
        self.active_is_alternate
    }

    /// Enter the alternate buffer (modes 47/1047/1049). The cursor position
    /// carries over; the alternate buffer's contents are cleared with
    /// `fill_attrs` as the background. A no-op if already in the alternate
    /// buffer.
    pub fn enter_alternate(&mut self, fill_attrs: SgrAttrs) {
        if self.active_is_alternate {
            return;
        }
        let cursor = self.normal.cursor;
        self.alternate.erase_attrs = fill_attrs;
        self.alternate.reset_contents();
        self.alternate.cursor = cursor;
        self.active_is_alternate = true;
    }

    /// Leave the alternate buffer, clearing it and (optionally — mode
    /// 1048/1049) restoring the normal buffer's saved cursor. A no-op if
    /// already in the normal buffer.
    pub fn leave_alternate(&mut self, restore_cursor: bool) {
        if !self.active_is_alternate {
            return;
        }
        self.active_is_alternate = false;
        if restore_cursor {
            self.normal.restore_cursor();
        }
        self.alternate.reset_contents();
    }

    /// Resize both buffers to the new dimensions.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.normal.resize(cols, rows);
        self.alternate.resize(cols, rows);
    }
}
