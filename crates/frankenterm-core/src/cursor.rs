//! Cursor position, pending-wrap state, scroll region, tab stops, and the
//! per-buffer charset/mode flags that travel with the cursor (autowrap,
//! origin mode, reverse-wraparound) plus DECSC/DECRC save/restore.

use crate::cell::SgrAttrs;
use crate::charset::CharsetId;

/// Cursor state for one buffer (normal or alternate each own one).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    /// Row, `0..rows`.
    pub row: u16,
    /// Column, `0..cols`. Never reaches `cols` directly; an autowrap-pending
    /// print instead sets [`Cursor::pending_wrap`] and leaves `col` at the
    /// last column, per spec's "x may reach cols, leaving autowrap pending".
    pub col: u16,
    /// Set when the last print left the cursor at the right margin with
    /// autowrap armed; the next printable character wraps before drawing.
    pub pending_wrap: bool,
    /// Current SGR attributes applied to newly printed/erased cells.
    pub attrs: SgrAttrs,
    /// Cursor visibility (DECTCEM).
    pub visible: bool,
    /// Autowrap mode (DECAWM).
    pub autowrap: bool,
    /// Reverse-wraparound: BS at the left margin wraps to the previous line.
    pub reverse_wraparound: bool,
    /// Origin mode (DECOM): cursor addressing is relative to the scroll
    /// region when set.
    pub origin_mode: bool,
    /// G0..G3 charset designations.
    pub charsets: [CharsetId; 4],
    /// Currently selected slot (GL), 0..=3.
    pub charset_g_level: u8,
    /// Pending single-shift slot (SS2/SS3): overrides `charset_g_level` for
    /// exactly the next printed character.
    pub single_shift: Option<u8>,
    /// DECSCA: newly printed cells are marked protected while set, so
    /// DECSED/DECSEL skip them.
    pub char_protect: bool,
    scroll_top: u16,
    scroll_bottom: u16,
    margin_left: u16,
    margin_right: u16,
    tab_stops: Vec<u16>,
    tab_stop_width: u16,
}

/// Snapshot captured by DECSC, restored by DECRC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavedCursor {
    pub row: u16,
    pub col: u16,
    pub attrs: SgrAttrs,
    pub charsets: [CharsetId; 4],
    pub charset_g_level: u8,
    pub origin_mode: bool,
    pub autowrap: bool,
    pub reverse_wraparound: bool,
}

/// Home position/defaults DECSC saves before any cursor has moved — also
/// what an unconditioned DECRC restores to.
impl Default for SavedCursor {
    fn default() -> Self {
        Self {
            row: 0,
            col: 0,
            attrs: SgrAttrs::default(),
            charsets: [CharsetId::Ascii; 4],
            charset_g_level: 0,
            origin_mode: false,
            autowrap: true,
            reverse_wraparound: false,
        }
    }
}

impl SavedCursor {
    /// Capture a DECSC snapshot from a cursor plus the buffer-level origin
    /// mode flag (origin mode lives on [`crate::modes::Modes`] in some
    /// callers rather than mirrored onto `Cursor`).
    #[must_use]
    pub fn save(cursor: &Cursor, origin_mode: bool) -> Self {
        Self {
            row: cursor.row,
            col: cursor.col,
            attrs: cursor.attrs,
            charsets: cursor.charsets,
            charset_g_level: cursor.charset_g_level,
            origin_mode,
            autowrap: cursor.autowrap,
            reverse_wraparound: cursor.reverse_wraparound,
        }
    }

    /// Restore this snapshot onto `cursor` (DECRC).
    pub fn restore(&self, cursor: &mut Cursor) {
        cursor.restore(self);
    }
}

pub(crate) const DEFAULT_TAB_WIDTH: u16 = 8;

impl Cursor {
    /// Create a cursor for a buffer of the given dimensions, at (0,0), with
    /// default tab stops every 8 columns and a full-screen scroll region.
    #[must_use]
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            row: 0,
            col: 0,
            pending_wrap: false,
            attrs: SgrAttrs::default(),
            visible: true,
            autowrap: true,
            reverse_wraparound: false,
            origin_mode: false,
            charsets: [CharsetId::Ascii; 4],
            charset_g_level: 0,
            single_shift: None,
            char_protect: false,
            scroll_top: 0,
            scroll_bottom: rows.max(1),
            margin_left: 0,
            margin_right: cols.saturating_sub(1),
            tab_stops: default_tab_stops(cols, DEFAULT_TAB_WIDTH),
            tab_stop_width: DEFAULT_TAB_WIDTH,
        }
    }

    /// Minimal constructor at an arbitrary (possibly out-of-bounds) position,
    /// used by callers that immediately clamp (e.g. fuzzing/property tests).
    #[must_use]
    pub fn at(row: u16, col: u16) -> Self {
        Self {
            row,
            col,
            ..Self::new(1, 1)
        }
    }

    /// Clamp the cursor to lie within `0..rows` x `0..cols`.
    pub fn clamp(&mut self, rows: u16, cols: u16) {
        self.row = self.row.min(rows.saturating_sub(1));
        self.col = self.col.min(cols.saturating_sub(1));
    }

    /// Move to an absolute position, clamped to bounds, clearing pending wrap.
    pub fn move_to(&mut self, row: u16, col: u16, rows: u16, cols: u16) {
        self.row = row.min(rows.saturating_sub(1));
        self.col = col.min(cols.saturating_sub(1));
        self.pending_wrap = false;
    }

    /// Move up `n` rows, clamped at row 0 (ignores scroll region; callers
    /// that need origin-mode clamping do so at the `Buffer` level).
    pub fn move_up(&mut self, n: u16) {
        self.row = self.row.saturating_sub(n);
        self.pending_wrap = false;
    }

    /// Move down `n` rows, clamped at `rows - 1`.
    pub fn move_down(&mut self, n: u16, rows: u16) {
        self.row = (self.row.saturating_add(n)).min(rows.saturating_sub(1));
        self.pending_wrap = false;
    }

    /// Move left `n` columns, clamped at column 0.
    pub fn move_left(&mut self, n: u16) {
        self.col = self.col.saturating_sub(n);
        self.pending_wrap = false;
    }

    /// Move right `n` columns, clamped at `cols - 1`.
    pub fn move_right(&mut self, n: u16, cols: u16) {
        self.col = (self.col.saturating_add(n)).min(cols.saturating_sub(1));
        self.pending_wrap = false;
    }

    /// Carriage return: move to the left margin, clearing pending wrap.
    pub fn carriage_return(&mut self) {
        self.col = self.margin_left;
        self.pending_wrap = false;
    }

    /// Set the scrolling region (`bottom` is exclusive). Invalid bounds
    /// (`top >= bottom` or `bottom > rows`) reset to the full-screen region.
    pub fn set_scroll_region(&mut self, top: u16, bottom: u16, rows: u16) {
        let bottom = bottom.min(rows);
        if top < bottom {
            self.scroll_top = top;
            self.scroll_bottom = bottom;
        } else {
            self.scroll_top = 0;
            self.scroll_bottom = rows;
        }
    }

    /// Top row of the scroll region (inclusive).
    #[must_use]
    pub fn scroll_top(&self) -> u16 {
        self.scroll_top
    }

    /// Bottom of the scroll region (exclusive — one past the last row).
    #[must_use]
    pub fn scroll_bottom(&self) -> u16 {
        self.scroll_bottom
    }

    /// Set the left/right margin (DECSLRM). `right` is inclusive.
    pub fn set_left_right_margin(&mut self, left: u16, right: u16, cols: u16) {
        let right = right.min(cols.saturating_sub(1));
        if left < right {
            self.margin_left = left;
            self.margin_right = right;
        } else {
            self.margin_left = 0;
            self.margin_right = cols.saturating_sub(1);
        }
    }

    /// Left margin column (inclusive).
    #[must_use]
    pub fn margin_left(&self) -> u16 {
        self.margin_left
    }

    /// Right margin column (inclusive).
    #[must_use]
    pub fn margin_right(&self) -> u16 {
        self.margin_right
    }

    /// Reset margins to the full width (used by DECCOLM and RIS).
    pub fn reset_margins(&mut self, cols: u16) {
        self.margin_left = 0;
        self.margin_right = cols.saturating_sub(1);
    }

    /// Next set tab stop strictly right of the cursor, or the right bound
    /// (`cols - 1`) if none is set further right.
    #[must_use]
    pub fn next_tab_stop(&self, cols: u16) -> u16 {
        let right = cols.saturating_sub(1);
        self.tab_stops
            .iter()
            .copied()
            .find(|&stop| stop > self.col && stop <= right)
            .unwrap_or(right)
    }

    /// Previous set tab stop strictly left of the cursor, or 0.
    #[must_use]
    pub fn prev_tab_stop(&self) -> u16 {
        self.tab_stops
            .iter()
            .rev()
            .copied()
            .find(|&stop| stop < self.col)
            .unwrap_or(0)
    }

    /// Set a tab stop at the current column (HTS).
    pub fn set_tab_stop(&mut self) {
        if let Err(pos) = self.tab_stops.binary_search(&self.col) {
            self.tab_stops.insert(pos, self.col);
        }
    }

    /// Clear the tab stop at the current column (TBC mode 0).
    pub fn clear_tab_stop(&mut self) {
        if let Ok(pos) = self.tab_stops.binary_search(&self.col) {
            self.tab_stops.remove(pos);
        }
    }

    /// Clear every tab stop (TBC mode 3/5).
    pub fn clear_all_tab_stops(&mut self) {
        self.tab_stops.clear();
    }

    /// Reinstall the default tab stops, spaced every `tab_stop_width`
    /// columns (used by RIS).
    pub fn reset_tab_stops(&mut self, cols: u16) {
        self.tab_stops = default_tab_stops(cols, self.tab_stop_width);
    }

    /// Change the tab-stop spacing (set once at `Terminal` construction from
    /// [`crate::term::Config::tab_stop_width`]) and regenerate the default
    /// stops at the new width.
    pub fn set_tab_stop_width(&mut self, width: u16, cols: u16) {
        self.tab_stop_width = width.max(1);
        self.tab_stops = default_tab_stops(cols, self.tab_stop_width);
    }

    /// Adjust for a resize: clamp position, reset the scroll region and
    /// margins to the new full width, and drop tab stops beyond the new
    /// column count.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.clamp(rows, cols);
        self.scroll_top = 0;
        self.scroll_bottom = rows;
        self.margin_left = 0;
        self.margin_right = cols.saturating_sub(1);
        self.tab_stops.retain(|&stop| stop < cols);
    }

    /// Capture a DECSC snapshot.
    #[must_use]
    pub fn save(&self) -> SavedCursor {
        SavedCursor {
            row: self.row,
            col: self.col,
            attrs: self.attrs,
            charsets: self.charsets,
            charset_g_level: self.charset_g_level,
            origin_mode: self.origin_mode,
            autowrap: self.autowrap,
            reverse_wraparound: self.reverse_wraparound,
        }
    }

    /// Restore a DECSC snapshot (DECRC).
    pub fn restore(&mut self, saved: &SavedCursor) {
        self.row = saved.row;
        self.col = saved.col;
        self.attrs = saved.attrs;
        self.charsets = saved.charsets;
        self.charset_g_level = saved.charset_g_level;
        self.origin_mode = saved.origin_mode;
        self.autowrap = saved.autowrap;
        self.reverse_wraparound = saved.reverse_wraparound;
        self.pending_wrap = false;
    }

    /// The charset currently selected via `GL` (the active G-slot).
    #[must_use]
    pub fn active_charset(&self) -> CharsetId {
        self.charsets[self.charset_g_level as usize & 0b11]
    }

    /// The charset that applies to the *next* printed character: a pending
    /// single shift (SS2/SS3) overrides the locked `GL` slot for one
    /// character only.
    #[must_use]
    pub fn effective_charset(&self) -> CharsetId {
        match self.single_shift {
            Some(slot) => self.charsets[slot as usize & 0b11],
            None => self.active_charset(),
        }
    }

    /// Consume a pending single shift after it has applied to one character.
    /// A no-op if no single shift is pending.
    pub fn consume_single_shift(&mut self) {
        self.single_shift = None;
    }

    /// Designate a charset into a G-slot (`ESC ( B`, `ESC ) 0`, etc.).
    pub fn designate_charset(&mut self, slot: u8, charset: CharsetId) {
        if let Some(entry) = self.charsets.get_mut(slot as usize & 0b11) {
            *entry = charset;
        }
    }

    /// Reset all G-slots to ASCII, select G0, and clear any pending single
    /// shift (used by DECSTR and RIS).
    pub fn reset_charset(&mut self) {
        self.charsets = [CharsetId::Ascii; 4];
        self.charset_g_level = 0;
        self.single_shift = None;
    }

    /// Reset the scroll region to the full screen (used by DECSTR, which
    /// resets the region without touching margins the way a resize does).
    pub fn reset_scroll_region(&mut self, rows: u16) {
        self.scroll_top = 0;
        self.scroll_bottom = rows;
    }
}

fn default_tab_stops(cols: u16, width: u16) -> Vec<u16> {
    let width = width.max(1);
    let mut stops = Vec::new();
    let mut col = width;
    while col < cols {
        stops.push(col);
        col += width;
    }
    stops
}
