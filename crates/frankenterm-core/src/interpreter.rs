//! Dispatch layer: turns parsed [`crate::parser::Action`]s into mutations on
//! a [`BufferSet`], driving [`Modes`] and calling back into a [`Delegate`]
//! for anything host-visible (replies, title changes, bell, …).

use crate::buffer::{BufferSet, EraseMode};
use crate::cell::{Cell, CellFlags, HyperlinkId, HyperlinkRegistry, SgrAttrs};
use crate::charset::translate_charset;
use crate::cursor::{SavedCursor, DEFAULT_TAB_WIDTH};
use crate::delegate::{Delegate, MouseReportMode};
use crate::modes::{AnsiModes, DecModes, Modes};
use crate::parser::Action;
use crate::patch::DirtyTracker;

/// Owns terminal-wide state that sits above a single buffer: mode flags,
/// the hyperlink side table, and dirty-row bookkeeping for hosts that want
/// incremental redraws without diffing the whole grid every frame.
pub struct Interpreter {
    pub buffers: BufferSet,
    pub modes: Modes,
    pub hyperlinks: HyperlinkRegistry,
    dirty: DirtyTracker,
    last_printed: Option<char>,
    current_hyperlink: HyperlinkId,
    /// `Config::convert_eol`: translate a bare LF into CRLF on print.
    convert_eol: bool,
    /// `Config::tab_stop_width`: reapplied to fresh buffers on RIS, since a
    /// full reset rebuilds `BufferSet` (and its cursors) from scratch.
    tab_stop_width: u16,
}

impl Interpreter {
    #[must_use]
    pub fn new(cols: u16, rows: u16, scrollback_capacity: usize) -> Self {
        Self {
            buffers: BufferSet::new(cols, rows, scrollback_capacity),
            modes: Modes::new(),
            hyperlinks: HyperlinkRegistry::new(),
            dirty: DirtyTracker::new(cols, rows),
            last_printed: None,
            current_hyperlink: 0,
            convert_eol: false,
            tab_stop_width: DEFAULT_TAB_WIDTH,
        }
    }

    /// Set whether a bare LF is translated into CRLF on print (spec's
    /// `convert_eol`), independent of the LNM (ANSI linefeed/newline) mode.
    pub fn set_convert_eol(&mut self, enabled: bool) {
        self.convert_eol = enabled;
    }

    /// Change the tab-stop spacing on both buffers and remember it so a
    /// subsequent RIS (which rebuilds `BufferSet` from scratch) reapplies it
    /// instead of silently reverting to the 8-column default.
    pub fn set_tab_stop_width(&mut self, width: u16) {
        self.tab_stop_width = width.max(1);
        self.buffers.set_tab_stop_width(self.tab_stop_width);
    }

    #[must_use]
    pub fn cols(&self) -> u16 {
        self.buffers.active().cols()
    }

    #[must_use]
    pub fn rows(&self) -> u16 {
        self.buffers.active().rows()
    }

    /// Rows mutated since the last [`Interpreter::clear_dirty`] call.
    #[must_use]
    pub fn dirty(&self) -> &DirtyTracker {
        &self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.buffers.resize(cols, rows);
        self.dirty.resize(cols, rows);
    }

    /// RIS — full reset: fresh buffers, default modes, cleared hyperlinks.
    pub fn full_reset(&mut self) {
        let cols = self.cols();
        let rows = self.rows();
        let scrollback_capacity = 0; // buffers already own their own capacity; resize keeps it
        let _ = scrollback_capacity;
        self.buffers = BufferSet::new(cols, rows, self.scrollback_capacity_hint());
        self.buffers.set_tab_stop_width(self.tab_stop_width);
        self.modes.reset();
        self.hyperlinks.clear();
        self.current_hyperlink = 0;
        self.last_printed = None;
        self.dirty = DirtyTracker::new(cols, rows);
    }

    fn scrollback_capacity_hint(&self) -> usize {
        // Preserve whatever capacity the normal buffer already carries;
        // `BufferSet`/`Buffer` don't expose it directly, so a fresh
        // terminal-default-sized history is used instead. Hosts wanting an
        // exact carry-over should reconstruct `Interpreter::new` themselves.
        1000
    }

    /// DECSTR — soft reset: modes/attributes/scroll region/charset revert,
    /// but the screen, scrollback, and cursor position are untouched.
    pub fn soft_reset(&mut self) {
        self.modes = Modes::new();
        let rows = self.rows();
        let buffer = self.buffers.active_mut();
        buffer.cursor_mut().attrs = SgrAttrs::default();
        buffer.cursor_mut().reset_scroll_region(rows);
        buffer.cursor_mut().pending_wrap = false;
        buffer.cursor_mut().reset_charset();
        buffer.cursor_mut().visible = true;
        buffer.cursor_mut().char_protect = false;
    }

    /// Apply one parsed action, driving buffer mutation and delegate
    /// callbacks as appropriate. This is the engine's single dispatch point.
    pub fn apply(&mut self, action: Action, delegate: &mut dyn Delegate) {
        match action {
            Action::Print(ch) => self.apply_print(ch),
            Action::Newline => self.apply_newline(delegate),
            Action::CarriageReturn => {
                self.buffers.active_mut().cursor_mut().carriage_return();
            }
            Action::Tab => {
                let cols = self.cols();
                let cursor = self.buffers.active_mut().cursor_mut();
                cursor.col = cursor.next_tab_stop(cols);
                cursor.pending_wrap = false;
            }
            Action::Backspace => {
                let reverse = self.buffers.active().cursor().reverse_wraparound;
                let cursor = self.buffers.active_mut().cursor_mut();
                if cursor.col == 0 && reverse {
                    // Reverse-wraparound: BS at the left margin backs onto
                    // the previous line's right margin; clamp at row 0.
                    if cursor.row > 0 {
                        cursor.row -= 1;
                        cursor.col = cursor.margin_right();
                    }
                } else {
                    cursor.move_left(1);
                }
            }
            Action::Bell => delegate.bell(),
            Action::CursorUp(n) => self.buffers.active_mut().cursor_mut().move_up(n),
            Action::CursorDown(n) => {
                let rows = self.rows();
                self.buffers.active_mut().cursor_mut().move_down(n, rows);
            }
            Action::CursorRight(n) => {
                let cols = self.cols();
                self.buffers.active_mut().cursor_mut().move_right(n, cols);
            }
            Action::CursorLeft(n) => self.buffers.active_mut().cursor_mut().move_left(n),
            Action::CursorNextLine(n) => {
                let rows = self.rows();
                let cursor = self.buffers.active_mut().cursor_mut();
                cursor.move_down(n, rows);
                cursor.col = 0;
            }
            Action::CursorPrevLine(n) => {
                let cursor = self.buffers.active_mut().cursor_mut();
                cursor.move_up(n);
                cursor.col = 0;
            }
            Action::CursorRow(row) => self.move_cursor_row(row),
            Action::CursorColumn(col) => {
                let cols = self.cols();
                let row = self.buffers.active().cursor().row;
                self.buffers.active_mut().cursor_mut().move_to(row, col, self.rows(), cols);
            }
            Action::CursorPosition { row, col } => self.move_cursor_position(row, col),
            Action::SetScrollRegion { top, bottom } => self.set_scroll_region(top, bottom),
            Action::SetLeftRightMargin { left, right } => self.set_left_right_margin(left, right),
            Action::ScrollUp(n) => {
                for _ in 0..n {
                    self.buffers.active_mut().scroll(false);
                }
            }
            Action::ScrollDown(n) => {
                for _ in 0..n {
                    self.buffers.active_mut().reverse_index();
                }
            }
            Action::InsertLines(n) => self.buffers.active_mut().insert_lines(n),
            Action::DeleteLines(n) => self.buffers.active_mut().delete_lines(n),
            Action::InsertChars(n) => {
                let margin_mode = self.modes.dec.contains(DecModes::LEFT_RIGHT_MARGIN);
                self.buffers.active_mut().insert_chars(n, margin_mode);
            }
            Action::DeleteChars(n) => self.buffers.active_mut().delete_chars(n),
            Action::EraseChars(n) => self.buffers.active_mut().erase_chars(n),
            Action::EraseInDisplay(mode) => self.buffers.active_mut().erase_in_display(erase_mode(mode)),
            Action::EraseInLine(mode) => self.buffers.active_mut().erase_in_line(erase_mode(mode)),
            Action::EraseScrollback => self.buffers.active_mut().erase_scrollback(),
            Action::Sgr(params) => {
                self.buffers.active_mut().cursor_mut().attrs.apply_sgr_params(&params);
            }
            Action::DecSet(params) => self.set_dec_modes(&params, true, delegate),
            Action::DecRst(params) => self.set_dec_modes(&params, false, delegate),
            Action::AnsiSet(params) => {
                for p in params {
                    self.modes.set_ansi_mode(p, true);
                }
            }
            Action::AnsiRst(params) => {
                for p in params {
                    self.modes.set_ansi_mode(p, false);
                }
            }
            Action::SaveCursor => self.buffers.active_mut().save_cursor(),
            Action::RestoreCursor => self.buffers.active_mut().restore_cursor(),
            Action::Index => self.buffers.active_mut().index(),
            Action::ReverseIndex => self.buffers.active_mut().reverse_index(),
            Action::NextLine => {
                self.buffers.active_mut().cursor_mut().carriage_return();
                self.buffers.active_mut().index();
            }
            Action::FullReset => self.full_reset(),
            Action::SoftReset => self.soft_reset(),
            Action::SetTitle(title) => delegate.set_title(&title),
            Action::SetIconTitle(title) => delegate.set_icon_title(&title),
            Action::CurrentDirectoryChanged(uri) => {
                delegate.host_current_directory_updated(uri.as_deref());
            }
            Action::CurrentDocumentChanged(uri) => {
                delegate.host_current_document_updated(uri.as_deref());
            }
            Action::HyperlinkStart(link) => {
                self.current_hyperlink = self.hyperlinks.intern(&link.uri);
            }
            Action::HyperlinkEnd => {
                self.current_hyperlink = 0;
            }
            Action::SetTabStop => self.buffers.active_mut().cursor_mut().set_tab_stop(),
            Action::ClearTabStop(mode) => match mode {
                0 => self.buffers.active_mut().cursor_mut().clear_tab_stop(),
                3 | 5 => self.buffers.active_mut().cursor_mut().clear_all_tab_stops(),
                _ => {}
            },
            Action::BackTab(n) => {
                for _ in 0..n {
                    let cursor = self.buffers.active_mut().cursor_mut();
                    cursor.col = cursor.prev_tab_stop();
                }
            }
            Action::ApplicationKeypad | Action::NormalKeypad => {}
            Action::ScreenAlignment => self.screen_alignment(),
            Action::RepeatChar(count) => {
                if let Some(ch) = self.last_printed {
                    for _ in 0..count {
                        self.apply_print(ch);
                    }
                }
            }
            Action::SetCursorShape(shape) => delegate.cursor_style_changed(shape),
            Action::FocusIn | Action::FocusOut | Action::PasteStart | Action::PasteEnd => {}
            Action::DeviceAttributes => delegate.send(b"\x1b[?65;1;9c"),
            Action::DeviceAttributesSecondary => delegate.send(b"\x1b[>41;1;0c"),
            Action::DeviceStatusReport => delegate.send(b"\x1b[0n"),
            Action::CursorPositionReport => {
                let cursor = self.buffers.active().cursor();
                let reply = format!("\x1b[{};{}R", cursor.row + 1, cursor.col + 1);
                delegate.send(reply.as_bytes());
            }
            Action::DesignateCharset { slot, charset } => {
                self.buffers.active_mut().cursor_mut().designate_charset(slot, charset);
            }
            Action::SingleShift2 => self.buffers.active_mut().cursor_mut().single_shift = Some(2),
            Action::SingleShift3 => self.buffers.active_mut().cursor_mut().single_shift = Some(3),
            Action::ShiftOut => self.buffers.active_mut().cursor_mut().charset_g_level = 1,
            Action::ShiftIn => self.buffers.active_mut().cursor_mut().charset_g_level = 0,
            Action::MouseEvent(_) => {}
            Action::WindowManipulation(params) => self.apply_window_manipulation(&params, delegate),
            Action::RequestStatusString(pt) => self.apply_decrqss(&pt, delegate),
            Action::SelectiveEraseInDisplay(mode) => {
                self.buffers.active_mut().selective_erase_in_display(erase_mode(mode));
            }
            Action::SelectiveEraseInLine(mode) => {
                self.buffers.active_mut().selective_erase_in_line(erase_mode(mode));
            }
            Action::SetCharProtection(protect) => {
                self.buffers.active_mut().cursor_mut().char_protect = protect;
            }
            Action::RequestMode { dec, mode } => self.apply_decrqm(dec, mode, delegate),
            Action::EraseRectArea { top, left, bottom, right } => {
                self.buffers.active_mut().erase_rect_area(top, left, bottom, right);
            }
            Action::FillRectArea { ch, top, left, bottom, right } => {
                let ch = char::from_u32(u32::from(ch)).unwrap_or(' ');
                self.buffers.active_mut().fill_rect_area(ch, top, left, bottom, right);
            }
            Action::CopyRectArea {
                src_top,
                src_left,
                src_bottom,
                src_right,
                dst_top,
                dst_left,
            } => {
                self.buffers
                    .active_mut()
                    .copy_rect_area(src_top, src_left, src_bottom, src_right, dst_top, dst_left);
            }
            Action::InsertColumns(n) => self.buffers.active_mut().insert_columns(n),
            Action::DeleteColumns(n) => self.buffers.active_mut().delete_columns(n),
            Action::Escape(_) => {}
        }
    }

    /// `CSI Ps ; Ps ; Ps t` — xterm's window-manipulation subset. Only the
    /// character-cell resize request/report ops make sense for a host-agnostic
    /// engine with no font metrics; pixel-geometry ops (`14`, `19`, ...) have
    /// no answer this crate can give and are silently ignored, matching
    /// spec.md §1's font-metrics carve-out.
    fn apply_window_manipulation(&self, params: &[u16], delegate: &mut dyn Delegate) {
        match params.first() {
            Some(8) => {
                let rows = params.get(1).copied().unwrap_or(0);
                let cols = params.get(2).copied().unwrap_or(0);
                if rows > 0 && cols > 0 {
                    delegate.size_changed(cols, rows);
                }
            }
            Some(18) => {
                let reply = format!("\x1b[8;{};{}t", self.rows(), self.cols());
                delegate.send(reply.as_bytes());
            }
            _ => {}
        }
    }

    /// DECRQSS (`DCS $ q Pt ST`): report the current value of a settable
    /// control function. Replies `DCS 1 $ r <value> Pt ST` when `Pt` names a
    /// function this engine tracks, else the "invalid request" form
    /// `DCS 0 $ r ST`, per DEC's own documented fallback.
    fn apply_decrqss(&self, pt: &[u8], delegate: &mut dyn Delegate) {
        let valid = match pt {
            b"m" => {
                let attrs = self.buffers.active().cursor().attrs;
                Some(sgr_params_string(&attrs))
            }
            b"r" => {
                // `scroll_top` is 0-based inclusive (needs +1 for the 1-based
                // reply); `scroll_bottom` is stored exclusive-of-last-row,
                // which already equals the 1-based inclusive value.
                let cursor = self.buffers.active().cursor();
                Some(format!("{};{}r", cursor.scroll_top() + 1, cursor.scroll_bottom()))
            }
            b"s" if self.modes.dec.contains(DecModes::LEFT_RIGHT_MARGIN) => {
                let cursor = self.buffers.active().cursor();
                Some(format!("{};{}s", cursor.margin_left() + 1, cursor.margin_right() + 1))
            }
            _ => None,
        };
        match valid {
            Some(value) => delegate.send(format!("\x1bP1$r{value}\x1b\\").as_bytes()),
            None => delegate.send(b"\x1bP0$r\x1b\\"),
        }
    }

    /// DECRQM (`CSI Ps $ p` / `CSI ? Ps $ p`): reply with DECRPM
    /// (`CSI Ps ; Pv $ y` / `CSI ? Ps ; Pv $ y`), `Pv` being 1 (set), 2
    /// (reset), or 0 (mode not recognized by this engine).
    fn apply_decrqm(&self, dec: bool, mode: u16, delegate: &mut dyn Delegate) {
        let enabled = if dec {
            // A handful of DEC private modes are tracked outside the
            // `Modes` bitflags (mirroring `set_dec_modes`'s special cases),
            // so DECRQM has to ask the same places DECSET/DECRST write to.
            match mode {
                25 => Some(self.buffers.active().cursor().visible),
                45 => Some(self.buffers.active().cursor().reverse_wraparound),
                47 | 1047 | 1049 => Some(self.buffers.is_alternate()),
                _ => self.modes.dec_mode_enabled(mode),
            }
        } else {
            self.modes.ansi_mode_enabled(mode)
        };
        let value = match enabled {
            Some(true) => 1,
            Some(false) => 2,
            None => 0,
        };
        let reply = if dec {
            format!("\x1b[?{mode};{value}$y")
        } else {
            format!("\x1b[{mode};{value}$y")
        };
        delegate.send(reply.as_bytes());
    }

    fn apply_print(&mut self, ch: char) {
        let cursor = self.buffers.active().cursor();
        let charset = cursor.effective_charset();
        let ch = translate_charset(ch, charset);
        self.buffers.active_mut().cursor_mut().consume_single_shift();
        self.last_printed = Some(ch);

        let width = Cell::display_width(ch);
        if width == 0 {
            return;
        }

        let insert_mode = self.modes.insert_mode();
        let margin_mode = self.modes.dec.contains(DecModes::LEFT_RIGHT_MARGIN);
        let (row, col) = {
            let cursor = self.buffers.active().cursor();
            (cursor.row, cursor.col)
        };
        // `print_char` always writes a fresh `Cell`, dropping whatever
        // hyperlink reference the overwritten cell(s) held; release those
        // before the write so the registry's refcounts stay accurate.
        let previous_links: Vec<HyperlinkId> = [Some(col), (width == 2).then_some(col + 1)]
            .into_iter()
            .flatten()
            .filter_map(|c| self.buffers.active().cell(row, c).map(|cell| cell.hyperlink))
            .collect();

        self.buffers.active_mut().print_char(ch, width, insert_mode, margin_mode);
        self.dirty.mark_cell(row, col);

        if self.buffers.active().cursor().char_protect {
            if let Some(cell) = self.buffers.active_mut().cell_mut(row, col) {
                cell.flags.insert(CellFlags::PROTECTED);
            }
            if width == 2 {
                if let Some(cell) = self.buffers.active_mut().cell_mut(row, col + 1) {
                    cell.flags.insert(CellFlags::PROTECTED);
                }
            }
        }

        for id in previous_links {
            self.hyperlinks.release_id(id);
        }

        if self.current_hyperlink != 0 {
            self.hyperlinks.acquire_id(self.current_hyperlink);
            if let Some(cell) = self.buffers.active_mut().cell_mut(row, col) {
                cell.hyperlink = self.current_hyperlink;
            }
            if width == 2 {
                self.hyperlinks.acquire_id(self.current_hyperlink);
                if let Some(cell) = self.buffers.active_mut().cell_mut(row, col + 1) {
                    cell.hyperlink = self.current_hyperlink;
                }
            }
        }
    }

    fn apply_newline(&mut self, delegate: &mut dyn Delegate) {
        if self.modes.ansi.contains(AnsiModes::LINEFEED_NEWLINE) || self.convert_eol {
            self.buffers.active_mut().cursor_mut().carriage_return();
        }
        self.buffers.active_mut().index();
        delegate.linefeed();
    }

    fn move_cursor_row(&mut self, row: u16) {
        let origin_mode = self.modes.origin_mode();
        let (rows, cols) = (self.rows(), self.cols());
        let cursor = self.buffers.active_mut().cursor_mut();
        if origin_mode {
            let top = cursor.scroll_top();
            let bottom = cursor.scroll_bottom();
            cursor.row = row.saturating_add(top).min(bottom.saturating_sub(1));
            cursor.pending_wrap = false;
        } else {
            let col = cursor.col;
            cursor.move_to(row, col, rows, cols);
        }
    }

    fn move_cursor_position(&mut self, row: u16, col: u16) {
        let origin_mode = self.modes.origin_mode();
        let (rows, cols) = (self.rows(), self.cols());
        let cursor = self.buffers.active_mut().cursor_mut();
        if origin_mode {
            let top = cursor.scroll_top();
            let bottom = cursor.scroll_bottom();
            cursor.row = row.saturating_add(top).min(bottom.saturating_sub(1));
            cursor.col = col.min(cols.saturating_sub(1));
            cursor.pending_wrap = false;
        } else {
            cursor.move_to(row, col, rows, cols);
        }
    }

    fn set_scroll_region(&mut self, top: u16, bottom: u16) {
        let rows = self.rows();
        let bottom = if bottom == 0 { rows } else { bottom };
        let origin_mode = self.modes.origin_mode();
        let cursor = self.buffers.active_mut().cursor_mut();
        cursor.set_scroll_region(top, bottom, rows);
        if origin_mode {
            cursor.row = cursor.scroll_top();
            cursor.col = 0;
        } else {
            cursor.row = 0;
            cursor.col = 0;
        }
        cursor.pending_wrap = false;
    }

    /// `CSI Ps ; Ps s`: DECSLRM when left/right margin mode (69) is
    /// enabled, otherwise the classic ANSI.SYS "save cursor" alias xterm
    /// falls back to.
    fn set_left_right_margin(&mut self, left: u16, right: u16) {
        if self.modes.dec.contains(DecModes::LEFT_RIGHT_MARGIN) {
            let cols = self.cols();
            let right = if right == 0 { cols } else { right };
            self.buffers.active_mut().cursor_mut().set_left_right_margin(left, right, cols);
        } else {
            self.buffers.active_mut().save_cursor();
        }
    }

    fn screen_alignment(&mut self) {
        let (cols, rows) = (self.cols(), self.rows());
        let buffer = self.buffers.active_mut();
        for row in 0..rows {
            for col in 0..cols {
                buffer.print_char('E', 1, false, false);
                let _ = (row, col);
            }
            buffer.cursor_mut().col = 0;
            if row + 1 < rows {
                buffer.cursor_mut().row = row + 1;
            }
        }
        buffer.cursor_mut().row = 0;
        buffer.cursor_mut().col = 0;
        self.dirty.mark_rows(0, rows);
    }

    fn set_dec_modes(&mut self, params: &[u16], enabled: bool, delegate: &mut dyn Delegate) {
        for &p in params {
            match p {
                25 => self.buffers.active_mut().cursor_mut().visible = enabled,
                45 => self.buffers.active_mut().cursor_mut().reverse_wraparound = enabled,
                47 | 1047 => self.toggle_alternate(enabled, false),
                1048 => {
                    if enabled {
                        self.buffers.active_mut().save_cursor();
                    } else {
                        self.buffers.active_mut().restore_cursor();
                    }
                }
                1049 => self.toggle_alternate(enabled, true),
                9 | 1000 | 1002 | 1003 => {
                    self.modes.set_dec_mode(p, enabled);
                    delegate.mouse_mode_changed(self.mouse_report_mode());
                }
                _ => self.modes.set_dec_mode(p, enabled),
            }
        }
    }

    fn toggle_alternate(&mut self, enabled: bool, save_cursor: bool) {
        let already_alt = self.buffers.is_alternate();
        if enabled && !already_alt {
            if save_cursor {
                self.buffers.active_mut().save_cursor();
            }
            self.buffers.enter_alternate(SgrAttrs::default());
        } else if !enabled && already_alt {
            self.buffers.leave_alternate(save_cursor);
        }
        self.modes.dec.set(DecModes::ALT_BUFFER, self.buffers.is_alternate());
    }

    /// Host-initiated OSC 8 interaction: the host detected a click (or
    /// equivalent) over `(row, col)` and wants to know whether a hyperlink
    /// is attached there. Resolves the cell's hyperlink id through the
    /// registry and invokes [`Delegate::request_open_link`] if one exists.
    pub fn open_hyperlink_at(&self, row: u16, col: u16, delegate: &mut dyn Delegate) {
        let Some(cell) = self.buffers.active().cell(row, col) else {
            return;
        };
        if cell.hyperlink == 0 {
            return;
        }
        if let Some(uri) = self.hyperlinks.get(cell.hyperlink) {
            delegate.request_open_link(uri, "");
        }
    }

    fn mouse_report_mode(&self) -> MouseReportMode {
        if self.modes.dec.contains(DecModes::MOUSE_ANY_EVENT) {
            MouseReportMode::AnyEvent
        } else if self.modes.dec.contains(DecModes::MOUSE_BUTTON_EVENT) {
            MouseReportMode::ButtonEvent
        } else if self.modes.dec.contains(DecModes::MOUSE_VT200) {
            MouseReportMode::Vt200
        } else if self.modes.dec.contains(DecModes::MOUSE_X10) {
            MouseReportMode::X10
        } else {
            MouseReportMode::Off
        }
    }

    /// Encode a mouse event the host captured (button, 0-based column/row,
    /// press-vs-release) as bytes to send to the child, honoring whichever
    /// mouse-tracking and coordinate-extension modes are currently active.
    ///
    /// Returns `None` when no mouse-tracking mode (9/1000/1002/1003) is on —
    /// the host should not forward the event to the child at all in that
    /// case. The coordinate-extension precedence matches xterm: SGR (1006)
    /// wins if enabled, then URXVT (1015), then the UTF-8 extension (1005),
    /// else the original byte-packed X10 form.
    #[must_use]
    pub fn encode_mouse_event(&self, button: u8, col: u16, row: u16, pressed: bool) -> Option<Vec<u8>> {
        if self.mouse_report_mode() == MouseReportMode::Off {
            return None;
        }
        Some(if self.modes.dec.contains(DecModes::MOUSE_SGR) {
            encode_mouse_sgr(button, col, row, pressed)
        } else if self.modes.dec.contains(DecModes::MOUSE_URXVT) {
            encode_mouse_urxvt(button, col, row, pressed)
        } else if self.modes.dec.contains(DecModes::MOUSE_UTF8) {
            encode_mouse_utf8(button, col, row, pressed)
        } else {
            encode_mouse_x10(button, col, row, pressed)
        })
    }
}

/// Serialize the cursor's current `SgrAttrs` back into a `;`-joined SGR
/// parameter string (the `Pt` value DECRQSS `m` replies with), inverting
/// [`SgrAttrs::apply_sgr_params`]'s code mapping.
fn sgr_params_string(attrs: &SgrAttrs) -> String {
    use crate::cell::{Color, SgrFlags};

    let mut codes = vec![0i64];
    let flag_codes = [
        (SgrFlags::BOLD, 1),
        (SgrFlags::DIM, 2),
        (SgrFlags::ITALIC, 3),
        (SgrFlags::UNDERLINE, 4),
        (SgrFlags::BLINK, 5),
        (SgrFlags::INVERSE, 7),
        (SgrFlags::HIDDEN, 8),
        (SgrFlags::STRIKETHROUGH, 9),
        (SgrFlags::DOUBLE_UNDERLINE, 21),
        (SgrFlags::OVERLINE, 53),
    ];
    for (flag, code) in flag_codes {
        if attrs.flags.contains(flag) {
            codes.push(code);
        }
    }

    let mut color_codes = |color: Color, base_named: i64, base_extended: i64| match color {
        Color::Default => {}
        Color::Named(n @ 0..=7) => codes.push(base_named + i64::from(n)),
        Color::Named(n) => codes.push(base_named + 60 + i64::from(n - 8)),
        Color::Indexed(n) => codes.extend([base_extended, 5, i64::from(n)]),
        Color::Rgb(r, g, b) => codes.extend([base_extended, 2, i64::from(r), i64::from(g), i64::from(b)]),
    };
    color_codes(attrs.fg, 30, 38);
    color_codes(attrs.bg, 40, 48);

    codes.iter().map(i64::to_string).collect::<Vec<_>>().join(";") + "m"
}

fn erase_mode(param: u8) -> EraseMode {
    match param {
        1 => EraseMode::ToStart,
        2 => EraseMode::All,
        _ => EraseMode::ToEnd,
    }
}

/// VT200 release button code: the original X10 protocol has no per-button
/// release identity, so every release is reported as button 3.
const RELEASE_BUTTON: u8 = 3;

/// Encode a mouse press/release as the SGR (1006) protocol:
/// `ESC [ < b ; x ; y M` (press) or `...m` (release). `x`/`y` are 1-based.
/// Unlike the other encodings, SGR keeps the real button number on release
/// (the trailing letter alone distinguishes press from release).
#[must_use]
pub fn encode_mouse_sgr(button: u8, col: u16, row: u16, pressed: bool) -> Vec<u8> {
    let suffix = if pressed { b'M' } else { b'm' };
    format!("\x1b[<{};{};{}{}", button, col + 1, row + 1, suffix as char).into_bytes()
}

/// Encode a mouse press/release as the original X10/VT200 byte-packed
/// triplet: `ESC [ M Cb Cx Cy`, each coordinate offset by +32 and clamped to
/// a single byte (coordinates beyond 223 saturate, a known X10 limitation
/// that the UTF-8/SGR extensions exist to lift).
#[must_use]
pub fn encode_mouse_x10(button: u8, col: u16, row: u16, pressed: bool) -> Vec<u8> {
    let button_code = if pressed { button } else { RELEASE_BUTTON };
    let cb = button_code.saturating_add(32);
    let cx = u8::try_from(col.saturating_add(1)).unwrap_or(u8::MAX).saturating_add(32);
    let cy = u8::try_from(row.saturating_add(1)).unwrap_or(u8::MAX).saturating_add(32);
    vec![0x1b, b'[', b'M', cb, cx, cy]
}

/// Encode a mouse press/release per the UTF-8 coordinate extension (1005):
/// same layout as X10 but `Cx`/`Cy` are emitted as UTF-8-encoded code points
/// rather than single bytes, lifting the 223-column/row ceiling.
#[must_use]
pub fn encode_mouse_utf8(button: u8, col: u16, row: u16, pressed: bool) -> Vec<u8> {
    let button_code = if pressed { button } else { RELEASE_BUTTON };
    let mut out = vec![0x1b, b'[', b'M', button_code.saturating_add(32)];
    for coord in [col, row] {
        let scalar = u32::from(coord) + 1 + 32;
        match char::from_u32(scalar) {
            Some(ch) => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
            None => out.push(b'?'),
        }
    }
    out
}

/// Encode a mouse press/release per the URXVT extension (1015):
/// `ESC [ b ; x ; y M`, decimal like SGR but always terminated with `M` and
/// (like X10) collapsing every release to button 3.
#[must_use]
pub fn encode_mouse_urxvt(button: u8, col: u16, row: u16, pressed: bool) -> Vec<u8> {
    let button_code = if pressed { button } else { RELEASE_BUTTON };
    format!("\x1b[{};{};{}M", button_code.saturating_add(32), col + 1, row + 1).into_bytes()
}
