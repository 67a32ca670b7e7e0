//! Terminal mode flags: ANSI modes (set via `CSI h`/`CSI l`) and DEC private
//! modes (set via `CSI ? h`/`CSI ? l`), plus their save/restore (`CSI ? s`/
//! `CSI ? r`).

use bitflags::bitflags;

bitflags! {
    /// ANSI-standard modes, set/reset without the `?` DEC prefix.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AnsiModes: u16 {
        /// IRM — insert mode: printed characters shift the rest of the line
        /// right instead of overwriting.
        const INSERT = 1 << 0;
        /// KAM — keyboard action mode (locks the keyboard host-side).
        const KEYBOARD_LOCK = 1 << 1;
        /// SRM — send/receive (local echo) mode.
        const SEND_RECEIVE = 1 << 2;
        /// LNM — linefeed/new-line: LF also performs a carriage return.
        const LINEFEED_NEWLINE = 1 << 3;
    }
}

bitflags! {
    /// DEC private modes, set/reset with the `?` CSI prefix.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DecModes: u64 {
        /// DECCKM — cursor keys send application (`SS3`) sequences.
        const APPLICATION_CURSOR_KEYS = 1 << 0;
        /// DECANM — ANSI/VT52 mode selector.
        const ANSI_MODE = 1 << 1;
        /// DECCOLM — 80/132 column mode.
        const COLUMN_132 = 1 << 2;
        /// DECSCNM — reverse video (swap default fg/bg for the whole screen).
        const REVERSE_VIDEO = 1 << 3;
        /// DECOM — origin mode: cursor addressing is relative to the margins.
        const ORIGIN = 1 << 4;
        /// DECAWM — autowrap.
        const AUTOWRAP = 1 << 5;
        /// DECARM — auto-repeat keys (host advisory only).
        const AUTO_REPEAT = 1 << 6;
        /// Mouse mode 9 — X10 compatibility (press only).
        const MOUSE_X10 = 1 << 7;
        /// Mouse mode 1000 — VT200 (press and release).
        const MOUSE_VT200 = 1 << 8;
        /// Mouse mode 1002 — button-event tracking (adds drag with a button held).
        const MOUSE_BUTTON_EVENT = 1 << 9;
        /// Mouse mode 1003 — any-event tracking (adds motion with no button held).
        const MOUSE_ANY_EVENT = 1 << 10;
        /// Mouse mode 1005 — UTF-8 coordinate extension.
        const MOUSE_UTF8 = 1 << 11;
        /// Mouse mode 1006 — SGR coordinate extension.
        const MOUSE_SGR = 1 << 12;
        /// Mouse mode 1015 — URXVT coordinate extension.
        const MOUSE_URXVT = 1 << 13;
        /// Mode 1004 — focus in/out reporting.
        const FOCUS_REPORTING = 1 << 14;
        /// Mode 1007 — alternate-scroll (wheel events send cursor keys in
        /// the alternate buffer).
        const ALT_SCROLL = 1 << 15;
        /// Mode 1047 — use alternate buffer (no cursor save/restore).
        const ALT_BUFFER = 1 << 16;
        /// Mode 1048 — save/restore cursor only (no buffer switch).
        const ALT_BUFFER_SAVE_CURSOR = 1 << 17;
        /// Mode 1049 — save cursor, switch to alternate buffer, clear it.
        const ALT_BUFFER_CLEAR = 1 << 18;
        /// Mode 2004 — bracketed paste.
        const BRACKETED_PASTE = 1 << 19;
        /// Mode 66 — application keypad.
        const APPLICATION_KEYPAD = 1 << 20;
        /// Mode 69 — left-right margin mode (enables DECSLRM).
        const LEFT_RIGHT_MARGIN = 1 << 21;
    }
}

impl DecModes {
    /// Any of the four mouse-tracking gesture modes (9/1000/1002/1003) is on.
    #[must_use]
    pub fn mouse_tracking_enabled(self) -> bool {
        self.intersects(
            Self::MOUSE_X10 | Self::MOUSE_VT200 | Self::MOUSE_BUTTON_EVENT | Self::MOUSE_ANY_EVENT,
        )
    }

    /// Any of the three alternate-buffer modes (1047/1048/1049) is on.
    #[must_use]
    pub fn alternate_buffer_active(self) -> bool {
        self.intersects(Self::ALT_BUFFER | Self::ALT_BUFFER_SAVE_CURSOR | Self::ALT_BUFFER_CLEAR)
    }
}

/// All mode state for a Terminal: the two live flag sets plus the saved
/// snapshot used by DEC private mode save/restore (`CSI ? s` / `CSI ? r`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modes {
    pub ansi: AnsiModes,
    pub dec: DecModes,
    saved_dec: Option<DecModes>,
}

impl Modes {
    /// Modes active immediately after a terminal reset (RIS): autowrap and
    /// ANSI mode are on, everything else off. This mirrors the defaults a
    /// freshly constructed `Cursor` assumes for `autowrap`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ansi: AnsiModes::empty(),
            dec: DecModes::ANSI_MODE | DecModes::AUTOWRAP,
            saved_dec: None,
        }
    }

    /// Snapshot the current DEC private modes (`CSI ? Pm s`).
    pub fn save_dec(&mut self, mask: DecModes) {
        let existing = self.saved_dec.unwrap_or_default();
        self.saved_dec = Some((existing - mask) | (self.dec & mask));
    }

    /// Restore previously snapshotted DEC private modes within `mask`
    /// (`CSI ? Pm r`); modes never saved are left untouched.
    pub fn restore_dec(&mut self, mask: DecModes) {
        if let Some(saved) = self.saved_dec {
            self.dec = (self.dec - mask) | (saved & mask);
        }
    }

    /// DECAWM — autowrap enabled.
    #[must_use]
    pub fn autowrap(&self) -> bool {
        self.dec.contains(DecModes::AUTOWRAP)
    }

    /// IRM — insert mode enabled.
    #[must_use]
    pub fn insert_mode(&self) -> bool {
        self.ansi.contains(AnsiModes::INSERT)
    }

    /// DECOM — origin mode enabled.
    #[must_use]
    pub fn origin_mode(&self) -> bool {
        self.dec.contains(DecModes::ORIGIN)
    }

    /// Reset to the post-RIS default mode set.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Maps a DEC private mode's numeric code (the `Pm` in `CSI ? Pm h`) to
    /// its flag, or `None` if unrecognized. Shared by `set_dec_mode` and
    /// `dec_mode_enabled` (DECRQM) so the two can never drift apart.
    fn dec_mode_bit(code: u16) -> Option<DecModes> {
        match code {
            1 => Some(DecModes::APPLICATION_CURSOR_KEYS),
            2 => Some(DecModes::ANSI_MODE),
            3 => Some(DecModes::COLUMN_132),
            5 => Some(DecModes::REVERSE_VIDEO),
            6 => Some(DecModes::ORIGIN),
            7 => Some(DecModes::AUTOWRAP),
            8 => Some(DecModes::AUTO_REPEAT),
            9 => Some(DecModes::MOUSE_X10),
            66 => Some(DecModes::APPLICATION_KEYPAD),
            69 => Some(DecModes::LEFT_RIGHT_MARGIN),
            1000 => Some(DecModes::MOUSE_VT200),
            1002 => Some(DecModes::MOUSE_BUTTON_EVENT),
            1003 => Some(DecModes::MOUSE_ANY_EVENT),
            1004 => Some(DecModes::FOCUS_REPORTING),
            1005 => Some(DecModes::MOUSE_UTF8),
            1006 => Some(DecModes::MOUSE_SGR),
            1007 => Some(DecModes::ALT_SCROLL),
            1015 => Some(DecModes::MOUSE_URXVT),
            1047 => Some(DecModes::ALT_BUFFER),
            1048 => Some(DecModes::ALT_BUFFER_SAVE_CURSOR),
            1049 => Some(DecModes::ALT_BUFFER_CLEAR),
            2004 => Some(DecModes::BRACKETED_PASTE),
            _ => None,
        }
    }

    /// Set or clear a DEC private mode by its numeric code (the `Pm` in
    /// `CSI ? Pm h`/`CSI ? Pm l`). Unrecognized codes are ignored.
    pub fn set_dec_mode(&mut self, code: u16, enabled: bool) {
        if let Some(bit) = Self::dec_mode_bit(code) {
            self.dec.set(bit, enabled);
        }
    }

    /// DECRQM query: `Some(true/false)` if `code` names a mode this engine
    /// tracks, `None` if unrecognized (DECRPM reports that as "not
    /// recognized", value 0).
    #[must_use]
    pub fn dec_mode_enabled(&self, code: u16) -> Option<bool> {
        Self::dec_mode_bit(code).map(|bit| self.dec.contains(bit))
    }

    /// Maps an ANSI-standard mode's numeric code (the `Pm` in `CSI Pm h`) to
    /// its flag, mirroring [`Modes::dec_mode_bit`].
    fn ansi_mode_bit(code: u16) -> Option<AnsiModes> {
        match code {
            2 => Some(AnsiModes::KEYBOARD_LOCK),
            4 => Some(AnsiModes::INSERT),
            12 => Some(AnsiModes::SEND_RECEIVE),
            20 => Some(AnsiModes::LINEFEED_NEWLINE),
            _ => None,
        }
    }

    /// Set or clear an ANSI-standard mode by its numeric code (the `Pm` in
    /// `CSI Pm h`/`CSI Pm l`). Unrecognized codes are ignored.
    pub fn set_ansi_mode(&mut self, code: u16, enabled: bool) {
        if let Some(bit) = Self::ansi_mode_bit(code) {
            self.ansi.set(bit, enabled);
        }
    }

    /// DECRQM query for an ANSI-standard mode, mirroring
    /// [`Modes::dec_mode_enabled`].
    #[must_use]
    pub fn ansi_mode_enabled(&self, code: u16) -> Option<bool> {
        Self::ansi_mode_bit(code).map(|bit| self.ansi.contains(bit))
    }
}
