//! VT/ANSI byte-stream parser: a DEC VT500-style state machine that turns
//! raw bytes into a stream of [`Action`]s. No I/O, deterministic, and
//! restartable — `feed` may be called with arbitrarily short fragments and
//! the accumulators persist across calls.

use crate::charset::CharsetId;

/// The 14 states of the VT500 parser, plus the two SOS/PM/APC-style
/// string-collection states folded into one (`SosPmApcString` only differs
/// from `OscString`/`ApcString` in which `Action` it emits on entry/exit, and
/// this parser never needs to expose SOS/PM payloads, so they're absorbed by
/// `ApcString`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Escape,
    EscapeIntermediate,
    CsiEntry,
    CsiParam,
    CsiIntermediate,
    CsiIgnore,
    OscString,
    ApcString,
    DcsEntry,
    DcsParam,
    DcsIntermediate,
    DcsIgnore,
    DcsPassthrough,
}

/// Cap on a single CSI/DEC-private parameter. Chosen well above any real
/// terminal sequence (max legitimate values are in the low thousands) but far
/// short of overflowing an `i64` accumulator multiplied by 10 each digit.
const PARAM_OVERFLOW_CAP: i64 = 9_999_999;

/// Hard cap on OSC/DCS/APC string accumulators, matching spec's "64 KiB"
/// guidance; bytes beyond this are dropped (accumulator stops growing) but
/// the state machine still tracks the terminator correctly.
const STRING_ACCUMULATOR_CAP: usize = 64 * 1024;

/// A mouse gesture decoded from an input escape. Mouse *output* (encoding a
/// host-side event back to the child) is the interpreter/delegate's concern;
/// this variant exists for completeness when this parser is driven over a
/// byte stream recorded from a terminal rather than fed into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub button: u8,
    pub col: u16,
    pub row: u16,
    pub pressed: bool,
    pub motion: bool,
}

/// A cursor shape selector (DECSCUSR, `CSI Ps SP q`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorShape {
    Default,
    BlinkingBlock,
    SteadyBlock,
    BlinkingUnderline,
    SteadyUnderline,
    BlinkingBar,
    SteadyBar,
}

impl CursorShape {
    #[must_use]
    fn from_param(p: i64) -> Self {
        match p {
            0 => CursorShape::Default,
            1 => CursorShape::BlinkingBlock,
            2 => CursorShape::SteadyBlock,
            3 => CursorShape::BlinkingUnderline,
            4 => CursorShape::SteadyUnderline,
            5 => CursorShape::BlinkingBar,
            6 => CursorShape::SteadyBar,
            _ => CursorShape::Default,
        }
    }
}

/// An OSC 8 hyperlink start: the colon-separated `key=value` params (most
/// notably `id=`) plus the target URI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Hyperlink {
    pub params: String,
    pub uri: String,
}

/// One parsed unit of work for the interpreter to apply. Print/Execute
/// actions carry their payload inline; CSI/OSC/DCS dispatch is pre-decoded
/// into typed variants rather than forwarding raw parameter bytes, so the
/// interpreter never re-parses anything the parser already extracted.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Print(char),
    Newline,
    CarriageReturn,
    Tab,
    Backspace,
    Bell,
    CursorUp(u16),
    CursorDown(u16),
    CursorRight(u16),
    CursorLeft(u16),
    CursorNextLine(u16),
    CursorPrevLine(u16),
    CursorRow(u16),
    CursorColumn(u16),
    CursorPosition { row: u16, col: u16 },
    SetScrollRegion { top: u16, bottom: u16 },
    SetLeftRightMargin { left: u16, right: u16 },
    ScrollUp(u16),
    ScrollDown(u16),
    InsertLines(u16),
    DeleteLines(u16),
    InsertChars(u16),
    DeleteChars(u16),
    EraseChars(u16),
    EraseInDisplay(u8),
    EraseInLine(u8),
    Sgr(Vec<i64>),
    DecSet(Vec<u16>),
    DecRst(Vec<u16>),
    AnsiSet(Vec<u16>),
    AnsiRst(Vec<u16>),
    SaveCursor,
    RestoreCursor,
    Index,
    ReverseIndex,
    NextLine,
    FullReset,
    SetTitle(String),
    SetIconTitle(String),
    /// OSC 7: host reported its current working directory (`None` clears it).
    CurrentDirectoryChanged(Option<String>),
    /// OSC 6: host reported the document URI associated with the session.
    CurrentDocumentChanged(Option<String>),
    HyperlinkStart(Hyperlink),
    HyperlinkEnd,
    SetTabStop,
    ClearTabStop(u8),
    BackTab(u16),
    ApplicationKeypad,
    NormalKeypad,
    ScreenAlignment,
    RepeatChar(u16),
    SetCursorShape(CursorShape),
    SoftReset,
    EraseScrollback,
    FocusIn,
    FocusOut,
    PasteStart,
    PasteEnd,
    DeviceAttributes,
    DeviceAttributesSecondary,
    DeviceStatusReport,
    CursorPositionReport,
    DesignateCharset { slot: u8, charset: CharsetId },
    SingleShift2,
    SingleShift3,
    /// SO (0x0e): lock `GL` to G1.
    ShiftOut,
    /// SI (0x0f): lock `GL` back to G0.
    ShiftIn,
    MouseEvent(MouseEvent),
    /// `CSI Ps ; Ps ; Ps t` — xterm window-manipulation subset (spec.md
    /// names this as a CSI final byte the interpreter dispatches); carries
    /// the raw parameter list so the interpreter can pick out the ops it
    /// supports (resize request, text-area-size report) and ignore the rest.
    WindowManipulation(Vec<u16>),
    /// DECRQSS (`DCS $ q Pt ST`): the child is asking what the current
    /// setting of the control function named by `Pt` is (e.g. `b"m"` for
    /// SGR, `b"r"` for DECSTBM). Carries the raw `Pt` bytes.
    RequestStatusString(Vec<u8>),
    /// DECSED (`CSI ? Ps J`): erase in display, skipping DECSCA-protected
    /// cells. Same `Ps` semantics as [`Action::EraseInDisplay`].
    SelectiveEraseInDisplay(u8),
    /// DECSEL (`CSI ? Ps K`): erase in line, skipping protected cells.
    SelectiveEraseInLine(u8),
    /// DECSCA (`CSI Ps " q`): mark subsequently-printed cells protected
    /// (`Ps` 1) or unprotected (`Ps` 0 or 2) against DECSED/DECSEL.
    SetCharProtection(bool),
    /// DECRQM (`CSI Ps $ p` / `CSI ? Ps $ p`): the host is asking for the
    /// current setting of ANSI mode `mode` (or a DEC private mode when
    /// `dec` is set).
    RequestMode { dec: bool, mode: u16 },
    /// DECERA (`CSI Pt;Pl;Pb;Pr $ z`): erase the named rectangle to blanks
    /// using the current erase attributes, ignoring scroll/left-right
    /// margins. Fields are the raw 1-based wire values; `0` means omitted,
    /// left for the interpreter to default against the buffer's own
    /// dimensions.
    EraseRectArea { top: u16, left: u16, bottom: u16, right: u16 },
    /// DECFRA (`CSI Pc;Pt;Pl;Pb;Pr $ x`): fill the named rectangle with
    /// character code `ch` (a decimal character code, not a literal byte).
    FillRectArea {
        ch: u16,
        top: u16,
        left: u16,
        bottom: u16,
        right: u16,
    },
    /// DECCRA (`CSI Pts;Pls;Pbs;Prs;Pps;Ptd;Pld;Ppd $ v`): copy the source
    /// rectangle to a destination whose top-left is `(dst_top, dst_left)`.
    /// Page numbers are accepted on the wire but ignored (single-page
    /// model).
    CopyRectArea {
        src_top: u16,
        src_left: u16,
        src_bottom: u16,
        src_right: u16,
        dst_top: u16,
        dst_left: u16,
    },
    /// DECIC (`CSI Pn ' }`): insert `Pn` blank columns at the cursor.
    InsertColumns(u16),
    /// DECDC (`CSI Pn ' ~`): delete `Pn` columns at the cursor.
    DeleteColumns(u16),
    /// Anything recognized by the state machine but not decoded into a
    /// typed variant above (unsupported CSI final byte, OSC code, or DCS
    /// passthrough sequence), carried as the raw escape bytes for
    /// observability hooks.
    Escape(Vec<u8>),
}

/// Accumulated CSI parameters: a flat list of signed integers plus, in
/// parallel, which separator preceded each (so SGR's `:`-subparameter
/// grouping, e.g. `38:2::R:G:B`, can be told apart from plain `;`-separated
/// params when the interpreter needs it). `None` marks an omitted parameter
/// (e.g. the empty field in `CSI ;5H`).
#[derive(Debug, Clone, Default)]
struct CsiParams {
    values: Vec<Option<i64>>,
    /// `true` at index i means params\[i\] was preceded by `:` rather than
    /// `;` (SGR subparameter syntax).
    sub: Vec<bool>,
    intermediates: Vec<u8>,
    prefix: Option<u8>,
}

impl CsiParams {
    fn push_digit(&mut self, digit: u8) {
        if self.values.is_empty() {
            self.values.push(None);
            self.sub.push(false);
        }
        let last = self.values.last_mut().unwrap();
        let current = last.unwrap_or(0);
        let next = current
            .checked_mul(10)
            .and_then(|v| v.checked_add(i64::from(digit)));
        *last = Some(match next {
            Some(v) if v <= PARAM_OVERFLOW_CAP => v,
            _ => 0,
        });
    }

    fn next_param(&mut self, sub: bool) {
        self.values.push(None);
        self.sub.push(sub);
    }

    fn as_i64(&self, index: usize) -> Option<i64> {
        self.values.get(index).copied().flatten()
    }

    fn as_u16_or(&self, index: usize, default: u16) -> u16 {
        match self.as_i64(index) {
            Some(v) if v > 0 => v.min(i64::from(u16::MAX)) as u16,
            _ => default,
        }
    }

    fn all_i64(&self) -> Vec<i64> {
        self.values.iter().map(|v| v.unwrap_or(0)).collect()
    }

    fn all_u16(&self) -> Vec<u16> {
        self.values
            .iter()
            .map(|v| v.unwrap_or(0).clamp(0, i64::from(u16::MAX)) as u16)
            .collect()
    }
}

/// The VT/ANSI parser. Owns only parse-time accumulator state; it holds no
/// reference to any screen model (that's the interpreter's job).
#[derive(Debug)]
pub struct Parser {
    state: State,
    csi: CsiParams,
    string_accum: Vec<u8>,
    /// The introducer that led into `OscString`/`ApcString`/Dcs*, so the
    /// exit action can tell which kind of string this was.
    string_kind: StringKind,
    esc_intermediates: Vec<u8>,
    /// The final byte that entered `DcsPassthrough`, retained alongside
    /// `self.csi`'s collected prefix/intermediates so `end_string` can tell
    /// DECRQSS apart from any other DCS payload.
    dcs_final: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringKind {
    None,
    Osc,
    Apc,
    Dcs,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Ground,
            csi: CsiParams::default(),
            string_accum: Vec::new(),
            string_kind: StringKind::None,
            esc_intermediates: Vec::new(),
            dcs_final: 0,
        }
    }

    /// Feed a chunk of bytes, returning every `Action` produced. Safe to
    /// call repeatedly with arbitrarily small fragments (even one byte at a
    /// time); parser state persists across calls.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Action> {
        let mut actions = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            // Fast path: in Ground, run a UTF-8 decode over a maximal run of
            // printable bytes instead of driving the byte-at-a-time state
            // machine for ordinary text.
            if self.state == State::Ground && bytes[i] >= 0x20 && bytes[i] != 0x7f {
                let start = i;
                while i < bytes.len() && bytes[i] >= 0x20 && bytes[i] != 0x7f {
                    i += 1;
                }
                for ch in String::from_utf8_lossy(&bytes[start..i]).chars() {
                    actions.push(Action::Print(ch));
                }
                continue;
            }
            self.advance_byte(bytes[i], &mut actions);
            i += 1;
        }
        actions
    }

    /// Single-byte convenience wrapper around [`Parser::feed`], for callers
    /// that drive the state machine one byte at a time. A single byte never
    /// produces more than one `Action`, so the `Vec` [`Parser::feed`] would
    /// return collapses to an `Option` here.
    pub fn advance(&mut self, byte: u8) -> Option<Action> {
        let mut actions = Vec::new();
        self.advance_byte(byte, &mut actions);
        actions.into_iter().next()
    }

    fn advance_byte(&mut self, byte: u8, out: &mut Vec<Action>) {
        // C1 controls (0x80..=0x9f) behave as their ESC-prefixed 7-bit
        // equivalents regardless of state, except inside string collection
        // where they're treated as ordinary bytes (OSC/DCS payloads may
        // legitimately contain 8-bit bytes from a UTF-8 string).
        if (0x80..=0x9f).contains(&byte) && !self.in_string_collection() {
            self.dispatch_c1(byte, out);
            return;
        }

        match self.state {
            State::Ground => self.advance_ground(byte, out),
            State::Escape => self.advance_escape(byte, out),
            State::EscapeIntermediate => self.advance_escape_intermediate(byte, out),
            State::CsiEntry => self.advance_csi_entry(byte, out),
            State::CsiParam => self.advance_csi_param(byte, out),
            State::CsiIntermediate => self.advance_csi_intermediate(byte, out),
            State::CsiIgnore => self.advance_csi_ignore(byte),
            State::OscString | State::ApcString | State::DcsPassthrough => {
                self.advance_string(byte, out);
            }
            State::DcsEntry => self.advance_dcs_entry(byte, out),
            State::DcsParam => self.advance_dcs_param(byte, out),
            State::DcsIntermediate => self.advance_dcs_intermediate(byte, out),
            State::DcsIgnore => self.advance_dcs_ignore(byte),
        }
    }

    fn in_string_collection(&self) -> bool {
        matches!(
            self.state,
            State::OscString | State::ApcString | State::DcsPassthrough
        )
    }

    fn dispatch_c1(&mut self, byte: u8, out: &mut Vec<Action>) {
        self.reset_to_ground();
        match byte {
            0x84 => out.push(Action::Index),
            0x85 => out.push(Action::NextLine),
            0x88 => out.push(Action::SetTabStop),
            0x8e | 0x8f => self.state = State::Escape,
            0x90 => self.enter_dcs_entry(),
            0x9b => self.enter_csi_entry(),
            0x9c => {} // ST with nothing pending: no-op
            0x9d => self.enter_osc_string(),
            0x9f => self.enter_apc_string(),
            _ => {}
        }
    }

    fn reset_to_ground(&mut self) {
        self.state = State::Ground;
        self.csi = CsiParams::default();
        self.esc_intermediates.clear();
    }

    fn execute_control(&mut self, byte: u8, out: &mut Vec<Action>) {
        match byte {
            0x07 => out.push(Action::Bell),
            0x08 => out.push(Action::Backspace),
            0x09 => out.push(Action::Tab),
            0x0a | 0x0b | 0x0c => out.push(Action::Newline),
            0x0d => out.push(Action::CarriageReturn),
            0x0e => out.push(Action::ShiftOut),
            0x0f => out.push(Action::ShiftIn),
            0x18 | 0x1a => self.reset_to_ground(),
            _ => {}
        }
    }

    fn advance_ground(&mut self, byte: u8, out: &mut Vec<Action>) {
        match byte {
            0x1b => self.state = State::Escape,
            0x00..=0x1f => self.execute_control(byte, out),
            0x7f => {}
            _ => {
                // Single stray high byte reaching here (the fast path in
                // `feed` handles runs); decode it alone.
                if let Some(ch) = char::from_u32(u32::from(byte)) {
                    out.push(Action::Print(ch));
                }
            }
        }
    }

    fn enter_csi_entry(&mut self) {
        self.state = State::CsiEntry;
        self.csi = CsiParams::default();
    }

    fn enter_osc_string(&mut self) {
        self.state = State::OscString;
        self.string_kind = StringKind::Osc;
        self.string_accum.clear();
    }

    fn enter_apc_string(&mut self) {
        self.state = State::ApcString;
        self.string_kind = StringKind::Apc;
        self.string_accum.clear();
    }

    fn enter_dcs_entry(&mut self) {
        self.state = State::DcsEntry;
        self.csi = CsiParams::default();
    }

    fn advance_escape(&mut self, byte: u8, out: &mut Vec<Action>) {
        match byte {
            0x1b => {} // stray ESC: stay in Escape, restart
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => self.execute_control(byte, out),
            b'[' => self.enter_csi_entry(),
            b']' => self.enter_osc_string(),
            b'_' => self.enter_apc_string(),
            b'P' => self.enter_dcs_entry(),
            b'X' | b'^' => self.enter_apc_string(), // SOS/PM: treated as APC-like passthrough
            b'\\' => self.reset_to_ground(),         // bare ST with nothing pending
            0x20..=0x2f => {
                self.esc_intermediates.push(byte);
                self.state = State::EscapeIntermediate;
            }
            0x30..=0x7e => {
                self.esc_dispatch(byte, out);
                self.reset_to_ground();
            }
            _ => {}
        }
    }

    fn advance_escape_intermediate(&mut self, byte: u8, out: &mut Vec<Action>) {
        match byte {
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => self.execute_control(byte, out),
            0x20..=0x2f => self.esc_intermediates.push(byte),
            0x30..=0x7e => {
                self.esc_dispatch(byte, out);
                self.reset_to_ground();
            }
            _ => {}
        }
    }

    fn esc_dispatch(&mut self, finl: u8, out: &mut Vec<Action>) {
        match (self.esc_intermediates.as_slice(), finl) {
            (&[], b'D') => out.push(Action::Index),
            (&[], b'E') => out.push(Action::NextLine),
            (&[], b'M') => out.push(Action::ReverseIndex),
            (&[], b'H') => out.push(Action::SetTabStop),
            (&[], b'c') => out.push(Action::FullReset),
            (&[], b'7') => out.push(Action::SaveCursor),
            (&[], b'8') => out.push(Action::RestoreCursor),
            (&[], b'=') => out.push(Action::ApplicationKeypad),
            (&[], b'>') => out.push(Action::NormalKeypad),
            (&[], b'N') => out.push(Action::SingleShift2),
            (&[], b'O') => out.push(Action::SingleShift3),
            (&[b'#'], b'8') => out.push(Action::ScreenAlignment),
            (&[b'('], letter) => out.push(Action::DesignateCharset {
                slot: 0,
                charset: CharsetId::from_final_byte(letter),
            }),
            (&[b')'], letter) => out.push(Action::DesignateCharset {
                slot: 1,
                charset: CharsetId::from_final_byte(letter),
            }),
            (&[b'*'], letter) => out.push(Action::DesignateCharset {
                slot: 2,
                charset: CharsetId::from_final_byte(letter),
            }),
            (&[b'+'], letter) => out.push(Action::DesignateCharset {
                slot: 3,
                charset: CharsetId::from_final_byte(letter),
            }),
            _ => {
                let mut raw = self.esc_intermediates.clone();
                raw.push(finl);
                out.push(Action::Escape(raw));
            }
        }
    }

    fn advance_csi_entry(&mut self, byte: u8, out: &mut Vec<Action>) {
        match byte {
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => self.execute_control(byte, out),
            b'0'..=b'9' => {
                self.csi.push_digit(byte - b'0');
                self.state = State::CsiParam;
            }
            b';' => {
                self.csi.next_param(false);
                self.state = State::CsiParam;
            }
            b':' => {
                self.csi.next_param(true);
                self.state = State::CsiParam;
            }
            b'<' | b'=' | b'>' | b'?' => {
                self.csi.prefix = Some(byte);
                self.state = State::CsiParam;
            }
            0x20..=0x2f => {
                self.csi.intermediates.push(byte);
                self.state = State::CsiIntermediate;
            }
            0x40..=0x7e => {
                self.csi_dispatch(byte, out);
                self.reset_to_ground();
            }
            _ => self.state = State::CsiIgnore,
        }
    }

    fn advance_csi_param(&mut self, byte: u8, out: &mut Vec<Action>) {
        match byte {
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => self.execute_control(byte, out),
            b'0'..=b'9' => self.csi.push_digit(byte - b'0'),
            b';' => self.csi.next_param(false),
            b':' => self.csi.next_param(true),
            0x20..=0x2f => {
                self.csi.intermediates.push(byte);
                self.state = State::CsiIntermediate;
            }
            0x40..=0x7e => {
                self.csi_dispatch(byte, out);
                self.reset_to_ground();
            }
            _ => self.state = State::CsiIgnore,
        }
    }

    fn advance_csi_intermediate(&mut self, byte: u8, out: &mut Vec<Action>) {
        match byte {
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => self.execute_control(byte, out),
            0x20..=0x2f => self.csi.intermediates.push(byte),
            0x40..=0x7e => {
                self.csi_dispatch(byte, out);
                self.reset_to_ground();
            }
            _ => self.state = State::CsiIgnore,
        }
    }

    fn advance_csi_ignore(&mut self, byte: u8) {
        if (0x40..=0x7e).contains(&byte) {
            self.reset_to_ground();
        }
    }

    fn csi_dispatch(&mut self, finl: u8, out: &mut Vec<Action>) {
        let p = &self.csi;
        let dec_prefixed = p.prefix == Some(b'?');
        match (dec_prefixed, p.intermediates.as_slice(), finl) {
            (false, &[], b'A') => out.push(Action::CursorUp(p.as_u16_or(0, 1).max(1))),
            (false, &[], b'B') | (false, &[], b'e') => {
                out.push(Action::CursorDown(p.as_u16_or(0, 1).max(1)));
            }
            (false, &[], b'C') | (false, &[], b'a') => {
                out.push(Action::CursorRight(p.as_u16_or(0, 1).max(1)));
            }
            (false, &[], b'D') => out.push(Action::CursorLeft(p.as_u16_or(0, 1).max(1))),
            (false, &[], b'E') => out.push(Action::CursorNextLine(p.as_u16_or(0, 1).max(1))),
            (false, &[], b'F') => out.push(Action::CursorPrevLine(p.as_u16_or(0, 1).max(1))),
            (false, &[], b'G') | (false, &[], b'`') => {
                out.push(Action::CursorColumn(p.as_u16_or(0, 1).max(1) - 1));
            }
            (false, &[], b'd') => out.push(Action::CursorRow(p.as_u16_or(0, 1).max(1) - 1)),
            (false, &[], b'H') | (false, &[], b'f') => out.push(Action::CursorPosition {
                row: p.as_u16_or(0, 1).max(1) - 1,
                col: p.as_u16_or(1, 1).max(1) - 1,
            }),
            (false, &[], b'Z') => out.push(Action::BackTab(p.as_u16_or(0, 1).max(1))),
            (false, &[], b'J') => {
                let mode = p.as_u16_or(0, 0) as u8;
                if mode == 3 {
                    out.push(Action::EraseScrollback);
                } else {
                    out.push(Action::EraseInDisplay(mode));
                }
            }
            (false, &[], b'K') => out.push(Action::EraseInLine(p.as_u16_or(0, 0) as u8)),
            (true, &[], b'J') => {
                out.push(Action::SelectiveEraseInDisplay(p.as_u16_or(0, 0) as u8));
            }
            (true, &[], b'K') => {
                out.push(Action::SelectiveEraseInLine(p.as_u16_or(0, 0) as u8));
            }
            (false, &[], b'L') => out.push(Action::InsertLines(p.as_u16_or(0, 1).max(1))),
            (false, &[], b'M') => out.push(Action::DeleteLines(p.as_u16_or(0, 1).max(1))),
            (false, &[], b'P') => out.push(Action::DeleteChars(p.as_u16_or(0, 1).max(1))),
            (false, &[], b'@') => out.push(Action::InsertChars(p.as_u16_or(0, 1).max(1))),
            (false, &[], b'X') => out.push(Action::EraseChars(p.as_u16_or(0, 1).max(1))),
            (false, &[], b'S') => out.push(Action::ScrollUp(p.as_u16_or(0, 1).max(1))),
            (false, &[], b'T') => out.push(Action::ScrollDown(p.as_u16_or(0, 1).max(1))),
            (false, &[], b'b') => out.push(Action::RepeatChar(p.as_u16_or(0, 1).max(1))),
            (false, &[], b'g') => out.push(Action::ClearTabStop(p.as_u16_or(0, 0) as u8)),
            (false, &[], b'm') => out.push(Action::Sgr(p.all_i64())),
            (false, &[], b'r') => {
                let top = p.as_u16_or(0, 1).max(1) - 1;
                let bottom = p.as_u16_or(1, 0);
                out.push(Action::SetScrollRegion { top, bottom });
            }
            (false, &[], b's') if p.prefix.is_none() => {
                let left = p.as_u16_or(0, 1).max(1) - 1;
                // Same 1-based-to-0-based conversion as `left`; an omitted
                // `Pr` stays the sentinel `0`, which `Cursor::set_left_right_
                // margin`'s invalid-range fallback already treats as "reset
                // to full width" (mirroring DECSTBM's identical convention).
                let right = p.as_u16_or(1, 0).saturating_sub(1);
                out.push(Action::SetLeftRightMargin { left, right });
            }
            (false, &[], b'h') => out.push(Action::AnsiSet(p.all_u16())),
            (false, &[], b'l') => out.push(Action::AnsiRst(p.all_u16())),
            (false, &[], b'n') => match p.as_i64(0) {
                Some(5) => out.push(Action::DeviceStatusReport),
                Some(6) => out.push(Action::CursorPositionReport),
                _ => {}
            },
            (false, &[], b't') => out.push(Action::WindowManipulation(p.all_u16())),
            (false, &[], b'c') if p.prefix == Some(b'>') => {
                out.push(Action::DeviceAttributesSecondary);
            }
            (false, &[], b'c') => out.push(Action::DeviceAttributes),
            (false, &[b' '], b'q') => {
                out.push(Action::SetCursorShape(CursorShape::from_param(
                    p.as_i64(0).unwrap_or(0),
                )));
            }
            (false, &[b'!'], b'p') => out.push(Action::SoftReset),
            (false, &[b'"'], b'q') => {
                out.push(Action::SetCharProtection(p.as_u16_or(0, 2) == 1));
            }
            (false, &[b'$'], b'p') => {
                out.push(Action::RequestMode {
                    dec: false,
                    mode: p.as_u16_or(0, 0),
                });
            }
            (true, &[b'$'], b'p') => {
                out.push(Action::RequestMode {
                    dec: true,
                    mode: p.as_u16_or(0, 0),
                });
            }
            (false, &[b'$'], b'z') => {
                out.push(Action::EraseRectArea {
                    top: p.as_u16_or(0, 0),
                    left: p.as_u16_or(1, 0),
                    bottom: p.as_u16_or(2, 0),
                    right: p.as_u16_or(3, 0),
                });
            }
            (false, &[b'$'], b'x') => {
                out.push(Action::FillRectArea {
                    ch: p.as_u16_or(0, 32),
                    top: p.as_u16_or(1, 0),
                    left: p.as_u16_or(2, 0),
                    bottom: p.as_u16_or(3, 0),
                    right: p.as_u16_or(4, 0),
                });
            }
            (false, &[b'$'], b'v') => {
                out.push(Action::CopyRectArea {
                    src_top: p.as_u16_or(0, 0),
                    src_left: p.as_u16_or(1, 0),
                    src_bottom: p.as_u16_or(2, 0),
                    src_right: p.as_u16_or(3, 0),
                    dst_top: p.as_u16_or(5, 0),
                    dst_left: p.as_u16_or(6, 0),
                });
            }
            (false, &[b'\''], b'}') => {
                out.push(Action::InsertColumns(p.as_u16_or(0, 1).max(1)));
            }
            (false, &[b'\''], b'~') => {
                out.push(Action::DeleteColumns(p.as_u16_or(0, 1).max(1)));
            }
            (true, &[], b'h') => out.push(Action::DecSet(p.all_u16())),
            (true, &[], b'l') => out.push(Action::DecRst(p.all_u16())),
            (true, &[], b's') => {
                // DECSET save: handled at the interpreter via DecSet/DecRst
                // history is insufficient, so emit a raw escape for the
                // interpreter to special-case private-mode save.
                let mut raw = vec![b'?'];
                raw.extend(p.all_i64().iter().map(|v| *v as u8));
                raw.push(b's');
                out.push(Action::Escape(raw));
            }
            (true, &[], b'r') => {
                let mut raw = vec![b'?'];
                raw.extend(p.all_i64().iter().map(|v| *v as u8));
                raw.push(b'r');
                out.push(Action::Escape(raw));
            }
            _ => {
                let mut raw = Vec::new();
                if let Some(prefix) = p.prefix {
                    raw.push(prefix);
                }
                raw.extend_from_slice(&p.intermediates);
                raw.extend(p.all_i64().iter().map(|v| *v as u8));
                raw.push(finl);
                out.push(Action::Escape(raw));
            }
        }
    }

    fn advance_string(&mut self, byte: u8, out: &mut Vec<Action>) {
        match byte {
            0x07 => self.end_string(out),
            0x18 | 0x1a => self.reset_to_ground(),
            0x1b => self.state = State::Escape,
            0x9c => self.end_string(out),
            _ => {
                if self.string_accum.len() < STRING_ACCUMULATOR_CAP {
                    self.string_accum.push(byte);
                }
            }
        }
    }

    fn end_string(&mut self, out: &mut Vec<Action>) {
        let bytes = std::mem::take(&mut self.string_accum);
        let kind = self.string_kind;
        let is_decrqss = kind == StringKind::Dcs
            && self.dcs_final == b'q'
            && self.csi.intermediates.as_slice() == [b'$'];
        self.reset_to_ground();
        match kind {
            StringKind::Osc => self.finish_osc(&bytes, out),
            StringKind::Dcs if is_decrqss => out.push(Action::RequestStatusString(bytes)),
            StringKind::Apc | StringKind::Dcs => out.push(Action::Escape(bytes)),
            StringKind::None => {}
        }
    }

    fn finish_osc(&mut self, bytes: &[u8], out: &mut Vec<Action>) {
        let text = String::from_utf8_lossy(bytes);
        let mut parts = text.splitn(2, ';');
        let code = parts
            .next()
            .unwrap_or("")
            .parse::<u32>()
            .unwrap_or(u32::MAX);
        let payload = parts.next().unwrap_or("");
        match code {
            0 => {
                out.push(Action::SetTitle(payload.to_string()));
                out.push(Action::SetIconTitle(payload.to_string()));
            }
            1 => out.push(Action::SetIconTitle(payload.to_string())),
            2 => out.push(Action::SetTitle(payload.to_string())),
            6 => {
                let uri = if payload.is_empty() {
                    None
                } else {
                    Some(payload.to_string())
                };
                out.push(Action::CurrentDocumentChanged(uri));
            }
            7 => {
                let uri = if payload.is_empty() {
                    None
                } else {
                    Some(payload.to_string())
                };
                out.push(Action::CurrentDirectoryChanged(uri));
            }
            8 => {
                let mut fields = payload.splitn(2, ';');
                let params = fields.next().unwrap_or("").to_string();
                let uri = fields.next().unwrap_or("").to_string();
                if uri.is_empty() {
                    out.push(Action::HyperlinkEnd);
                } else {
                    out.push(Action::HyperlinkStart(Hyperlink { params, uri }));
                }
            }
            _ => out.push(Action::Escape(bytes.to_vec())),
        }
    }

    fn advance_dcs_entry(&mut self, byte: u8, out: &mut Vec<Action>) {
        match byte {
            b'0'..=b'9' => {
                self.csi.push_digit(byte - b'0');
                self.state = State::DcsParam;
            }
            b';' => {
                self.csi.next_param(false);
                self.state = State::DcsParam;
            }
            b'<' | b'=' | b'>' | b'?' => {
                self.csi.prefix = Some(byte);
                self.state = State::DcsParam;
            }
            0x20..=0x2f => {
                self.csi.intermediates.push(byte);
                self.state = State::DcsIntermediate;
            }
            0x40..=0x7e => self.enter_dcs_passthrough(byte),
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => {}
            _ => self.state = State::DcsIgnore,
        }
        let _ = out;
    }

    fn advance_dcs_param(&mut self, byte: u8, _out: &mut Vec<Action>) {
        match byte {
            b'0'..=b'9' => self.csi.push_digit(byte - b'0'),
            b';' => self.csi.next_param(false),
            0x20..=0x2f => {
                self.csi.intermediates.push(byte);
                self.state = State::DcsIntermediate;
            }
            0x40..=0x7e => self.enter_dcs_passthrough(byte),
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => {}
            _ => self.state = State::DcsIgnore,
        }
    }

    fn advance_dcs_intermediate(&mut self, byte: u8, _out: &mut Vec<Action>) {
        match byte {
            0x20..=0x2f => self.csi.intermediates.push(byte),
            0x40..=0x7e => self.enter_dcs_passthrough(byte),
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => {}
            _ => self.state = State::DcsIgnore,
        }
    }

    fn advance_dcs_ignore(&mut self, byte: u8) {
        if byte == 0x9c {
            self.reset_to_ground();
        }
    }

    fn enter_dcs_passthrough(&mut self, finl: u8) {
        self.state = State::DcsPassthrough;
        self.string_kind = StringKind::Dcs;
        self.string_accum.clear();
        self.dcs_final = finl;
    }

    /// Number of parser-accumulator bytes currently buffered (OSC/APC/DCS
    /// string payload). Exposed for a test asserting the overflow cap holds.
    #[cfg(test)]
    fn accumulator_len(&self) -> usize {
        self.string_accum.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(s: &str) -> Vec<Action> {
        Parser::new().feed(s.as_bytes())
    }

    #[test]
    fn prints_plain_text() {
        let actions = feed("Hi");
        assert_eq!(actions, vec![Action::Print('H'), Action::Print('i')]);
    }

    #[test]
    fn decodes_multibyte_utf8_in_ground_fast_path() {
        let actions = feed("中");
        assert_eq!(actions, vec![Action::Print('中')]);
    }

    #[test]
    fn c0_controls_emit_their_actions() {
        let actions = feed("\r\n\t\x07\x08");
        assert_eq!(
            actions,
            vec![
                Action::CarriageReturn,
                Action::Newline,
                Action::Tab,
                Action::Bell,
                Action::Backspace
            ]
        );
    }

    #[test]
    fn csi_cup_parses_row_and_col_one_based() {
        let actions = feed("\x1b[10;5H");
        assert_eq!(actions, vec![Action::CursorPosition { row: 9, col: 4 }]);
    }

    #[test]
    fn csi_cup_defaults_to_home_when_omitted() {
        let actions = feed("\x1b[H");
        assert_eq!(actions, vec![Action::CursorPosition { row: 0, col: 0 }]);
    }

    #[test]
    fn csi_sgr_collects_all_params_including_empty_as_zero() {
        let actions = feed("\x1b[1;;31m");
        assert_eq!(actions, vec![Action::Sgr(vec![1, 0, 31])]);
    }

    #[test]
    fn csi_sgr_subparameters_accepted_with_colon_separator() {
        let actions = feed("\x1b[38:2::255:0:0m");
        assert_eq!(actions, vec![Action::Sgr(vec![38, 2, 0, 255, 0, 0])]);
    }

    #[test]
    fn dec_private_mode_set_and_reset() {
        assert_eq!(feed("\x1b[?25h"), vec![Action::DecSet(vec![25])]);
        assert_eq!(feed("\x1b[?25l"), vec![Action::DecRst(vec![25])]);
    }

    #[test]
    fn ansi_mode_set_and_reset_without_prefix() {
        assert_eq!(feed("\x1b[4h"), vec![Action::AnsiSet(vec![4])]);
        assert_eq!(feed("\x1b[4l"), vec![Action::AnsiRst(vec![4])]);
    }

    #[test]
    fn osc_set_title_parses_code_and_payload() {
        let actions = feed("\x1b]0;my title\x07");
        assert_eq!(
            actions,
            vec![
                Action::SetTitle("my title".to_string()),
                Action::SetIconTitle("my title".to_string()),
            ]
        );
    }

    #[test]
    fn osc_2_sets_window_title_only() {
        let actions = feed("\x1b]2;window only\x07");
        assert_eq!(actions, vec![Action::SetTitle("window only".to_string())]);
    }

    #[test]
    fn osc_7_reports_current_directory() {
        let actions = feed("\x1b]7;file://host/home/user\x07");
        assert_eq!(
            actions,
            vec![Action::CurrentDirectoryChanged(Some(
                "file://host/home/user".to_string()
            ))]
        );
        let cleared = feed("\x1b]7;\x07");
        assert_eq!(cleared, vec![Action::CurrentDirectoryChanged(None)]);
    }

    #[test]
    fn osc_8_hyperlink_start_and_end() {
        let start = feed("\x1b]8;id=1;https://example.com\x1b\\");
        assert_eq!(
            start,
            vec![Action::HyperlinkStart(Hyperlink {
                params: "id=1".to_string(),
                uri: "https://example.com".to_string(),
            })]
        );
        let end = feed("\x1b]8;;\x07");
        assert_eq!(end, vec![Action::HyperlinkEnd]);
    }

    #[test]
    fn esc_charset_designation() {
        let actions = feed("\x1b(0");
        assert_eq!(
            actions,
            vec![Action::DesignateCharset {
                slot: 0,
                charset: CharsetId::DecSpecialGraphics,
            }]
        );
    }

    #[test]
    fn unknown_csi_final_byte_falls_back_to_escape_action() {
        let actions = feed("\x1b[5y");
        assert!(matches!(actions.as_slice(), [Action::Escape(_)]));
    }

    #[test]
    fn parser_is_byte_chunking_invariant() {
        let input = b"\x1b[1;2H\x1b[31mHi\x1b[0m\r\n";
        let whole = Parser::new().feed(input);

        let mut parser = Parser::new();
        let mut chunked = Vec::new();
        for byte in input {
            chunked.extend(parser.feed(std::slice::from_ref(byte)));
        }
        assert_eq!(whole, chunked);
    }

    #[test]
    fn numeric_overflow_clamps_to_zero() {
        let actions = feed("\x1b[99999999999C");
        assert_eq!(actions, vec![Action::CursorRight(1)]);
    }

    #[test]
    fn string_accumulator_is_capped() {
        let mut parser = Parser::new();
        let long_payload = "x".repeat(STRING_ACCUMULATOR_CAP + 10);
        let input = format!("\x1b]0;{long_payload}\x07");
        parser.feed(&input.as_bytes()[..input.len() - 1]);
        assert_eq!(parser.accumulator_len(), STRING_ACCUMULATOR_CAP);
    }

    #[test]
    fn index_and_reverse_index_escape_sequences() {
        assert_eq!(feed("\x1bD"), vec![Action::Index]);
        assert_eq!(feed("\x1bM"), vec![Action::ReverseIndex]);
        assert_eq!(feed("\x1bE"), vec![Action::NextLine]);
    }

    #[test]
    fn full_reset_escape_sequence() {
        assert_eq!(feed("\x1bc"), vec![Action::FullReset]);
    }

    #[test]
    fn repeat_char_csi_b() {
        assert_eq!(feed("\x1b[5b"), vec![Action::RepeatChar(5)]);
    }

    #[test]
    fn decslrm_converts_both_fields_to_0_based_inclusive() {
        let actions = feed("\x1b[5;70s");
        assert_eq!(actions, vec![Action::SetLeftRightMargin { left: 4, right: 69 }]);
    }

    #[test]
    fn decslrm_with_omitted_right_keeps_the_reset_sentinel() {
        let actions = feed("\x1b[5s");
        assert_eq!(actions, vec![Action::SetLeftRightMargin { left: 4, right: 0 }]);
    }

    #[test]
    fn window_manipulation_resize_request() {
        assert_eq!(feed("\x1b[8;24;80t"), vec![Action::WindowManipulation(vec![8, 24, 80])]);
    }

    #[test]
    fn decrqss_sgr_is_recognized_and_carries_pt_payload() {
        let actions = feed("\x1bP$qm\x1b\\");
        assert_eq!(actions, vec![Action::RequestStatusString(b"m".to_vec())]);
    }

    #[test]
    fn decrqss_decstbm_payload_is_carried_raw() {
        let actions = feed("\x1bP$qr\x1b\\");
        assert_eq!(actions, vec![Action::RequestStatusString(b"r".to_vec())]);
    }

    #[test]
    fn dcs_sequence_without_decrqss_shape_falls_back_to_escape() {
        // No `$` intermediate before the final byte, so this isn't DECRQSS —
        // it stays the generic passthrough.
        let actions = feed("\x1bPq1;1;1;1;1#0\x1b\\");
        assert!(matches!(actions.as_slice(), [Action::Escape(_)]));
    }

    #[test]
    fn decsed_and_decsel_are_dec_prefixed_variants_of_ed_el() {
        assert_eq!(feed("\x1b[?1J"), vec![Action::SelectiveEraseInDisplay(1)]);
        assert_eq!(feed("\x1b[?2K"), vec![Action::SelectiveEraseInLine(2)]);
        // Unprefixed stays the plain (non-selective) variant.
        assert_eq!(feed("\x1b[1J"), vec![Action::EraseInDisplay(1)]);
    }

    #[test]
    fn decsca_maps_ps_1_to_protected_and_0_2_to_unprotected() {
        assert_eq!(feed("\x1b[1\"q"), vec![Action::SetCharProtection(true)]);
        assert_eq!(feed("\x1b[0\"q"), vec![Action::SetCharProtection(false)]);
        assert_eq!(feed("\x1b[2\"q"), vec![Action::SetCharProtection(false)]);
        // Omitted Ps defaults to 2 (unprotected) per DEC's spec.
        assert_eq!(feed("\x1b[\"q"), vec![Action::SetCharProtection(false)]);
    }

    #[test]
    fn decrqm_carries_the_dec_prefix_flag_and_mode_number() {
        assert_eq!(
            feed("\x1b[?25$p"),
            vec![Action::RequestMode { dec: true, mode: 25 }]
        );
        assert_eq!(
            feed("\x1b[4$p"),
            vec![Action::RequestMode { dec: false, mode: 4 }]
        );
    }

    #[test]
    fn decera_carries_raw_1_based_rectangle_params() {
        assert_eq!(
            feed("\x1b[2;3;10;20$z"),
            vec![Action::EraseRectArea { top: 2, left: 3, bottom: 10, right: 20 }]
        );
    }

    #[test]
    fn decfra_carries_fill_char_code_and_rectangle() {
        assert_eq!(
            feed("\x1b[65;1;1;5;5$x"),
            vec![Action::FillRectArea { ch: 65, top: 1, left: 1, bottom: 5, right: 5 }]
        );
    }

    #[test]
    fn deccra_carries_source_and_destination_with_pages_ignored() {
        assert_eq!(
            feed("\x1b[1;1;5;5;1;10;10;1$v"),
            vec![Action::CopyRectArea {
                src_top: 1,
                src_left: 1,
                src_bottom: 5,
                src_right: 5,
                dst_top: 10,
                dst_left: 10,
            }]
        );
    }

    #[test]
    fn decic_and_decdc_default_to_one_column() {
        assert_eq!(feed("\x1b['}"), vec![Action::InsertColumns(1)]);
        assert_eq!(feed("\x1b[3'~"), vec![Action::DeleteColumns(3)]);
    }
}
