//! The host callback surface: everything the engine needs to report back to
//! whatever owns the child process and the screen, without the engine
//! itself touching any I/O.
//!
//! Every method has a no-op default body, mirroring `ftui-pty`'s
//! `virtual_terminal` advisory-callback convention — a host implements only
//! the handful of callbacks it actually cares about.

use crate::parser::CursorShape;

/// Reasons a mode-reporting callback fires, kept narrow to the variants the
/// engine actually distinguishes for hosts (full DEC mode state is always
/// available via `Terminal::modes` if a host wants more detail).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseReportMode {
    Off,
    X10,
    Vt200,
    ButtonEvent,
    AnyEvent,
}

/// Host-facing callback trait. Held as `&mut dyn Delegate` by the
/// interpreter so the crate stays free of any concrete I/O dependency.
pub trait Delegate {
    /// Bytes the engine wants written back to the child (device attribute
    /// replies, cursor position reports, mouse event encodings, paste
    /// acknowledgements).
    fn send(&mut self, _bytes: &[u8]) {}

    /// OSC 0/2: window title changed.
    fn set_title(&mut self, _title: &str) {}

    /// OSC 1: icon title changed.
    fn set_icon_title(&mut self, _title: &str) {}

    /// BEL.
    fn bell(&mut self) {}

    /// The child requested a resize via `CSI 8 ; rows ; cols t`.
    fn size_changed(&mut self, _cols: u16, _rows: u16) {}

    /// The viewport's displayed-top row advanced (user-visible scroll).
    fn scrolled(&mut self, _y_disp: usize) {}

    /// Advisory: a linefeed occurred.
    fn linefeed(&mut self) {}

    /// A mouse-tracking DEC private mode changed.
    fn mouse_mode_changed(&mut self, _mode: MouseReportMode) {}

    /// DECSCUSR changed the cursor's rendered shape.
    fn cursor_style_changed(&mut self, _style: CursorShape) {}

    /// OSC 8: the host should offer to open `uri` (the raw `params` string
    /// is passed through uninterpreted beyond what the parser already split
    /// off from the URI).
    fn request_open_link(&mut self, _uri: &str, _params: &str) {}

    /// OSC 7: the child reported its current working directory (`None` if
    /// the sequence carried an empty URI, clearing the prior value).
    fn host_current_directory_updated(&mut self, _uri: Option<&str>) {}

    /// OSC 6: the child reported the document associated with the session.
    fn host_current_document_updated(&mut self, _uri: Option<&str>) {}

    /// Gates privileged operations (OSC 52 clipboard writes, etc.) on
    /// whether the host considers the child process trusted. Defaults to
    /// `false`, the conservative choice.
    fn is_process_trusted(&mut self) -> bool {
        false
    }
}

/// A `Delegate` that does nothing and trusts nothing; useful for tests and
/// for callers that only want engine state, never child replies.
#[derive(Debug, Default)]
pub struct NullDelegate;

impl Delegate for NullDelegate {}
