#![forbid(unsafe_code)]

//! Host-agnostic VT/ANSI terminal engine.
//!
//! `frankenterm-core` is the platform-independent terminal model at the heart of
//! FrankenTerm. It owns grid state, VT/ANSI parsing, cursor positioning, and
//! scrollback — all without any host I/O dependencies.
//!
//! # Primary responsibilities
//!
//! - **Buffer/BufferSet**: the live screen model (normal + alternate), a
//!   `Ring` of `Line`s plus cursor/viewport bookkeeping.
//! - **Grid**: flat 2D cell matrix kept for callers that want a
//!   fixed-size snapshot rather than `Buffer`'s scrollback-backed ring.
//! - **Cell**: character content + SGR attributes (colors, bold, italic, etc.).
//! - **Parser**: VT/ANSI state machine (DEC VT500 model, 14 states).
//! - **Interpreter**: dispatches parsed `Action`s onto a `BufferSet`, drives
//!   `Modes`, and calls back into a `Delegate` for anything host-visible.
//! - **Terminal**: the top-level `feed`/`resize`/`reset` entry point wiring
//!   `Parser` + `Interpreter` together.
//! - **Cursor**: position, visibility, and origin/autowrap mode tracking.
//! - **Modes**: DEC private modes and ANSI standard modes.
//! - **Patch**: minimal diff between two grid snapshots for efficient updates.
//! - **Scrollback**: ring buffer for lines scrolled off the top of the viewport.
//!
//! # Design principles
//!
//! - **No I/O**: all types are pure data + logic; the host adapter supplies bytes.
//! - **Deterministic**: identical byte sequences always produce identical state.
//! - **`#![forbid(unsafe_code)]`**: safety enforced at compile time.

pub mod buffer;
pub mod cell;
pub mod charset;
pub mod cursor;
pub mod delegate;
pub mod grid;
pub mod interpreter;
pub mod line;
pub mod modes;
pub mod parser;
pub mod patch;
pub mod ring;
pub mod scrollback;
pub mod selection;
pub mod term;
pub mod width;

pub use buffer::{Buffer, BufferSet, EraseMode};
pub use cell::{Cell, CellFlags, Color, HyperlinkId, HyperlinkRegistry, SgrAttrs, SgrFlags};
pub use charset::{translate_charset, CharsetId};
pub use cursor::{Cursor, SavedCursor};
pub use delegate::{Delegate, MouseReportMode, NullDelegate};
pub use grid::Grid;
pub use interpreter::Interpreter;
pub use line::Line;
pub use modes::{AnsiModes, DecModes, Modes};
pub use parser::{Action, CursorShape, Hyperlink, MouseEvent, Parser};
pub use patch::{CellUpdate, ChangeRun, DirtySpan, DirtyTracker, GridDiff, Patch};
pub use ring::Ring;
pub use scrollback::{Scrollback, ScrollbackLine};
pub use selection::{BufferPos, Selection};
pub use term::{Config, Terminal};
