//! The Feed API: the top-level type a host constructs, feeds child-process
//! bytes into, and queries for rendering. Wires a [`Parser`] to an
//! [`Interpreter`] and exposes the handful of entry points spec'd for a
//! host-agnostic engine — everything else lives on `Interpreter`/`BufferSet`.

use crate::delegate::Delegate;
use crate::interpreter::Interpreter;
use crate::parser::Parser;

/// ANSI 256-color palette generation strategy for indices 16..=255 (the
/// 6x6x6 color cube plus the 24-step grayscale ramp). `Exact` reproduces
/// xterm's reference palette; `Linear` is a cheaper approximation some
/// embedders prefer for custom themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ansi256PaletteStrategy {
    Exact,
    Linear,
}

/// Terminal-wide configuration, supplied once at construction. Fields with
/// no runtime effect in this engine (e.g. `screen_reader_mode`) are still
/// carried and exposed so a host can honor them at its own layer.
#[derive(Debug, Clone)]
pub struct Config {
    pub cols: u16,
    pub rows: u16,
    /// Maximum history lines retained beyond the visible viewport.
    pub scrollback: usize,
    pub cursor_style: crate::parser::CursorShape,
    pub tab_stop_width: u16,
    pub term_name: String,
    /// Translate a bare LF into CRLF on print (some hosts want this instead
    /// of relying on LNM).
    pub convert_eol: bool,
    /// Advisory: host should announce screen changes through an
    /// accessibility layer; has no effect on engine behavior.
    pub screen_reader_mode: bool,
    /// Whether DA1 advertises Sixel support (bit 4, `;4;`) to the child.
    pub enable_sixel_reported: bool,
    /// Soft cap a host may enforce on attached image/sixel payload memory;
    /// the engine does not allocate against this itself.
    pub image_cache_limit_bytes: usize,
    pub ansi256_palette_strategy: Ansi256PaletteStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cols: 80,
            rows: 24,
            scrollback: 1000,
            cursor_style: crate::parser::CursorShape::Default,
            tab_stop_width: 8,
            term_name: "xterm-256color".to_string(),
            convert_eol: false,
            screen_reader_mode: false,
            enable_sixel_reported: false,
            image_cache_limit_bytes: 0,
            ansi256_palette_strategy: Ansi256PaletteStrategy::Exact,
        }
    }
}

/// The engine entry point: owns a [`Parser`] and [`Interpreter`], and is the
/// only thing a host needs to construct. `feed`/`feed_str` are the sole
/// mutation paths driven by child-process output; everything else (resize,
/// reset, buffer/cursor inspection) is a direct method here or reached via
/// [`Terminal::interpreter`].
pub struct Terminal {
    parser: Parser,
    interpreter: Interpreter,
    config: Config,
}

impl Terminal {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut interpreter = Interpreter::new(config.cols, config.rows, config.scrollback);
        interpreter.set_convert_eol(config.convert_eol);
        interpreter.set_tab_stop_width(config.tab_stop_width);
        Self {
            parser: Parser::new(),
            interpreter,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Feed a chunk of child-process output. Bytes may be split at
    /// arbitrary boundaries (including mid-UTF-8, mid-escape-sequence)
    /// across calls; parser and interpreter state persist between them.
    /// Delegate callbacks (including any reply bytes) are invoked
    /// synchronously before this returns.
    pub fn feed(&mut self, bytes: &[u8], delegate: &mut dyn Delegate) {
        for action in self.parser.feed(bytes) {
            self.interpreter.apply(action, delegate);
        }
    }

    /// Convenience for hosts that already have `str` data (e.g. piping a
    /// local command's stdout through the same engine a PTY would feed).
    pub fn feed_str(&mut self, text: &str, delegate: &mut dyn Delegate) {
        self.feed(text.as_bytes(), delegate);
    }

    /// Resize both buffers and notify the delegate.
    pub fn resize(&mut self, cols: u16, rows: u16, delegate: &mut dyn Delegate) {
        self.config.cols = cols;
        self.config.rows = rows;
        self.interpreter.resize(cols, rows);
        delegate.size_changed(cols, rows);
    }

    /// RIS — full reset, as if the child sent `ESC c`.
    pub fn reset(&mut self) {
        self.parser = Parser::new();
        self.interpreter.full_reset();
    }
}
