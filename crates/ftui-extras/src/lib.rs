#![forbid(unsafe_code)]

//! Optional feature-gated extensions for FrankenTUI.
//!
//! Trimmed to the `terminal` feature: the only module `frankenterm-core`
//! exercises, as an independent `vte`-based reference implementation for
//! differential testing.
//!
//! | Feature | Module | Description |
//! |---------|--------|-------------|
//! | `terminal` | [`terminal`] | ANSI escape sequence parser for terminal emulation |

#[cfg(feature = "terminal")]
pub mod terminal;
