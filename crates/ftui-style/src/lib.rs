#![forbid(unsafe_code)]

//! Color types and theme slots shared by FrankenTUI's rendering crates.

pub mod color;
pub mod theme;

pub use color::{Ansi16, CacheStats, Color, ColorCache, ColorProfile, MonoColor, Rgb};
pub use theme::{AdaptiveColor, Theme};
