//! Unicode display-width lookups for the print path.
//!
//! Three-way classification used throughout the engine: zero (combining
//! marks and other non-spacing scalars — attach to the previous cell instead
//! of advancing the cursor), one (the common case), or two (East-Asian wide
//! and most emoji).

use unicode_width::UnicodeWidthChar;

/// Display width of a single scalar value, in terminal columns.
///
/// Returns `0` for combining marks and other zero-width scalars, `1` for
/// ordinary narrow characters, `2` for wide (CJK, emoji, etc.) characters.
/// Control characters (which `UnicodeWidthChar` reports as `None`) are
/// treated as width 1 here; the parser never routes C0/C1 bytes through the
/// print path, so this only matters for raw display-width queries.
#[must_use]
pub fn display_width(ch: char) -> u8 {
    match ch.width() {
        Some(w) => w.min(2) as u8,
        None => 1,
    }
}
