#![forbid(unsafe_code)]

//! Stagger utilities: coordinated delay offsets for animation lists.
//!
//! [`stagger`] produces delay offsets for a sequence of items, useful for
//! cascading entrance/exit animations. Combined with [`Delayed`] and
//! [`AnimationGroup`], this enables staggered list-item animations.
//!
//! # Usage
//!
//! ```ignore
//! use std::time::Duration;
//! use ftui_core::animation::{Fade, AnimationGroup, stagger};
//! use ftui_core::animation::stagger::{StaggerMode, stagger_offsets};
//!
//! let offsets = stagger_offsets(5, Duration::from_millis(50), StaggerMode::Linear);
//! let mut group = AnimationGroup::new();
//! for (i, offset) in offsets.into_iter().enumerate() {
//!     let anim = ftui_core::animation::delay(offset, Fade::new(Duration::from_millis(200)));
//!     group.insert(&format!("item_{i}"), Box::new(anim));
//! }
//! ```
//!
//! # Invariants
//!
//! 1. `stagger_offsets(0, ..)` returns an empty vec.
//! 2. First offset is always `Duration::ZERO`.
//! 3. Offsets are monotonically non-decreasing for all modes except `Random`.
//! 4. For `Linear`, offset[i] = i * delay.
//! 5. For `EaseIn`/`EaseOut`/`EaseInOut`, offsets follow the corresponding
//!    easing curve scaled to `(count - 1) * delay`.
//! 6. For `Random`, offsets are within `[0, (count - 1) * delay]` with
//!    deterministic seeding when a seed is provided.
//!
//! # Failure Modes
//!
//! - Zero count: returns empty vec.
//! - Count of 1: returns `[Duration::ZERO]`.
//! - Zero delay: all offsets are `Duration::ZERO`.

use std::time::Duration;

use super::{ease_in, ease_in_out, ease_out, EasingFn};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How to distribute delay offsets across items.
#[derive(Debug, Clone, Copy)]
pub enum StaggerMode {
    /// Equal spacing: offset[i] = i * delay.
    Linear,
    /// Slow start, accelerating gaps (quadratic ease-in).
    EaseIn,
    /// Fast start, decelerating gaps (quadratic ease-out).
    EaseOut,
    /// Slow start and end, faster middle (quadratic ease-in-out).
    EaseInOut,
    /// Custom easing function applied to normalized position.
    Custom(EasingFn),
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Compute stagger delay offsets for `count` items.
///
/// Each offset represents when that item's animation should begin.
/// The first item always starts at `Duration::ZERO`, and the last item
/// starts at `(count - 1) * delay` (for `Linear` mode).
///
/// For eased modes, the total span is `(count - 1) * delay` but the
/// distribution follows the easing curve.
#[must_use]
pub fn stagger_offsets(count: usize, delay: Duration, mode: StaggerMode) -> Vec<Duration> {
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![Duration::ZERO];
    }

    // For Linear mode, use exact integer arithmetic to avoid float drift.
    if matches!(mode, StaggerMode::Linear) {
        return (0..count)
            .map(|i| delay.saturating_mul(i as u32))
            .collect();
    }

    let total_nanos = delay.as_nanos() as f64 * (count - 1) as f64;
    let easing: EasingFn = match mode {
        StaggerMode::Linear => unreachable!(),
        StaggerMode::EaseIn => ease_in,
        StaggerMode::EaseOut => ease_out,
        StaggerMode::EaseInOut => ease_in_out,
        StaggerMode::Custom(f) => f,
    };

    (0..count)
        .map(|i| {
            let t = i as f32 / (count - 1) as f32;
            let eased = easing(t);
            let nanos = (total_nanos * eased as f64) as u64;
            Duration::from_nanos(nanos)
        })
        .collect()
}

/// Compute stagger offsets with random jitter.
///
/// Each offset gets a random perturbation in `[-jitter, +jitter]`,
/// clamped to `Duration::ZERO` at the lower bound. Uses a simple
/// deterministic PRNG seeded from `seed` for reproducibility.
///
/// The base offsets follow `mode` before jitter is applied.
#[must_use]
pub fn stagger_offsets_with_jitter(
    count: usize,
    delay: Duration,
    mode: StaggerMode,
    jitter: Duration,
    seed: u64,
) -> Vec<Duration> {
    let mut offsets = stagger_offsets(count, delay, mode);
    if jitter.is_zero() || offsets.is_empty() {
        return offsets;
    }

    // Simple xorshift64 PRNG for deterministic jitter.
    let mut state = seed.wrapping_add(1); // Avoid 0 state.
    let jitter_nanos = jitter.as_nanos() as i64;

    for offset in &mut offsets {
        // xorshift64
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;

        // Map to [-jitter_nanos, +jitter_nanos]
        let raw = (state as i64) % (2 * jitter_nanos + 1) - jitter_nanos;
        let base_nanos = offset.as_nanos() as i64;
        let jittered = (base_nanos + raw).max(0) as u64;
        *offset = Duration::from_nanos(jittered);
    }

    offsets
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
