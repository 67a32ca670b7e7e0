#![forbid(unsafe_code)]

//! Animation callbacks: event hooks at animation milestones.
//!
//! [`Callbacks`] wraps any [`Animation`] and tracks milestone events
//! (start, completion, progress thresholds) that can be polled via
//! [`drain_events`](Callbacks::drain_events).
//!
//! # Usage
//!
//! ```ignore
//! use std::time::Duration;
//! use ftui_core::animation::{Fade, callbacks::{Callbacks, AnimationEvent}};
//!
//! let mut anim = Callbacks::new(Fade::new(Duration::from_millis(500)))
//!     .on_start()
//!     .on_complete()
//!     .at_progress(0.5);
//!
//! anim.tick(Duration::from_millis(300));
//! for event in anim.drain_events() {
//!     match event {
//!         AnimationEvent::Started => { /* ... */ }
//!         AnimationEvent::Progress(pct) => { /* crossed 50% */ }
//!         AnimationEvent::Completed => { /* ... */ }
//!         _ => {}
//!     }
//! }
//! ```
//!
//! # Design
//!
//! Events are collected into an internal queue during `tick()` and drained
//! by the caller. This avoids closures/callbacks (which don't compose well
//! in Elm architectures) and keeps the API pure.
//!
//! # Invariants
//!
//! 1. `Started` fires at most once per play-through (after first `tick()`).
//! 2. `Completed` fires at most once (when `is_complete()` transitions to true).
//! 3. Progress thresholds fire at most once each, in ascending order.
//! 4. `drain_events()` clears the queue — events are not replayed.
//! 5. `reset()` resets all tracking state so events can fire again.
//!
//! # Failure Modes
//!
//! - Threshold out of range (< 0 or > 1): clamped to [0.0, 1.0].
//! - Duplicate thresholds: each fires independently.

use std::time::Duration;

use super::Animation;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// An event emitted by a [`Callbacks`]-wrapped animation.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationEvent {
    /// The animation received its first tick.
    Started,
    /// The animation crossed a progress threshold (value in [0.0, 1.0]).
    Progress(f32),
    /// The animation completed.
    Completed,
}

/// Configuration for which events to track.
#[derive(Debug, Clone, Default)]
struct EventConfig {
    on_start: bool,
    on_complete: bool,
    /// Sorted thresholds in [0.0, 1.0].
    thresholds: Vec<f32>,
}

/// Tracking state for fired events.
#[derive(Debug, Clone, Default)]
struct EventState {
    started_fired: bool,
    completed_fired: bool,
    /// Which thresholds have been crossed (parallel to config.thresholds).
    thresholds_fired: Vec<bool>,
}

/// An animation wrapper that emits events at milestones.
///
/// Wraps any `Animation` and queues [`AnimationEvent`]s during `tick()`.
/// Call [`drain_events`](Self::drain_events) to retrieve and clear them.
pub struct Callbacks<A> {
    inner: A,
    config: EventConfig,
    state: EventState,
    events: Vec<AnimationEvent>,
}

impl<A: std::fmt::Debug> std::fmt::Debug for Callbacks<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("inner", &self.inner)
            .field("pending_events", &self.events.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl<A: Animation> Callbacks<A> {
    /// Wrap an animation with callback tracking.
    #[must_use]
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            config: EventConfig::default(),
            state: EventState::default(),
            events: Vec::new(),
        }
    }

    /// Enable the `Started` event (builder pattern).
    #[must_use]
    pub fn on_start(mut self) -> Self {
        self.config.on_start = true;
        self
    }

    /// Enable the `Completed` event (builder pattern).
    #[must_use]
    pub fn on_complete(mut self) -> Self {
        self.config.on_complete = true;
        self
    }

    /// Add a progress threshold event (builder pattern).
    ///
    /// Fires when the animation's value crosses `threshold` (clamped to [0.0, 1.0]).
    #[must_use]
    pub fn at_progress(mut self, threshold: f32) -> Self {
        if !threshold.is_finite() {
            return self;
        }
        let clamped = threshold.clamp(0.0, 1.0);
        let idx = self
            .config
            .thresholds
            .partition_point(|&value| value <= clamped);
        self.config.thresholds.insert(idx, clamped);
        self.state.thresholds_fired.insert(idx, false);
        self
    }

    /// Access the inner animation.
    #[must_use]
    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Mutable access to the inner animation.
    pub fn inner_mut(&mut self) -> &mut A {
        &mut self.inner
    }

    /// Drain all pending events. Clears the event queue.
    pub fn drain_events(&mut self) -> Vec<AnimationEvent> {
        std::mem::take(&mut self.events)
    }

    /// Number of pending events.
    #[must_use]
    pub fn pending_event_count(&self) -> usize {
        self.events.len()
    }

    /// Check events after a tick.
    fn check_events(&mut self) {
        let value = self.inner.value();

        // Started: fires on first tick.
        if self.config.on_start && !self.state.started_fired {
            self.state.started_fired = true;
            self.events.push(AnimationEvent::Started);
        }

        // Progress thresholds.
        for (i, &threshold) in self.config.thresholds.iter().enumerate() {
            if !self.state.thresholds_fired[i] && value >= threshold {
                self.state.thresholds_fired[i] = true;
                self.events.push(AnimationEvent::Progress(threshold));
            }
        }

        // Completed: fires when animation transitions to complete.
        if self.config.on_complete && !self.state.completed_fired && self.inner.is_complete() {
            self.state.completed_fired = true;
            self.events.push(AnimationEvent::Completed);
        }
    }
}

// ---------------------------------------------------------------------------
// Animation trait implementation
// ---------------------------------------------------------------------------

impl<A: Animation> Animation for Callbacks<A> {
    fn tick(&mut self, dt: Duration) {
        self.inner.tick(dt);
        self.check_events();
    }

    fn is_complete(&self) -> bool {
        self.inner.is_complete()
    }

    fn value(&self) -> f32 {
        self.inner.value()
    }

    fn reset(&mut self) {
        self.inner.reset();
        self.state.started_fired = false;
        self.state.completed_fired = false;
        for fired in &mut self.state.thresholds_fired {
            *fired = false;
        }
        self.events.clear();
    }

    fn overshoot(&self) -> Duration {
        self.inner.overshoot()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
