#![forbid(unsafe_code)]

//! Animation group: shared lifecycle management for multiple animations.
//!
//! An [`AnimationGroup`] holds a collection of named [`Animation`] handles
//! that can be controlled together (play all, cancel all) or individually.
//! The group itself implements [`Animation`], reporting the average progress
//! of all members.
//!
//! # Usage
//!
//! ```ignore
//! use std::time::Duration;
//! use ftui_core::animation::{Fade, AnimationGroup};
//!
//! let mut group = AnimationGroup::new()
//!     .add("fade_in", Fade::new(Duration::from_millis(300)))
//!     .add("fade_out", Fade::new(Duration::from_millis(500)));
//!
//! group.start_all();
//! group.tick(Duration::from_millis(100));
//! let fade_in_val = group.get("fade_in").unwrap().value();
//! ```
//!
//! # Invariants
//!
//! 1. Each member has a unique string label; duplicate labels overwrite.
//! 2. `start_all()` / `cancel_all()` affect every member simultaneously.
//! 3. `overall_progress()` returns the mean of all members' `value()`.
//! 4. An empty group has progress 0.0 and is immediately complete.
//! 5. `is_complete()` is true iff every member is complete.
//!
//! # Failure Modes
//!
//! - Empty group: `overall_progress()` returns 0.0, `is_complete()` returns true.
//! - Unknown label in `get()` / `get_mut()`: returns `None`.

use std::time::Duration;

use super::Animation;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A named animation member in the group.
struct GroupMember {
    label: String,
    animation: Box<dyn Animation>,
}

impl std::fmt::Debug for GroupMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupMember")
            .field("label", &self.label)
            .field("value", &self.animation.value())
            .field("complete", &self.animation.is_complete())
            .finish()
    }
}

/// A collection of named animations with shared lifecycle control.
///
/// Implements [`Animation`] — `value()` returns the average progress of all
/// members, and `is_complete()` is true when every member has finished.
pub struct AnimationGroup {
    members: Vec<GroupMember>,
}

impl std::fmt::Debug for AnimationGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationGroup")
            .field("count", &self.members.len())
            .field("progress", &self.overall_progress())
            .field("complete", &self.all_complete())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl AnimationGroup {
    /// Create an empty animation group.
    #[must_use]
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Add a named animation to the group (builder pattern).
    ///
    /// If `label` already exists, the previous animation is replaced.
    #[must_use]
    pub fn add(mut self, label: &str, animation: impl Animation + 'static) -> Self {
        self.insert(label, Box::new(animation));
        self
    }

    /// Insert a named animation (mutating).
    ///
    /// If `label` already exists, the previous animation is replaced.
    pub fn insert(&mut self, label: &str, animation: Box<dyn Animation>) {
        if let Some(existing) = self.members.iter_mut().find(|m| m.label == label) {
            existing.animation = animation;
        } else {
            self.members.push(GroupMember {
                label: label.to_string(),
                animation,
            });
        }
    }

    /// Remove a named animation. Returns `true` if found and removed.
    pub fn remove(&mut self, label: &str) -> bool {
        let len_before = self.members.len();
        self.members.retain(|m| m.label != label);
        self.members.len() < len_before
    }
}

impl Default for AnimationGroup {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Lifecycle control
// ---------------------------------------------------------------------------

impl AnimationGroup {
    /// Reset all animations to their initial state.
    pub fn start_all(&mut self) {
        for member in &mut self.members {
            member.animation.reset();
        }
    }

    /// Reset all animations (alias for consistency with "cancel" semantics).
    pub fn cancel_all(&mut self) {
        self.start_all();
    }

    /// Number of animations in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether every animation in the group has completed.
    #[must_use]
    pub fn all_complete(&self) -> bool {
        self.members.is_empty() || self.members.iter().all(|m| m.animation.is_complete())
    }

    /// Average progress across all animations (0.0–1.0).
    ///
    /// Returns 0.0 for an empty group.
    #[must_use]
    pub fn overall_progress(&self) -> f32 {
        if self.members.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.members.iter().map(|m| m.animation.value()).sum();
        sum / self.members.len() as f32
    }

    /// Get a reference to a named animation's value.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&dyn Animation> {
        self.members
            .iter()
            .find(|m| m.label == label)
            .map(|m| &*m.animation)
    }

    /// Get a mutable reference to a named animation.
    pub fn get_mut(&mut self, label: &str) -> Option<&mut Box<dyn Animation>> {
        for member in &mut self.members {
            if member.label == label {
                return Some(&mut member.animation);
            }
        }
        None
    }

    /// Get a reference to an animation by index.
    #[must_use]
    pub fn get_at(&self, index: usize) -> Option<&dyn Animation> {
        self.members.get(index).map(|m| &*m.animation)
    }

    /// Iterator over (label, animation) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Animation)> {
        self.members
            .iter()
            .map(|m| (m.label.as_str(), &*m.animation))
    }

    /// Labels of all animations in the group.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.label.as_str())
    }
}

// ---------------------------------------------------------------------------
// Animation trait implementation
// ---------------------------------------------------------------------------

impl Animation for AnimationGroup {
    fn tick(&mut self, dt: Duration) {
        for member in &mut self.members {
            if !member.animation.is_complete() {
                member.animation.tick(dt);
            }
        }
    }

    fn is_complete(&self) -> bool {
        self.all_complete()
    }

    fn value(&self) -> f32 {
        self.overall_progress()
    }

    fn reset(&mut self) {
        for member in &mut self.members {
            member.animation.reset();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
