//! Inset tweens
//!
//! A tween moves one inset edge from a start value to a target over a
//! fixed duration. Tweens are advanced by
//! [`AnimationScheduler`](crate::AnimationScheduler); they never read the
//! clock themselves.

use std::fmt;
use std::time::Duration;

use riffle_core::{AnimationCompletion, Edge};

use crate::easing::Easing;

/// An in-flight animation of one inset edge
pub struct InsetTween {
    edge: Edge,
    from: f32,
    to: f32,
    duration_ms: f32,
    elapsed_ms: f32,
    easing: Easing,
    completion: Option<AnimationCompletion>,
}

impl InsetTween {
    pub fn new(edge: Edge, from: f32, to: f32, duration: Duration, easing: Easing) -> Self {
        Self {
            edge,
            from,
            to,
            duration_ms: duration.as_secs_f32() * 1000.0,
            elapsed_ms: 0.0,
            easing,
            completion: None,
        }
    }

    /// Attach a completion to run when the tween stops
    pub fn with_completion(mut self, completion: AnimationCompletion) -> Self {
        self.completion = Some(completion);
        self
    }

    pub fn edge(&self) -> Edge {
        self.edge
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    /// Linear progress (0.0 to 1.0)
    pub fn progress(&self) -> f32 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        (self.elapsed_ms / self.duration_ms).min(1.0)
    }

    /// Get the current interpolated value
    pub fn value(&self) -> f32 {
        if self.is_finished() {
            // Exact target, no float drift from the curve
            return self.to;
        }
        self.easing.lerp(self.from, self.to, self.progress())
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    /// Advance by delta time (in milliseconds) and return the new value
    pub fn tick(&mut self, dt_ms: f32) -> f32 {
        if dt_ms > 0.0 {
            self.elapsed_ms = (self.elapsed_ms + dt_ms).min(self.duration_ms.max(0.0));
        }
        self.value()
    }

    /// Take the completion, leaving none behind
    pub fn take_completion(&mut self) -> Option<AnimationCompletion> {
        self.completion.take()
    }
}

impl fmt::Debug for InsetTween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsetTween")
            .field("edge", &self.edge)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("duration_ms", &self.duration_ms)
            .field("elapsed_ms", &self.elapsed_ms)
            .field("easing", &self.easing)
            .field("has_completion", &self.completion.is_some())
            .finish()
    }
}
