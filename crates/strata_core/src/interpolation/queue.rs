//! Generic value smoothing.
//!
//! A standalone primitive for animated quantities that live outside the
//! component model (camera zoom, UI bars, audio gains).
//!
//! ```text
//! push(target) ... push(target')     only the newest target is kept
//! update(dt):  current = blend(current, target, 1 - e^(-rate * dt))
//! ```

use std::collections::VecDeque;

/// Exponentially approaches the most recent pending target.
#[derive(Clone, Debug)]
pub struct InterpolationQueue<T> {
    current: T,
    pending: VecDeque<T>,
    rate: f32,
    blend: fn(&T, &T, f32) -> T,
}

impl<T: Clone> InterpolationQueue<T> {
    /// Creates a queue resting at `initial`.
    ///
    /// `rate` is the approach speed per second; higher converges faster.
    #[must_use]
    pub fn new(initial: T, rate: f32, blend: fn(&T, &T, f32) -> T) -> Self {
        Self {
            current: initial,
            pending: VecDeque::new(),
            rate: rate.max(0.0),
            blend,
        }
    }

    /// Queues a new target.
    pub fn push(&mut self, target: T) {
        self.pending.push_back(target);
    }

    /// Advances toward the newest target by `delta_secs`.
    pub fn update(&mut self, delta_secs: f32) {
        while self.pending.len() > 1 {
            self.pending.pop_front();
        }
        let Some(target) = self.pending.front() else {
            return;
        };
        let factor = 1.0 - (-self.rate * delta_secs.max(0.0)).exp();
        self.current = (self.blend)(&self.current, target, factor.clamp(0.0, 1.0));
    }

    /// Current smoothed value.
    #[must_use]
    pub fn current(&self) -> &T {
        &self.current
    }

    /// Target currently being approached, if any.
    #[must_use]
    pub fn target(&self) -> Option<&T> {
        self.pending.back()
    }

    /// Number of queued targets.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Jumps straight to the newest target and clears the queue.
    pub fn snap(&mut self) {
        if let Some(target) = self.pending.pop_back() {
            self.current = target;
        }
        self.pending.clear();
    }
}

impl InterpolationQueue<f32> {
    /// Scalar queue with a linear blend.
    #[must_use]
    pub fn scalar(initial: f32, rate: f32) -> Self {
        Self::new(initial, rate, |a, b, t| a + (b - a) * t)
    }
}
