//! Per-property sample queue.
//!
//! ```text
//! push:     (t0,v0) (t1,v1) (t2,v2)        timestamps strictly increasing
//! resolve:         ^ render_ts
//!           evict (t0,v0) once t1 < render_ts
//!           blend v_older -> v_newer by (render_ts - t_older) / (t_newer - t_older)
//!           a lone sample at or before render_ts is yielded once, as is
//! ```

use std::collections::VecDeque;

use super::strategy::{InterpolationMode, InterpolationStrategy};
use crate::codec::PropertyValue;

/// A timestamped property value.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// Authority timestamp in seconds.
    pub timestamp: f64,
    /// Decoded value.
    pub value: PropertyValue,
}

/// Time-ordered samples of one property.
#[derive(Clone, Debug, Default)]
pub struct SampleQueue {
    samples: VecDeque<Sample>,
    // The lone remaining sample was already yielded.
    settled: bool,
}

impl SampleQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a queue holding one sample.
    #[must_use]
    pub fn seeded(timestamp: f64, value: PropertyValue) -> Self {
        let mut samples = VecDeque::with_capacity(4);
        samples.push_back(Sample { timestamp, value });
        Self {
            samples,
            settled: false,
        }
    }

    /// Appends a sample.
    ///
    /// Returns false, leaving the queue untouched, if `timestamp` is not
    /// strictly newer than the newest queued sample.
    pub fn push(&mut self, timestamp: f64, value: PropertyValue) -> bool {
        if let Some(last) = self.samples.back() {
            if timestamp <= last.timestamp {
                return false;
            }
        }
        self.samples.push_back(Sample { timestamp, value });
        self.settled = false;
        true
    }

    /// Evicts samples that no longer bracket `render_ts`, then resolves the
    /// value at `render_ts`.
    ///
    /// A render time exactly on the newer sample resolves with fraction 1.
    /// Once render time reaches a lone remaining sample, that sample is
    /// yielded a single time so the property settles on the final state.
    /// Otherwise `None`: the property keeps its last value.
    pub fn resolve(
        &mut self,
        render_ts: f64,
        mode: InterpolationMode,
        strategy: &InterpolationStrategy,
    ) -> Option<PropertyValue> {
        while self.samples.len() >= 2 && self.samples[1].timestamp < render_ts {
            self.samples.pop_front();
        }

        let (older, newer) = match (self.samples.front(), self.samples.get(1)) {
            (Some(older), Some(newer)) => (older, newer),
            (Some(last), None) => {
                if self.settled || render_ts < last.timestamp {
                    return None;
                }
                let value = last.value.clone();
                self.settled = true;
                return Some(value);
            }
            _ => return None,
        };
        if render_ts < older.timestamp {
            return None;
        }

        let span = newer.timestamp - older.timestamp;
        #[allow(clippy::cast_possible_truncation)]
        let fraction = ((render_ts - older.timestamp) / span) as f32;
        Some(strategy.sample(mode, &older.value, &newer.value, fraction))
    }

    /// Number of queued samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if no samples are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Newest queued timestamp.
    #[must_use]
    pub fn latest_timestamp(&self) -> Option<f64> {
        self.samples.back().map(|s| s.timestamp)
    }

    /// Iterates samples oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ValueKind;
    use crate::interpolation::StrategyRegistry;

    fn queue() -> (SampleQueue, InterpolationStrategy) {
        let strategy = StrategyRegistry::with_builtins()
            .resolve(&ValueKind::F32)
            .unwrap();
        let mut q = SampleQueue::seeded(0.0, PropertyValue::F32(0.0));
        assert!(q.push(1.0, PropertyValue::F32(10.0)));
        (q, strategy)
    }

    #[test]
    fn test_midpoint_per_mode() {
        let (mut q, s) = queue();
        assert_eq!(
            q.resolve(0.5, InterpolationMode::Linear, &s),
            Some(PropertyValue::F32(5.0))
        );
        assert_eq!(
            q.resolve(0.5, InterpolationMode::FromInstant, &s),
            Some(PropertyValue::F32(0.0))
        );
        assert_eq!(
            q.resolve(0.5, InterpolationMode::ToInstant, &s),
            Some(PropertyValue::F32(10.0))
        );
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_render_exactly_on_newer_sample() {
        let (mut q, s) = queue();
        assert_eq!(
            q.resolve(1.0, InterpolationMode::Linear, &s),
            Some(PropertyValue::F32(10.0))
        );
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_eviction_past_newer_sample() {
        let (mut q, s) = queue();
        assert_eq!(
            q.resolve(0.5, InterpolationMode::Linear, &s),
            Some(PropertyValue::F32(5.0))
        );
        // Past the newest sample: settle on it once, then hold.
        assert_eq!(
            q.resolve(1.2, InterpolationMode::Linear, &s),
            Some(PropertyValue::F32(10.0))
        );
        assert_eq!(q.len(), 1);
        assert_eq!(q.iter().next().map(|x| x.timestamp), Some(1.0));
        assert_eq!(q.resolve(2.0, InterpolationMode::Linear, &s), None);

        assert!(q.push(2.0, PropertyValue::F32(20.0)));
        assert_eq!(
            q.resolve(1.5, InterpolationMode::Linear, &s),
            Some(PropertyValue::F32(15.0))
        );
    }

    #[test]
    fn test_lone_sample_waits_for_render_time() {
        let (_, s) = queue();
        let mut q = SampleQueue::seeded(3.0, PropertyValue::F32(7.0));
        assert_eq!(q.resolve(2.5, InterpolationMode::Linear, &s), None);
        assert_eq!(
            q.resolve(3.0, InterpolationMode::Linear, &s),
            Some(PropertyValue::F32(7.0))
        );
        assert_eq!(q.resolve(3.5, InterpolationMode::Linear, &s), None);
    }

    #[test]
    fn test_render_before_oldest_sample() {
        let (mut q, s) = queue();
        assert_eq!(q.resolve(-0.5, InterpolationMode::Linear, &s), None);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_stale_samples_rejected() {
        let (mut q, _) = queue();
        assert!(!q.push(1.0, PropertyValue::F32(99.0)));
        assert!(!q.push(0.5, PropertyValue::F32(99.0)));
        assert_eq!(q.len(), 2);
        assert_eq!(q.latest_timestamp(), Some(1.0));
    }
}
