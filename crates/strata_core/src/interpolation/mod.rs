//! # Interpolation
//!
//! Reconstructs continuous state from discrete, timestamped updates.
//!
//! - [`StrategyRegistry`]: blend functions per value kind
//! - [`SampleQueue`]: per-property bracketing buffer used by components
//! - [`InterpolationQueue`]: standalone exponential smoother

mod queue;
mod samples;
mod strategy;

pub use queue::InterpolationQueue;
pub use samples::{Sample, SampleQueue};
pub use strategy::{
    linear_blend, snap_blend, BlendFn, InterpolationMode, InterpolationStrategy,
    StrategyRegistry, LINEAR, SNAP,
};
