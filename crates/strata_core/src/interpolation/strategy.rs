//! # Interpolation Strategies
//!
//! A strategy is a pure blend `(a, b, t) -> value` registered per value
//! kind. The mode of a property decides whether the strategy is consulted
//! at all:
//!
//! | Mode | Result |
//! |------|--------|
//! | `Linear` | `blend(a, b, t)` |
//! | `FromInstant` | `a` |
//! | `ToInstant` | `b` |

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strata_shared::{Color, Rect, Vec2};

use crate::codec::{PropertyValue, ValueKind};
use crate::error::ConfigError;

/// How a property moves between two bracketing samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    /// Blend the samples by the render fraction.
    #[default]
    Linear,
    /// Hold the earlier sample.
    FromInstant,
    /// Jump to the later sample.
    ToInstant,
}

/// Blend function signature.
pub type BlendFn = fn(&PropertyValue, &PropertyValue, f32) -> PropertyValue;

/// Name of the built-in numeric/vector blend.
pub const LINEAR: &str = "linear";

/// Name of the built-in "keep `a`" strategy.
pub const SNAP: &str = "snap";

/// A named blend function.
#[derive(Clone, Copy, Debug)]
pub struct InterpolationStrategy {
    name: &'static str,
    blend: BlendFn,
}

impl InterpolationStrategy {
    /// Creates a strategy.
    #[must_use]
    pub const fn new(name: &'static str, blend: BlendFn) -> Self {
        Self { name, blend }
    }

    /// Strategy name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Blends `a` toward `b`. `t` is clamped to `[0, 1]`.
    #[must_use]
    pub fn blend(&self, a: &PropertyValue, b: &PropertyValue, t: f32) -> PropertyValue {
        (self.blend)(a, b, t.clamp(0.0, 1.0))
    }

    /// Resolves the value between two samples for `mode`.
    #[must_use]
    pub fn sample(
        &self,
        mode: InterpolationMode,
        a: &PropertyValue,
        b: &PropertyValue,
        t: f32,
    ) -> PropertyValue {
        match mode {
            InterpolationMode::Linear => self.blend(a, b, t),
            InterpolationMode::FromInstant => a.clone(),
            InterpolationMode::ToInstant => b.clone(),
        }
    }
}

// ============================================================================
// BUILT-IN BLENDS
// ============================================================================

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn lerp_lanes<const N: usize>(a: [f32; N], b: [f32; N], t: f32) -> [f32; N] {
    let mut out = a;
    for (lane, target) in out.iter_mut().zip(b) {
        *lane = lerp(*lane, target, t);
    }
    out
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn lerp_int(a: i128, b: i128, t: f32) -> i128 {
    a + ((b - a) as f64 * f64::from(t)).trunc() as i128
}

macro_rules! lerp_int_variants {
    ($a:expr, $b:expr, $t:expr; $($variant:ident: $ty:ty),*) => {
        match ($a, $b) {
            $(
                (PropertyValue::$variant(a), PropertyValue::$variant(b)) => {
                    let v = lerp_int(i128::from(*a), i128::from(*b), $t);
                    return PropertyValue::$variant(<$ty>::try_from(v).unwrap_or(*a));
                }
            )*
            _ => {}
        }
    };
}

/// Linear blend: `a + (b - a) * t`, integer-truncating for integer kinds
/// and lane-wise for vectors, rectangles and colors.
///
/// Values of different kinds, or kinds without a linear form, keep `a`.
#[must_use]
pub fn linear_blend(a: &PropertyValue, b: &PropertyValue, t: f32) -> PropertyValue {
    lerp_int_variants!(a, b, t; I8: i8, I16: i16, I32: i32, I64: i64, U16: u16, U32: u32, U64: u64);

    match (a, b) {
        (PropertyValue::F32(a), PropertyValue::F32(b)) => PropertyValue::F32(lerp(*a, *b, t)),
        (PropertyValue::F64(a), PropertyValue::F64(b)) => {
            PropertyValue::F64(a + (b - a) * f64::from(t))
        }
        (PropertyValue::Vec2(a), PropertyValue::Vec2(b)) => {
            PropertyValue::Vec2(Vec2::from_array(lerp_lanes(a.to_array(), b.to_array(), t)))
        }
        (PropertyValue::Rect(a), PropertyValue::Rect(b)) => {
            PropertyValue::Rect(Rect::from_array(lerp_lanes(a.to_array(), b.to_array(), t)))
        }
        (PropertyValue::Color(a), PropertyValue::Color(b)) => {
            PropertyValue::Color(Color::from_array(lerp_lanes(a.to_array(), b.to_array(), t)))
        }
        _ => a.clone(),
    }
}

/// Identity blend: always `a`.
#[must_use]
pub fn snap_blend(a: &PropertyValue, _b: &PropertyValue, _t: f32) -> PropertyValue {
    a.clone()
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Maps value kinds (and names) to strategies.
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    by_kind: HashMap<ValueKind, InterpolationStrategy>,
    by_name: HashMap<&'static str, InterpolationStrategy>,
    array_default: Option<InterpolationStrategy>,
}

impl StrategyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with `linear` for numeric and vector kinds and
    /// `snap` for text, booleans, bytes and arrays.
    #[must_use]
    pub fn with_builtins() -> Self {
        let linear = InterpolationStrategy::new(LINEAR, linear_blend);
        let snap = InterpolationStrategy::new(SNAP, snap_blend);

        let mut registry = Self::new();
        for kind in [
            ValueKind::I8,
            ValueKind::I16,
            ValueKind::I32,
            ValueKind::I64,
            ValueKind::U16,
            ValueKind::U32,
            ValueKind::U64,
            ValueKind::F32,
            ValueKind::F64,
            ValueKind::Vec2,
            ValueKind::Rect,
            ValueKind::Color,
        ] {
            registry.register(kind, linear);
        }
        for kind in [ValueKind::Bool, ValueKind::Byte, ValueKind::Text] {
            registry.register(kind, snap);
        }
        registry.array_default = Some(snap);
        registry
    }

    /// Registers `strategy` as the default for `kind` (and under its name).
    pub fn register(&mut self, kind: ValueKind, strategy: InterpolationStrategy) {
        self.by_name.insert(strategy.name, strategy);
        self.by_kind.insert(kind, strategy);
    }

    /// Registers a named strategy usable by explicit property bindings.
    pub fn register_named(&mut self, strategy: InterpolationStrategy) {
        self.by_name.insert(strategy.name, strategy);
    }

    /// Default strategy for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingStrategy`] if nothing covers the kind.
    pub fn resolve(&self, kind: &ValueKind) -> Result<InterpolationStrategy, ConfigError> {
        if let Some(strategy) = self.by_kind.get(kind) {
            return Ok(*strategy);
        }
        match (kind, self.array_default) {
            (ValueKind::Array(_), Some(strategy)) => Ok(strategy),
            _ => Err(ConfigError::MissingStrategy(kind.clone())),
        }
    }

    /// Strategy registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownStrategy`] if no strategy has that name.
    pub fn resolve_named(&self, name: &str) -> Result<InterpolationStrategy, ConfigError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownStrategy(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear() -> InterpolationStrategy {
        StrategyRegistry::with_builtins()
            .resolve(&ValueKind::F32)
            .unwrap()
    }

    #[test]
    fn test_modes() {
        let s = linear();
        let (a, b) = (PropertyValue::F32(0.0), PropertyValue::F32(10.0));
        assert_eq!(s.sample(InterpolationMode::Linear, &a, &b, 0.5), PropertyValue::F32(5.0));
        assert_eq!(s.sample(InterpolationMode::FromInstant, &a, &b, 0.5), a);
        assert_eq!(s.sample(InterpolationMode::ToInstant, &a, &b, 0.5), b);
    }

    #[test]
    fn test_integer_truncation() {
        let v = linear_blend(&PropertyValue::I32(0), &PropertyValue::I32(10), 0.37);
        assert_eq!(v, PropertyValue::I32(3));

        let v = linear_blend(&PropertyValue::I32(10), &PropertyValue::I32(0), 0.37);
        assert_eq!(v, PropertyValue::I32(7));

        let v = linear_blend(&PropertyValue::U64(u64::MAX - 10), &PropertyValue::U64(u64::MAX), 1.0);
        assert_eq!(v, PropertyValue::U64(u64::MAX));
    }

    #[test]
    fn test_lane_wise_blends() {
        let v = linear_blend(
            &PropertyValue::Vec2(Vec2::new(0.0, 10.0)),
            &PropertyValue::Vec2(Vec2::new(4.0, 20.0)),
            0.25,
        );
        assert_eq!(v, PropertyValue::Vec2(Vec2::new(1.0, 12.5)));

        let v = linear_blend(
            &PropertyValue::Color(Color::TRANSPARENT),
            &PropertyValue::Color(Color::WHITE),
            0.5,
        );
        assert_eq!(v, PropertyValue::Color(Color::new(0.5, 0.5, 0.5, 0.5)));
    }

    #[test]
    fn test_fraction_is_clamped() {
        let s = linear();
        let v = s.blend(&PropertyValue::F32(0.0), &PropertyValue::F32(10.0), 3.0);
        assert_eq!(v, PropertyValue::F32(10.0));
    }

    #[test]
    fn test_non_blendable_kinds_snap() {
        let registry = StrategyRegistry::with_builtins();
        let s = registry.resolve(&ValueKind::Text).unwrap();
        assert_eq!(s.name(), SNAP);
        let v = s.blend(&"a".into(), &"b".into(), 0.9);
        assert_eq!(v, PropertyValue::Text("a".into()));

        let arrays = registry.resolve(&ValueKind::array_of(ValueKind::F32)).unwrap();
        assert_eq!(arrays.name(), SNAP);
    }

    #[test]
    fn test_missing_and_unknown() {
        let registry = StrategyRegistry::new();
        assert_eq!(
            registry.resolve(&ValueKind::F32).unwrap_err(),
            ConfigError::MissingStrategy(ValueKind::F32)
        );
        assert_eq!(
            StrategyRegistry::with_builtins().resolve_named("cubic").unwrap_err(),
            ConfigError::UnknownStrategy("cubic".into())
        );
    }
}
