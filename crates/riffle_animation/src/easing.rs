//! Easing curves for inset animations

/// Easing function type
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Easing {
    Linear,
    /// Decelerating curve used for inset reveals and restores
    #[default]
    EaseOutCubic,
}

impl Easing {
    /// Map linear progress to eased progress
    ///
    /// Progress outside `0.0..=1.0` is clamped, so an overshooting tick
    /// never overshoots the target value.
    pub fn apply(&self, t: f32) -> f32 {
        let t = if t.is_nan() { 1.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Linear => t,
            Easing::EaseOutCubic => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
        }
    }

    /// Interpolate between `from` and `to`
    pub fn lerp(&self, from: f32, to: f32, t: f32) -> f32 {
        from + (to - from) * self.apply(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURVES: [Easing; 2] = [Easing::Linear, Easing::EaseOutCubic];

    #[test]
    fn test_endpoints_are_exact() {
        for curve in CURVES {
            assert_eq!(curve.apply(0.0), 0.0, "{curve:?}");
            assert_eq!(curve.apply(1.0), 1.0, "{curve:?}");
        }
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(Easing::EaseOutCubic.apply(1.5), 1.0);
        assert_eq!(Easing::EaseOutCubic.apply(-0.5), 0.0);
        assert_eq!(Easing::Linear.apply(f32::NAN), 1.0);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(Easing::Linear.lerp(40.0, 0.0, 0.25), 30.0);
        assert!(Easing::EaseOutCubic.lerp(0.0, 100.0, 0.5) > 50.0);
    }
}
