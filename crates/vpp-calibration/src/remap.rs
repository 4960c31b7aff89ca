//! Linear range mapping into actuator bus units.

use serde::{Deserialize, Serialize};
use vpp_hal::PERCENT_MAX;

/// Map `value` from `[from_low, from_high]` onto `[to_low, to_high]`,
/// truncate toward zero and clamp into the target range, itself bounded by
/// `[0, PERCENT_MAX]`.
///
/// The input is not clamped first, so values outside the source range
/// extrapolate until the output clamp catches them.  A degenerate source
/// range saturates instead of panicking.
///
/// ```
/// use vpp_calibration::remap;
///
/// assert_eq!(remap(0.25, 0.0, 0.5, 0.0, 5000.0), 2500);
/// assert_eq!(remap(3.0, 0.0, 0.5, 0.0, 5000.0), 5000);
/// assert_eq!(remap(-1.0, 0.0, 0.5, 0.0, 5000.0), 0);
/// ```
pub fn remap(value: f32, from_low: f32, from_high: f32, to_low: f32, to_high: f32) -> i32 {
    let mapped = (value - from_low) / (from_high - from_low) * (to_high - to_low) + to_low;
    // `as` saturates on infinities and maps NaN to zero.
    let low = (to_low.min(to_high) as i32).clamp(0, PERCENT_MAX);
    let high = (to_low.max(to_high) as i32).clamp(low, PERCENT_MAX);
    (mapped as i32).clamp(low, high)
}

/// A configured pedal → bus range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PedalRemap {
    pub from_min: f32,
    pub from_max: f32,
    pub to_min: f32,
    pub to_max: f32,
}

impl PedalRemap {
    /// Throttle pedal fraction `[0, 0.5]` onto `[0, 5000]`.
    pub const THROTTLE: PedalRemap = PedalRemap {
        from_min: 0.0,
        from_max: 0.5,
        to_min: 0.0,
        to_max: 5000.0,
    };

    /// Brake pedal fraction `[0, 0.8]` onto `[0, 8000]`.
    pub const BRAKE: PedalRemap = PedalRemap {
        from_min: 0.0,
        from_max: 0.8,
        to_min: 0.0,
        to_max: 8000.0,
    };

    /// Emergency brake dial `[0, 100]` onto the full bus range.
    pub const DIAL: PedalRemap = PedalRemap {
        from_min: 0.0,
        from_max: 100.0,
        to_min: 0.0,
        to_max: PERCENT_MAX as f32,
    };

    pub fn apply(&self, value: f32) -> i32 {
        remap(value, self.from_min, self.from_max, self.to_min, self.to_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_toward_zero() {
        // 1.75 / 2 * 3 = 2.625
        assert_eq!(remap(1.75, 0.0, 2.0, 0.0, 3.0), 2);
        assert_eq!(remap(0.375, 0.0, 0.5, 0.0, 5000.0), 3750);
    }

    #[test]
    fn output_is_clamped_to_target_range() {
        assert_eq!(PedalRemap::THROTTLE.apply(0.75), 5000);
        assert_eq!(PedalRemap::BRAKE.apply(5.0), 8000);
        assert_eq!(PedalRemap::THROTTLE.apply(-0.2), 0);
        assert_eq!(remap(0.5, 0.0, 1.0, 2000.0, 4000.0), 3000);
        assert_eq!(remap(-1.0, 0.0, 1.0, 2000.0, 4000.0), 2000);
    }

    #[test]
    fn target_range_never_leaves_bus_range() {
        assert_eq!(remap(2.0, 0.0, 1.0, 0.0, 50_000.0), PERCENT_MAX);
        assert_eq!(remap(0.5, 0.0, 1.0, -100.0, -50.0), 0);
        // A reversed target range still bounds the output.
        assert_eq!(remap(2.0, 0.0, 1.0, 5000.0, 0.0), 0);
        assert_eq!(remap(-1.0, 0.0, 1.0, 5000.0, 0.0), 5000);
    }

    #[test]
    fn dial_covers_full_range() {
        assert_eq!(PedalRemap::DIAL.apply(100.0), PERCENT_MAX);
        assert_eq!(PedalRemap::DIAL.apply(40.0), 4000);
        assert_eq!(PedalRemap::DIAL.apply(0.0), 0);
    }

    #[test]
    fn degenerate_range_does_not_panic() {
        let out = remap(1.0, 0.5, 0.5, 0.0, 5000.0);
        assert!((0..=PERCENT_MAX).contains(&out));
        assert_eq!(remap(f32::NAN, 0.0, 1.0, 0.0, 100.0), 0);
    }
}
