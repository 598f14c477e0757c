//! Scalar kinematics shared by vehicles and the ball.
//!
//! Everything here is a pure function over `f64`. Callers are expected to have
//! validated their configuration, so divisors such as the degradation time are
//! strictly positive by the time they get here.

/// Decay `value` towards zero as a portion of `max_value`.
///
/// `degradation_time_from_max` is the number of seconds it takes to go from
/// `max_value` to zero. The result keeps the sign of `value`, never overshoots
/// zero and is exactly zero once the remaining portion underflows.
pub fn apply_friction(
    value: f64,
    max_value: f64,
    degradation_time_from_max: f64,
    delta_time: f64,
) -> f64 {
    debug_assert!(max_value > 0.0, "max_value must be positive");
    debug_assert!(
        degradation_time_from_max > 0.0,
        "degradation_time_from_max must be positive"
    );

    let current_portion = value.abs() / max_value;
    let portion_to_degrade = delta_time / degradation_time_from_max;

    let target_portion = (current_portion - portion_to_degrade).clamp(0.0, 1.0);
    if target_portion == 0.0 {
        return 0.0;
    }

    max_value * target_portion * value.signum()
}

/// How far `value` lies along `[min, max]`, clamped to `[0, 1]`.
/// A zero-width range is a step: 1 at or above `max`, otherwise 0.
pub fn distance_across_range(min: f64, max: f64, value: f64) -> f64 {
    if max - min == 0.0 {
        return if value >= max { 1.0 } else { 0.0 };
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// Clamp to `[0, +inf)`.
pub fn clamp_positive(value: f64) -> f64 {
    value.max(0.0)
}

pub fn round_to_decimal(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Step `current` towards `target` by at most `max_delta`.
pub fn move_towards(current: f64, target: f64, max_delta: f64) -> f64 {
    let diff = target - current;
    if diff.abs() <= max_delta {
        target
    } else {
        current + diff.signum() * max_delta
    }
}

/// Shortest signed difference between two angles in degrees, in `(-180, 180]`.
pub fn delta_angle(current: f64, target: f64) -> f64 {
    let mut delta = (target - current).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

/// Like [`move_towards`] but for angles in degrees, taking the short way round.
pub fn move_towards_angle(current: f64, target: f64, max_delta: f64) -> f64 {
    let delta = delta_angle(current, target);
    if delta.abs() <= max_delta {
        return target;
    }
    current + delta.signum() * max_delta
}
