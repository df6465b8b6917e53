use std::f32::consts::PI;

pub const G: f32 = 9.80665;
pub const HZ: f32 = 100.0;
pub const DT: f32 = 1.0 / HZ;
pub const EPSILON: f32 = 1e-6;

pub fn wrap_angle(rad: f32) -> f32 {
    if (-PI..=PI).contains(&rad) {
        return rad;
    }
    const TWO_PI: f32 = 2.0 * PI;
    (rad + PI).rem_euclid(TWO_PI) - PI
}

/// Hermite smoothstep of `t` clamped to [0, 1].
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Maps an arc length onto a path of length `length`.
///
/// Closed paths wrap into `[0, length)`, never negative; open paths clamp
/// into `[0, length]`. A non-positive length maps everything to 0.
pub fn wrap_arc(s: f32, length: f32, closed: bool) -> f32 {
    if length <= 0.0 || !s.is_finite() {
        return 0.0;
    }
    if !closed {
        return s.clamp(0.0, length);
    }
    let wrapped = s.rem_euclid(length);
    if wrapped >= length {
        0.0
    } else {
        wrapped
    }
}
