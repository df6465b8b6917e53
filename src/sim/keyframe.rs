use std::f32::consts::PI;

use super::physics::{smoothstep, wrap_angle, wrap_arc};

/// Authored bank angle at an arc length.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RollKey {
    pub s: f32,
    pub roll: f32,
}

impl RollKey {
    pub const fn new(s: f32, roll: f32) -> Self {
        Self { s, roll }
    }
}

/// Easing curve used when spreading roll over a node range.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    Smoothstep,
    Cosine,
    Quintic,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Smoothstep => smoothstep(t),
            Easing::Cosine => 0.5 - 0.5 * (PI * t).cos(),
            Easing::Quintic => t * t * t * (t * (t * 6.0 - 15.0) + 10.0),
        }
    }
}

/// Sorts keys by arc length, merges keys closer than `merge_eps` (the later
/// key in input order wins) and unwraps consecutive angles so neighbours
/// never differ by more than pi.
pub fn prepare_roll_keys(mut keys: Vec<RollKey>, merge_eps: f32) -> Vec<RollKey> {
    keys.sort_by(|a, b| a.s.total_cmp(&b.s));

    let mut merged: Vec<RollKey> = Vec::with_capacity(keys.len());
    for key in keys {
        match merged.last_mut() {
            Some(last) if (key.s - last.s).abs() < merge_eps => last.roll = key.roll,
            _ => merged.push(key),
        }
    }

    for i in 1..merged.len() {
        let prev = merged[i - 1].roll;
        merged[i].roll = prev + wrap_angle(merged[i].roll - prev);
    }
    merged
}

/// Linearly interpolated roll at `s`.
///
/// Open paths hold the first/last key value outside the keyed range. Closed
/// paths wrap `s` into `[0, length)` and interpolate across the seam from the
/// last key to the first.
pub fn evaluate_roll(keys: &[RollKey], s: f32, length: f32, closed: bool) -> f32 {
    let (first, last) = match (keys.first(), keys.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return 0.0,
    };
    if keys.len() == 1 {
        return first.roll;
    }

    let closed = closed && length > 0.0;
    let s = if closed { wrap_arc(s, length, true) } else { s };
    if !closed {
        if s <= first.s {
            return first.roll;
        }
        if s >= last.s {
            return last.roll;
        }
    }

    let i = keys.partition_point(|key| key.s <= s);
    let seam = i == 0 || i >= keys.len();
    let (k1, k2) = if seam {
        (last, first)
    } else {
        (keys[i - 1], keys[i])
    };

    let mut span = k2.s - k1.s;
    let mut offset = s - k1.s;
    let mut target = k2.roll;
    if closed && seam {
        span += length;
        if offset < 0.0 {
            offset += length;
        }
        target = k1.roll + wrap_angle(k2.roll - k1.roll);
    }
    if span.abs() < 1e-6 {
        return k1.roll;
    }

    let t = (offset / span).clamp(0.0, 1.0);
    k1.roll + (target - k1.roll) * t
}
