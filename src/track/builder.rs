//! Rotation-minimizing frame construction.
//!
//! Frames are parallel-transported along the sampled path: each step rotates
//! the previous normal by the minimal rotation that carries the previous
//! tangent onto the new one. Stations pull the transported normal toward
//! the up reference; authored roll is applied to the emitted frame only.

use super::config::MIN_STEP;
use super::frame::Frame;
use crate::curve::PathSampler;
use crate::sim::{Basis, Float3};

const FALLBACK_DS: f32 = 0.05;
const ROLL_EPSILON: f32 = 1e-6;

/// Station and roll queries consulted while building frames.
///
/// Every method has a neutral default, so `()` builds plain transported
/// frames.
pub trait FrameMeta {
    fn is_in_station(&self, _s: f32) -> bool {
        false
    }

    /// Blend weight in [0, 1] toward the up reference near a station.
    fn station_edge_fade_weight(&self, _s: f32) -> f32 {
        0.0
    }

    fn manual_roll_at_s(&self, _s: f32) -> f32 {
        0.0
    }
}

impl FrameMeta for () {}

/// Builds frames every `ds` along the sampler's path.
///
/// The result is empty for a path without length. Otherwise arcs strictly
/// increase from 0 to exactly `total_length()`. An open path drops the last
/// regular sample if it lies within `ds / 2` of the end. On a closed path
/// the final frame repeats the first one at arc `total_length()`.
pub fn build_frames<M: FrameMeta + ?Sized>(
    sampler: &PathSampler<'_>,
    ds: f32,
    up: Float3,
    meta: &M,
) -> Vec<Frame> {
    let ds = if ds.is_nan() || ds <= 0.0 {
        log::warn!("frame step {ds} is not positive, using {FALLBACK_DS}");
        FALLBACK_DS
    } else {
        ds.max(MIN_STEP)
    };

    let length = sampler.total_length();
    if length.is_nan() || length <= 0.0 {
        return Vec::new();
    }
    let closed = sampler.is_closed();
    let up = up.normalize_or(Float3::UP);

    let mut frames = Vec::with_capacity((length / ds) as usize + 2);

    let start = sampler.sample_at_s(0.0);
    let mut transported = Basis::from_tangent_and_up(start.tangent, up);
    frames.push(Frame::new(
        start.position,
        shaped(&mut transported, up, meta, 0.0),
        0.0,
    ));

    let limit = if closed { length } else { length - 0.5 * ds };
    for i in 1usize.. {
        let s = i as f32 * ds;
        if s >= limit {
            break;
        }
        let sample = sampler.sample_at_s(s);
        transported = transported.transported(sample.tangent, up);
        let basis = shaped(&mut transported, up, meta, s);
        frames.push(Frame::new(sample.position, basis, s));
    }

    if closed {
        let first = frames[0];
        frames.push(Frame {
            arc: length,
            ..first
        });
    } else {
        let end = sampler.sample_at_s(length);
        transported = transported.transported(end.tangent, up);
        let basis = shaped(&mut transported, up, meta, length);
        frames.push(Frame::new(end.position, basis, length));
    }

    log::trace!("built {} frames over {length:.3} m", frames.len());
    frames
}

/// Applies station forcing or fading to the transported basis in place and
/// returns the emitted basis with roll on top.
fn shaped<M: FrameMeta + ?Sized>(transported: &mut Basis, up: Float3, meta: &M, s: f32) -> Basis {
    if meta.is_in_station(s) {
        *transported = Basis::from_tangent_and_up(transported.tangent, up);
        return *transported;
    }

    let weight = meta.station_edge_fade_weight(s);
    if weight > 0.0 {
        let target = Basis::from_tangent_and_up(transported.tangent, up);
        *transported = transported.blend_normal(target, weight);
    }

    let roll = meta.manual_roll_at_s(s);
    if roll.abs() > ROLL_EPSILON {
        transported.with_roll(roll)
    } else {
        *transported
    }
}
