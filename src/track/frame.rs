use crate::sim::{Basis, Float3, Quaternion};

/// One precomputed track frame.
/// C-compatible layout for FFI.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    pub position: Float3,
    pub tangent: Float3,
    pub normal: Float3,
    pub binormal: Float3,
    pub arc: f32,
    /// Rotation whose columns are (tangent, normal, binormal).
    pub orientation: Quaternion,
}

impl Frame {
    pub fn new(position: Float3, basis: Basis, arc: f32) -> Self {
        Self {
            position,
            tangent: basis.tangent,
            normal: basis.normal,
            binormal: basis.binormal,
            arc,
            orientation: basis.orientation(),
        }
    }

    pub fn basis(&self) -> Basis {
        Basis::new(self.tangent, self.normal, self.binormal)
    }

    pub const DEFAULT: Self = Self {
        position: Float3::ZERO,
        tangent: Float3::RIGHT,
        normal: Float3::UP,
        binormal: Float3::FORWARD,
        arc: 0.0,
        orientation: Quaternion::IDENTITY,
    };
}

impl Default for Frame {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Interpolates a frame at the given arc.
///
/// Binary search for the bracketing pair, then position lerp and a
/// re-orthonormalized lerp of tangent and normal. Arcs outside the sequence
/// clamp to its ends. `None` for an empty slice.
pub fn interpolate_at_arc(frames: &[Frame], arc: f32) -> Option<Frame> {
    let first = frames.first()?;
    let last = frames.last()?;

    if arc <= first.arc {
        return Some(*first);
    }
    if arc >= last.arc {
        return Some(*last);
    }

    // frames[lo].arc <= arc < frames[lo + 1].arc
    let mut lo = 0usize;
    let mut hi = frames.len() - 1;
    while lo < hi - 1 {
        let mid = (lo + hi) / 2;
        if frames[mid].arc <= arc {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let a = &frames[lo];
    let b = &frames[lo + 1];
    let seg_len = b.arc - a.arc;
    let t = if seg_len > 0.0 {
        ((arc - a.arc) / seg_len).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let tangent = a.tangent.lerp(b.tangent, t).normalize_or(a.tangent);
    let normal = a.normal.lerp(b.normal, t);
    let basis = Basis::new(tangent, normal, Float3::ZERO).reorthonormalize_with_up(a.normal);
    Some(Frame::new(a.position.lerp(b.position, t), basis, arc))
}
