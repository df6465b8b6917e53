use super::frame::Frame;
use crate::sim::{wrap_arc, Basis, Float3, Quaternion};

/// Interpolated pose returned by [`FrameCursor::sample`].
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CursorPose {
    pub position: Float3,
    pub basis: Basis,
    pub orientation: Quaternion,
}

impl Default for CursorPose {
    fn default() -> Self {
        Self {
            position: Float3::ZERO,
            basis: Basis::DEFAULT,
            orientation: Quaternion::IDENTITY,
        }
    }
}

/// Arc-length lookup over a borrowed frame sequence.
///
/// Remembers the last bracketing index and walks from it, so queries with
/// slowly increasing `s` cost O(1) amortized. The borrow ties the cursor to
/// one build of the frames: after a rebuild, make a new cursor (seeding it
/// with the old [`FrameCursor::index`] is fine).
#[derive(Debug, Clone)]
pub struct FrameCursor<'a> {
    frames: &'a [Frame],
    closed: bool,
    length: f32,
    index: usize,
}

impl<'a> FrameCursor<'a> {
    pub fn new(frames: &'a [Frame], closed: bool) -> Self {
        Self::with_hint(frames, closed, 0)
    }

    pub fn with_hint(frames: &'a [Frame], closed: bool, index: usize) -> Self {
        Self {
            frames,
            closed,
            length: frames.last().map_or(0.0, |frame| frame.arc),
            index: index.min(frames.len().saturating_sub(1)),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    /// Rebinds to a new frame sequence and forgets the cached index.
    pub fn reset(&mut self, frames: &'a [Frame], closed: bool) {
        *self = Self::new(frames, closed);
    }

    pub fn sample(&mut self, s: f32) -> CursorPose {
        let Some(last) = self.frames.len().checked_sub(1) else {
            return CursorPose::default();
        };
        let frames = self.frames;
        let s = wrap_arc(s, self.length, self.closed);

        let mut i = self.index.min(last);
        if self.closed && s < frames[i].arc && frames[i].arc - s > 0.5 * self.length {
            // lapped the seam
            i = 0;
        }
        while i < last && s > frames[i + 1].arc {
            i += 1;
        }
        while i > 0 && s < frames[i].arc {
            i -= 1;
        }
        self.index = i;

        let a = &frames[i];
        let b = frames.get(i + 1).unwrap_or(a);
        let t = ((s - a.arc) / (b.arc - a.arc).max(1e-6)).clamp(0.0, 1.0);

        let qa = a.orientation;
        let mut qb = b.orientation;
        if qa.dot(qb) < 0.0 {
            qb = -qb;
        }
        let orientation = qa.slerp(qb, t);

        CursorPose {
            position: a.position.lerp(b.position, t),
            basis: Basis::from_orientation(orientation),
            orientation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::frame::interpolate_at_arc;
    use approx::assert_relative_eq;

    const TOLERANCE: f32 = 1e-4;

    fn arc_frames(count: usize, closed_loop: bool) -> Vec<Frame> {
        // quarter circle (or full circle) in the XZ plane, radius 10
        let sweep = if closed_loop {
            std::f32::consts::TAU
        } else {
            std::f32::consts::FRAC_PI_2
        };
        (0..count)
            .map(|i| {
                let a = sweep * i as f32 / (count - 1) as f32;
                let position = Float3::new(10.0 * a.sin(), 0.0, -10.0 * a.cos());
                let tangent = Float3::new(a.cos(), 0.0, a.sin());
                let basis = Basis::from_tangent_and_up(tangent, Float3::UP);
                Frame::new(position, basis, 10.0 * a)
            })
            .collect()
    }

    #[test]
    fn empty_frames_give_default_pose() {
        let mut cursor = FrameCursor::new(&[], false);
        assert_eq!(cursor.sample(3.0), CursorPose::default());
    }

    #[test]
    fn sample_hits_frames_exactly() {
        let frames = arc_frames(9, false);
        let mut cursor = FrameCursor::new(&frames, false);
        for frame in &frames {
            let pose = cursor.sample(frame.arc);
            assert_relative_eq!(pose.position.distance(frame.position), 0.0, epsilon = TOLERANCE);
            assert_relative_eq!(pose.basis.normal.y, frame.normal.y, epsilon = TOLERANCE);
            assert_relative_eq!(pose.basis.tangent.x, frame.tangent.x, epsilon = TOLERANCE);
        }
    }

    #[test]
    fn index_advances_monotonically() {
        let frames = arc_frames(33, false);
        let length = frames[frames.len() - 1].arc;
        let mut cursor = FrameCursor::new(&frames, false);
        let mut prev = cursor.index();
        for i in 0..=100 {
            let s = length * i as f32 / 100.0;
            let pose = cursor.sample(s);
            assert!(cursor.index() >= prev);
            prev = cursor.index();

            let reference = interpolate_at_arc(&frames, s).unwrap();
            assert_relative_eq!(pose.position.distance(reference.position), 0.0, epsilon = 1e-3);
            assert_relative_eq!(pose.basis.tangent.dot(reference.tangent), 1.0, epsilon = 1e-3);
            assert!(pose.basis.is_orthonormal(TOLERANCE));
        }
    }

    #[test]
    fn closed_cursor_wraps() {
        let frames = arc_frames(17, true);
        let length = frames[frames.len() - 1].arc;
        let mut cursor = FrameCursor::new(&frames, true);

        let near_end = cursor.sample(length - 0.5);
        let lapped = cursor.sample(length + 1.0);
        let direct = FrameCursor::new(&frames, true).sample(1.0);

        assert!(near_end.position.is_finite());
        assert_relative_eq!(lapped.position.distance(direct.position), 0.0, epsilon = TOLERANCE);
        assert!(cursor.index() <= 1);
    }

    #[test]
    fn slerp_takes_short_path_for_negated_quaternion() {
        let basis = Basis::from_tangent_and_up(Float3::new(1.0, 0.2, 0.3), Float3::UP);
        let a = Frame::new(Float3::ZERO, basis, 0.0);
        let mut b = Frame::new(Float3::new(1.0, 0.0, 0.0), basis, 1.0);
        b.orientation = -b.orientation;

        let pose = FrameCursor::new(&[a, b], false).sample(0.5);
        assert_relative_eq!(pose.basis.tangent.dot(basis.tangent), 1.0, epsilon = TOLERANCE);
        assert_relative_eq!(pose.basis.normal.dot(basis.normal), 1.0, epsilon = TOLERANCE);
    }

    #[test]
    fn hint_is_clamped_and_reset_clears_it() {
        let frames = arc_frames(5, false);
        let mut cursor = FrameCursor::with_hint(&frames, false, 99);
        assert_eq!(cursor.index(), 4);

        cursor.sample(0.0);
        assert_eq!(cursor.index(), 0);

        cursor.sample(frames[3].arc + 0.1);
        assert_eq!(cursor.index(), 3);
        cursor.reset(&frames, false);
        assert_eq!(cursor.index(), 0);
    }
}
