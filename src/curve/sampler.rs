use super::spline::Spline;
use crate::sim::{wrap_arc, Float3};

const EPSILON: f32 = 1e-6;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CircularParams {
    pub center: Float3,
    pub normal: Float3,
    pub radius: f32,
    pub turns: f32,
    pub shortest: bool,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HelixParams {
    pub axis_point: Float3,
    pub axis_direction: Float3,
    pub radius: f32,
    pub pitch: f32,
    pub turns: f32,
}

/// Interpolation mode of one segment.
///
/// `Circular` and `Helix` record their parameters for editors; sampling
/// treats them as Catmull-Rom.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum EdgeType {
    #[default]
    CatmullRom,
    Linear,
    Circular(CircularParams),
    Helix(HelixParams),
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct EdgeMeta {
    pub edge_type: EdgeType,
}

impl EdgeMeta {
    pub const fn new(edge_type: EdgeType) -> Self {
        Self { edge_type }
    }

    pub fn is_linear(&self) -> bool {
        matches!(self.edge_type, EdgeType::Linear)
    }
}

/// Position and unit tangent at an arc length.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PathSample {
    pub position: Float3,
    pub tangent: Float3,
}

/// Arc-length sampler over a spline with per-segment overrides.
///
/// `edges[k]` applies to segment `k`; missing entries are Catmull-Rom.
#[derive(Debug, Clone, Copy)]
pub struct PathSampler<'a> {
    spline: &'a Spline,
    edges: &'a [EdgeMeta],
}

impl<'a> PathSampler<'a> {
    pub fn new(spline: &'a Spline, edges: &'a [EdgeMeta]) -> Self {
        Self { spline, edges }
    }

    pub fn spline(&self) -> &'a Spline {
        self.spline
    }

    pub fn total_length(&self) -> f32 {
        self.spline.total_length()
    }

    pub fn is_closed(&self) -> bool {
        self.spline.is_closed()
    }

    pub fn sample_at_s(&self, s: f32) -> PathSample {
        let Some((segment, s_local)) = self.spline.locate_segment_by_s(s) else {
            let position = self
                .spline
                .nodes()
                .first()
                .map_or(Float3::ZERO, |node| node.position);
            return PathSample {
                position,
                tangent: Float3::RIGHT,
            };
        };

        let linear = self.edges.get(segment).is_some_and(EdgeMeta::is_linear);
        if linear {
            if let Some(sample) = self.sample_linear(segment, s_local) {
                return sample;
            }
        }

        let position = self.spline.position_at_s(s);
        let mut tangent = self.spline.tangent_at_s(s);
        if !tangent.is_finite() || tangent.magnitude_squared() < EPSILON {
            tangent = self.probe_tangent(s);
        }
        PathSample { position, tangent }
    }

    /// Straight line between the segment's anchors, parametrized by the
    /// curve's own arc length on that segment.
    fn sample_linear(&self, segment: usize, s_local: f32) -> Option<PathSample> {
        let (a, b) = self.spline.segment_anchors(segment).ok()?;
        let start = self.spline.arc_length_at_segment_start(segment).ok()?;
        let end = self.spline.arc_length_at_segment_end(segment).ok()?;
        let length = end - start;
        let u = if length > EPSILON {
            (s_local / length).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Some(PathSample {
            position: a.lerp(b, u),
            tangent: (b - a).normalize_or(Float3::RIGHT),
        })
    }

    /// Central difference over a small arc-length window.
    fn probe_tangent(&self, s: f32) -> Float3 {
        let length = self.spline.total_length();
        let ds = 1e-3 * length.max(1.0);
        let closed = self.spline.is_closed();
        let p0 = self.spline.position_at_s(wrap_arc(s - ds, length, closed));
        let p1 = self.spline.position_at_s(wrap_arc(s + ds, length, closed));
        (p1 - p0).normalize_or(Float3::RIGHT)
    }
}
