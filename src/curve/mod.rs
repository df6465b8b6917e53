//! Curve layer: the editable Catmull-Rom spline and its arc-length sampler.

mod sampler;
mod spline;

pub use sampler::{CircularParams, EdgeMeta, EdgeType, HelixParams, PathSample, PathSampler};
pub use spline::{ArcSample, Node, SegmentLut, Spline, MIN_LUT_SAMPLES};
