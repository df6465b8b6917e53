use crate::error::{Result, TrackError};
use crate::sim::{wrap_arc, Float3};

/// Centripetal knot exponent.
const ALPHA: f32 = 0.5;
const EPSILON: f32 = 1e-6;
const NEWTON_ITERATIONS: usize = 2;
pub const MIN_LUT_SAMPLES: usize = 2;

/// Editable control node.
///
/// `tension`, `continuity` and `bias` are carried for editors but do not
/// affect evaluation.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Node {
    pub position: Float3,
    pub roll: f32,
    pub tension: f32,
    pub continuity: f32,
    pub bias: f32,
}

impl Node {
    pub const fn new(position: Float3) -> Self {
        Self {
            position,
            roll: 0.0,
            tension: 0.0,
            continuity: 0.0,
            bias: 0.0,
        }
    }

    pub const fn with_roll(position: Float3, roll: f32) -> Self {
        Self {
            roll,
            ..Self::new(position)
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new(Float3::ZERO)
    }
}

/// One arc-length table entry: local parameter, arc length from the segment
/// start and the curve position there.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ArcSample {
    pub u: f32,
    pub s: f32,
    pub position: Float3,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SegmentLut {
    pub samples: Vec<ArcSample>,
    pub length: f32,
}

/// Cubic Hermite form of one centripetal Catmull-Rom segment.
struct Hermite {
    p1: Float3,
    p2: Float3,
    m1: Float3,
    m2: Float3,
    dt: f32,
}

impl Hermite {
    fn new([p0, p1, p2, p3]: [Float3; 4]) -> Self {
        let t1 = (p1 - p0).magnitude().powf(ALPHA);
        let t2 = t1 + (p2 - p1).magnitude().powf(ALPHA);
        let t3 = t2 + (p3 - p2).magnitude().powf(ALPHA);
        let dt = (t2 - t1).max(EPSILON);

        let m1 = ((p1 - p0) / t1.max(EPSILON) - (p2 - p0) / t2.max(EPSILON)
            + (p2 - p1) / (t2 - t1).max(EPSILON))
            * dt;
        let m2 = ((p2 - p1) / (t2 - t1).max(EPSILON) - (p3 - p1) / (t3 - t1).max(EPSILON)
            + (p3 - p2) / (t3 - t2).max(EPSILON))
            * dt;

        Self { p1, p2, m1, m2, dt }
    }

    fn position(&self, u: f32) -> Float3 {
        let u2 = u * u;
        let u3 = u2 * u;
        let h00 = 2.0 * u3 - 3.0 * u2 + 1.0;
        let h10 = u3 - 2.0 * u2 + u;
        let h01 = -2.0 * u3 + 3.0 * u2;
        let h11 = u3 - u2;
        self.p1 * h00 + self.m1 * h10 + self.p2 * h01 + self.m2 * h11
    }

    /// dC/du on the unit parameter.
    fn velocity(&self, u: f32) -> Float3 {
        let u2 = u * u;
        let dh00 = 6.0 * u2 - 6.0 * u;
        let dh10 = 3.0 * u2 - 4.0 * u + 1.0;
        let dh01 = -6.0 * u2 + 6.0 * u;
        let dh11 = 3.0 * u2 - 2.0 * u;
        self.p1 * dh00 + self.m1 * dh10 + self.p2 * dh01 + self.m2 * dh11
    }

    /// dC/dt on the knot parameter.
    fn derivative(&self, u: f32) -> Float3 {
        self.velocity(u) / self.dt
    }
}

/// Centripetal Catmull-Rom spline over an editable node list, with an
/// arc-length lookup table.
///
/// Segment `k` of an open spline runs from node `k + 1` to node `k + 2`;
/// the first and last nodes only shape the curve. A closed spline has one
/// segment per node, segment `k` running from node `k` to node `k + 1`.
///
/// Any node edit drops the lookup table; arc-length queries return defaults
/// until [`Spline::rebuild_arc_length_lut`] runs again.
#[derive(Debug, Clone, Default)]
pub struct Spline {
    nodes: Vec<Node>,
    closed: bool,
    lut: Vec<SegmentLut>,
    seg_prefix: Vec<f32>,
    total_length: f32,
}

impl Spline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_positions(positions: &[Float3], closed: bool) -> Self {
        Self {
            nodes: positions.iter().copied().map(Node::new).collect(),
            closed,
            ..Self::default()
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, index: usize) -> Result<&Node> {
        self.nodes.get(index).ok_or(TrackError::NodeOutOfRange {
            index,
            len: self.nodes.len(),
        })
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
        self.invalidate_lut();
    }

    /// Inserts before `index`; `index == node_count()` appends.
    pub fn insert_node(&mut self, index: usize, node: Node) -> Result<()> {
        if index > self.nodes.len() {
            return Err(TrackError::NodeOutOfRange {
                index,
                len: self.nodes.len(),
            });
        }
        self.nodes.insert(index, node);
        self.invalidate_lut();
        Ok(())
    }

    pub fn move_node(&mut self, index: usize, position: Float3) -> Result<()> {
        self.node_mut(index)?.position = position;
        self.invalidate_lut();
        Ok(())
    }

    pub fn remove_node(&mut self, index: usize) -> Result<Node> {
        self.node(index)?;
        let node = self.nodes.remove(index);
        self.invalidate_lut();
        Ok(node)
    }

    /// Roll does not change the curve, so the lookup table survives.
    pub fn set_node_roll(&mut self, index: usize, roll: f32) -> Result<()> {
        self.node_mut(index)?.roll = roll;
        Ok(())
    }

    fn node_mut(&mut self, index: usize) -> Result<&mut Node> {
        let len = self.nodes.len();
        self.nodes
            .get_mut(index)
            .ok_or(TrackError::NodeOutOfRange { index, len })
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn set_closed(&mut self, closed: bool) {
        if self.closed != closed {
            self.closed = closed;
            self.invalidate_lut();
        }
    }

    pub fn segment_count(&self) -> usize {
        let n = self.nodes.len();
        match (self.closed, n >= 4) {
            (_, false) => 0,
            (true, true) => n,
            (false, true) => n - 3,
        }
    }

    fn check_segment(&self, segment: usize) -> Result<()> {
        let count = self.segment_count();
        if segment >= count {
            return Err(TrackError::SegmentOutOfRange {
                index: segment,
                count,
            });
        }
        Ok(())
    }

    /// P0..P3 for `segment`; open ends fall back to mirrored virtual points.
    fn control_points(&self, segment: usize) -> [Float3; 4] {
        let n = self.nodes.len();
        let at = |i: usize| self.nodes[i].position;
        if self.closed {
            return [
                at((segment + n - 1) % n),
                at(segment % n),
                at((segment + 1) % n),
                at((segment + 2) % n),
            ];
        }
        let p1 = at(segment + 1);
        let p2 = at(segment + 2);
        let p0 = self
            .nodes
            .get(segment)
            .map_or(p1 * 2.0 - p2, |node| node.position);
        let p3 = self
            .nodes
            .get(segment + 3)
            .map_or(p2 * 2.0 - p1, |node| node.position);
        [p0, p1, p2, p3]
    }

    fn hermite(&self, segment: usize) -> Hermite {
        Hermite::new(self.control_points(segment))
    }

    /// Curve position on `segment` at local parameter `t` (clamped to [0, 1]).
    pub fn position(&self, segment: usize, t: f32) -> Result<Float3> {
        self.check_segment(segment)?;
        Ok(self.hermite(segment).position(t.clamp(0.0, 1.0)))
    }

    /// Analytic derivative with respect to the centripetal knot parameter.
    pub fn derivative(&self, segment: usize, t: f32) -> Result<Float3> {
        self.check_segment(segment)?;
        Ok(self.hermite(segment).derivative(t.clamp(0.0, 1.0)))
    }

    /// Unit tangent on `segment` at `t`.
    ///
    /// A vanishing derivative falls back to the chord P2-P1, then the wide
    /// chord P3-P0, then +X.
    pub fn tangent(&self, segment: usize, t: f32) -> Result<Float3> {
        self.check_segment(segment)?;
        Ok(self.tangent_unchecked(segment, t.clamp(0.0, 1.0)))
    }

    fn tangent_unchecked(&self, segment: usize, t: f32) -> Float3 {
        let derivative = self.hermite(segment).derivative(t);
        let len = derivative.magnitude();
        if len >= EPSILON && len.is_finite() {
            return derivative / len;
        }
        let [p0, p1, p2, p3] = self.control_points(segment);
        let chord = p2 - p1;
        if chord.magnitude() >= EPSILON {
            return chord.normalize();
        }
        (p3 - p0).normalize_or(Float3::RIGHT)
    }

    /// Rebuilds the chord-length lookup table with `samples_per_segment` steps
    /// (at least 2) per segment.
    pub fn rebuild_arc_length_lut(&mut self, samples_per_segment: usize) {
        let count = self.segment_count();
        self.invalidate_lut();
        if count == 0 {
            return;
        }

        let samples = samples_per_segment.max(MIN_LUT_SAMPLES);
        self.lut.reserve(count);
        for segment in 0..count {
            let hermite = self.hermite(segment);
            let mut prev = hermite.position(0.0);
            let mut s = 0.0;
            let mut entries = Vec::with_capacity(samples + 1);
            entries.push(ArcSample {
                u: 0.0,
                s: 0.0,
                position: prev,
            });
            for i in 1..=samples {
                let u = i as f32 / samples as f32;
                let position = hermite.position(u);
                let ds = (position - prev).magnitude();
                if ds >= EPSILON {
                    s += ds;
                }
                entries.push(ArcSample { u, s, position });
                prev = position;
            }
            self.lut.push(SegmentLut {
                samples: entries,
                length: s,
            });
        }

        let mut acc = 0.0;
        self.seg_prefix = self
            .lut
            .iter()
            .map(|segment| {
                let start = acc;
                acc += segment.length;
                start
            })
            .collect();
        self.total_length = acc;
    }

    fn invalidate_lut(&mut self) {
        self.lut.clear();
        self.seg_prefix.clear();
        self.total_length = 0.0;
    }

    pub fn has_valid_lut(&self) -> bool {
        let count = self.segment_count();
        count > 0 && self.lut.len() == count
    }

    pub fn lut(&self) -> &[SegmentLut] {
        &self.lut
    }

    /// Arc length at the start of each segment.
    pub fn segment_prefix(&self) -> &[f32] {
        &self.seg_prefix
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    pub fn arc_length_at_segment_start(&self, segment: usize) -> Result<f32> {
        self.seg_prefix
            .get(segment)
            .copied()
            .ok_or(TrackError::SegmentOutOfRange {
                index: segment,
                count: self.seg_prefix.len(),
            })
    }

    pub fn arc_length_at_segment_end(&self, segment: usize) -> Result<f32> {
        let start = self.arc_length_at_segment_start(segment)?;
        Ok(start + self.lut[segment].length)
    }

    /// Segment index and local arc length for a global arc length.
    ///
    /// Closed splines wrap `s` into `[0, L)`, open ones clamp into `[0, L]`.
    /// `s == 0` is segment 0 at offset 0; `s == L` on an open spline is the
    /// last segment at its full length. `None` without a lookup table.
    pub fn locate_segment_by_s(&self, s: f32) -> Option<(usize, f32)> {
        if !self.has_valid_lut() {
            return None;
        }
        let length = self.total_length;
        if length <= 0.0 {
            return Some((0, 0.0));
        }
        let s = wrap_arc(s, length, self.closed);
        if s <= 0.0 {
            return Some((0, 0.0));
        }
        let k = self
            .seg_prefix
            .partition_point(|&start| start <= s)
            .saturating_sub(1);
        Some((k, s - self.seg_prefix[k]))
    }

    /// Segment and refined local parameter for a global arc length.
    fn locate_u(&self, s: f32) -> Option<(usize, f32)> {
        let (k, s_local) = self.locate_segment_by_s(s)?;
        let lut = &self.lut[k];
        if s_local <= 0.0 {
            return Some((k, 0.0));
        }
        if s_local >= lut.length {
            return Some((k, 1.0));
        }

        let samples = &lut.samples;
        let i1 = samples
            .partition_point(|sample| sample.s < s_local)
            .clamp(1, samples.len() - 1);
        let (a, b) = (samples[i1 - 1], samples[i1]);
        let alpha = ((s_local - a.s) / (b.s - a.s).max(EPSILON)).clamp(0.0, 1.0);
        let u = a.u + alpha * (b.u - a.u);

        Some((k, self.refine_u_by_newton(k, u, s_local)))
    }

    /// Newton steps on `s(u) - s_local`, where `s(u)` is the table arc length
    /// up to the preceding sample plus the chord from it.
    fn refine_u_by_newton(&self, segment: usize, u0: f32, s_local: f32) -> f32 {
        let hermite = self.hermite(segment);
        let samples = &self.lut[segment].samples;
        let mut u = u0;
        for _ in 0..NEWTON_ITERATIONS {
            let speed = hermite.velocity(u).magnitude();
            if speed < EPSILON || !speed.is_finite() {
                break;
            }
            let position = hermite.position(u);
            let i1 = samples.partition_point(|sample| sample.u < u);
            let s_approx = match i1.checked_sub(1).map(|i| samples[i]) {
                Some(prev) => prev.s + (position - prev.position).magnitude(),
                None => (position - samples[0].position).magnitude(),
            };
            u = (u - (s_approx - s_local) / speed).clamp(0.0, 1.0);
        }
        u
    }

    /// Curve position at arc length `s`; the first node (or the origin) when
    /// there is no lookup table.
    pub fn position_at_s(&self, s: f32) -> Float3 {
        match self.locate_u(s) {
            Some((k, u)) => self.hermite(k).position(u),
            None => self.nodes.first().map_or(Float3::ZERO, |n| n.position),
        }
    }

    /// Unit tangent at arc length `s`; +X when there is no lookup table.
    pub fn tangent_at_s(&self, s: f32) -> Float3 {
        match self.locate_u(s) {
            Some((k, u)) => self.tangent_unchecked(k, u),
            None => Float3::RIGHT,
        }
    }

    /// Whether node `index` is an anchor of some segment.
    pub fn is_node_on_curve(&self, index: usize) -> bool {
        let n = self.nodes.len();
        if n < 4 || index >= n {
            return false;
        }
        self.closed || (index > 0 && index + 1 < n)
    }

    fn check_on_curve(&self, index: usize) -> Result<()> {
        self.node(index)?;
        if !self.is_node_on_curve(index) {
            return Err(TrackError::NodeOffCurve { index });
        }
        Ok(())
    }

    pub fn segment_index_starting_at_node(&self, index: usize) -> Result<usize> {
        self.check_on_curve(index)?;
        let segment = if self.closed { index } else { index - 1 };
        self.check_segment(segment)?;
        Ok(segment)
    }

    pub fn segment_index_ending_at_node(&self, index: usize) -> Result<usize> {
        self.check_on_curve(index)?;
        let n = self.nodes.len();
        if self.closed {
            return Ok((index + n - 1) % n);
        }
        match index.checked_sub(2) {
            Some(segment) => Ok(segment),
            None => Err(TrackError::SegmentOutOfRange {
                index: 0,
                count: self.segment_count(),
            }),
        }
    }

    /// Arc length of an on-curve node.
    pub fn s_at_node(&self, index: usize) -> Result<f32> {
        self.check_on_curve(index)?;
        if self.closed {
            return self.arc_length_at_segment_start(index);
        }
        if index == 1 {
            return Ok(0.0);
        }
        self.arc_length_at_segment_end(index - 2)
    }

    /// The two nodes a segment runs between.
    pub fn segment_anchors(&self, segment: usize) -> Result<(Float3, Float3)> {
        self.check_segment(segment)?;
        let [_, p1, p2, _] = self.control_points(segment);
        Ok((p1, p2))
    }
}
