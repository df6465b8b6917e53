use super::builder::{build_frames, FrameMeta};
use super::config::TrackConfig;
use super::cursor::FrameCursor;
use super::frame::{interpolate_at_arc, Frame};
use super::meta::{
    is_in_station, merge_intervals, push_interval, station_fade_weight, NodeMeta,
    StationInterval,
};
use crate::curve::{EdgeMeta, EdgeType, Node, PathSampler, Spline};
use crate::error::{Result, TrackError};
use crate::sim::{evaluate_roll, prepare_roll_keys, wrap_arc, Basis, Float3, RollKey};

/// How much of the pipeline a [`TrackComponent::rebuild`] has to redo.
///
/// Ordered: each state implies every stage below it. Marking never lowers
/// the state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum RebuildState {
    Clean,
    /// Frames only (step, up vector, edge overrides).
    FramesDirty,
    /// Stations and roll keys, then frames.
    MetaDirty,
    /// Arc-length table, metadata sizes, stations and roll keys, frames.
    #[default]
    SplineDirty,
}

/// Owns an editable track and its derived data.
///
/// Edits only mark the pipeline dirty; [`TrackComponent::rebuild`] brings
/// the arc-length table, station intervals, roll keys and frames up to date.
/// Queries made in between see the previous build, or defaults where the
/// spline's table has been dropped.
#[derive(Debug, Clone, Default)]
pub struct TrackComponent {
    spline: Spline,
    edge_meta: Vec<EdgeMeta>,
    node_meta: Vec<NodeMeta>,
    stations: Vec<StationInterval>,
    roll_keys: Vec<RollKey>,
    frames: Vec<Frame>,
    config: TrackConfig,
    state: RebuildState,
}

impl TrackComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TrackConfig) -> Self {
        Self {
            config: config.sanitized(),
            ..Self::default()
        }
    }

    pub fn from_spline(spline: Spline, config: TrackConfig) -> Self {
        let mut track = Self::with_config(config);
        track.node_meta = vec![NodeMeta::default(); spline.node_count()];
        track.spline = spline;
        track
    }

    pub fn spline(&self) -> &Spline {
        &self.spline
    }

    /// Direct spline access; assumes the curve changes.
    ///
    /// Node metadata is resized to the node count on the next rebuild but
    /// does not follow nodes inserted or removed this way.
    pub fn spline_mut(&mut self) -> &mut Spline {
        self.mark(RebuildState::SplineDirty);
        &mut self.spline
    }

    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: TrackConfig) {
        self.config = config.sanitized();
        self.mark(RebuildState::SplineDirty);
    }

    pub fn set_ds(&mut self, ds: f32) {
        self.config = TrackConfig { ds, ..self.config }.sanitized();
        self.mark(RebuildState::FramesDirty);
    }

    pub fn set_up(&mut self, up: Float3) {
        self.config = TrackConfig { up, ..self.config }.sanitized();
        self.mark(RebuildState::FramesDirty);
    }

    pub fn state(&self) -> RebuildState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state != RebuildState::Clean
    }

    pub fn mark_dirty(&mut self) {
        self.mark(RebuildState::SplineDirty);
    }

    fn mark(&mut self, state: RebuildState) {
        self.state = self.state.max(state);
    }

    pub fn nodes(&self) -> &[Node] {
        self.spline.nodes()
    }

    pub fn node_meta(&self) -> &[NodeMeta] {
        &self.node_meta
    }

    pub fn edge_meta(&self) -> &[EdgeMeta] {
        &self.edge_meta
    }

    pub fn stations(&self) -> &[StationInterval] {
        &self.stations
    }

    pub fn roll_keys(&self) -> &[RollKey] {
        &self.roll_keys
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_closed(&self) -> bool {
        self.spline.is_closed()
    }

    // ---- node edits ----

    pub fn add_node(&mut self, node: Node) -> usize {
        self.sync_meta();
        self.spline.add_node(node);
        self.node_meta.push(NodeMeta::default());
        self.mark(RebuildState::SplineDirty);
        self.spline.node_count() - 1
    }

    pub fn insert_node(&mut self, index: usize, node: Node) -> Result<()> {
        self.sync_meta();
        self.spline.insert_node(index, node)?;
        self.node_meta.insert(index, NodeMeta::default());
        self.mark(RebuildState::SplineDirty);
        Ok(())
    }

    pub fn move_node(&mut self, index: usize, position: Float3) -> Result<()> {
        self.spline.move_node(index, position)?;
        self.mark(RebuildState::SplineDirty);
        Ok(())
    }

    pub fn remove_node(&mut self, index: usize) -> Result<Node> {
        self.sync_meta();
        let node = self.spline.remove_node(index)?;
        self.node_meta.remove(index);
        self.mark(RebuildState::SplineDirty);
        Ok(node)
    }

    pub fn set_node_roll(&mut self, index: usize, roll: f32) -> Result<()> {
        self.spline.set_node_roll(index, roll)?;
        self.mark(RebuildState::MetaDirty);
        Ok(())
    }

    /// Opens or closes the loop.
    ///
    /// Closing snaps the last node onto the first when they nearly touch,
    /// or bridges a wide gap with two nodes at 1/3 and 2/3 of it.
    pub fn set_closed(&mut self, closed: bool) {
        if self.spline.is_closed() == closed {
            return;
        }
        self.sync_meta();
        // open segment k and closed segment k + 1 share their anchor nodes
        if closed {
            self.edge_meta.insert(0, EdgeMeta::default());
        } else if !self.edge_meta.is_empty() {
            self.edge_meta.remove(0);
        }
        self.spline.set_closed(closed);
        self.mark(RebuildState::SplineDirty);

        let n = self.spline.node_count();
        if !closed || n < 4 {
            return;
        }
        let nodes = self.spline.nodes();
        let (first, last) = (nodes[0], nodes[n - 1]);
        let gap = first.position.distance(last.position);

        if gap < self.config.snap_distance {
            log::trace!("closing loop: snapping node {} onto node 0 ({gap:.3} m)", n - 1);
            if let Err(err) = self.spline.move_node(n - 1, first.position) {
                log::warn!("loop snap failed: {err}");
            }
        } else if gap > self.config.stitch_distance {
            log::trace!("closing loop: bridging {gap:.3} m gap with two nodes");
            for t in [0.33, 0.66] {
                let position = last.position.lerp(first.position, t);
                let roll = last.roll + (first.roll - last.roll) * t;
                self.spline.add_node(Node::with_roll(position, roll));
                self.node_meta.push(NodeMeta::default());
            }
        }
    }

    // ---- segment overrides ----

    pub fn set_edge_type(&mut self, segment: usize, edge_type: EdgeType) -> Result<()> {
        self.sync_meta();
        let count = self.edge_meta.len();
        let edge = self
            .edge_meta
            .get_mut(segment)
            .ok_or(TrackError::SegmentOutOfRange {
                index: segment,
                count,
            })?;
        edge.edge_type = edge_type;
        self.mark(RebuildState::FramesDirty);
        Ok(())
    }

    pub fn set_linear_by_segment(&mut self, segment: usize) -> Result<()> {
        self.set_edge_type(segment, EdgeType::Linear)
    }

    /// Marks the segment that starts at node `index` as linear.
    pub fn set_linear_by_node(&mut self, index: usize) -> Result<()> {
        let segment = self.spline.segment_index_starting_at_node(index)?;
        self.set_linear_by_segment(segment)
    }

    // ---- stations ----

    fn node_meta_mut(&mut self, index: usize) -> Result<&mut NodeMeta> {
        self.spline.node(index)?;
        self.sync_meta();
        self.mark(RebuildState::MetaDirty);
        Ok(&mut self.node_meta[index])
    }

    /// Marks node `index` as a station start. A positive `length` makes it
    /// a station on its own; otherwise it pairs with a following end node.
    pub fn set_station_start(&mut self, index: usize, length: f32) -> Result<()> {
        let meta = self.node_meta_mut(index)?;
        meta.station_start = true;
        meta.station_length = length.max(0.0);
        Ok(())
    }

    pub fn set_station_end(&mut self, index: usize, end: bool) -> Result<()> {
        self.node_meta_mut(index)?.station_end = end;
        Ok(())
    }

    pub fn clear_station(&mut self, index: usize) -> Result<()> {
        *self.node_meta_mut(index)? = NodeMeta::default();
        Ok(())
    }

    // ---- rebuild ----

    /// Brings all derived data up to date, running only the stages the
    /// current state requires.
    pub fn rebuild(&mut self) {
        if self.state >= RebuildState::SplineDirty {
            self.spline.rebuild_arc_length_lut(self.config.lut_samples);
            self.sync_meta();
            log::debug!(
                "rebuilt arc-length table: {} segments, {:.3} m",
                self.spline.segment_count(),
                self.spline.total_length()
            );
        }
        if self.state >= RebuildState::MetaDirty {
            self.stations = self.build_station_intervals();
            self.roll_keys = self.build_roll_keys();
            log::debug!(
                "rebuilt metadata: {} station intervals, {} roll keys",
                self.stations.len(),
                self.roll_keys.len()
            );
        }
        if self.state >= RebuildState::FramesDirty {
            let frames = {
                let sampler = PathSampler::new(&self.spline, &self.edge_meta);
                build_frames(&sampler, self.config.ds, self.config.up, &*self)
            };
            self.frames = frames;
            log::debug!("rebuilt {} frames", self.frames.len());
        }
        self.state = RebuildState::Clean;
    }

    /// Resizes node and edge metadata to the spline's node and segment counts.
    fn sync_meta(&mut self) {
        self.node_meta
            .resize(self.spline.node_count(), NodeMeta::default());
        self.edge_meta
            .resize(self.spline.segment_count(), EdgeMeta::default());
    }

    /// Arc length of the curve point closest to `point`, by linear scan over
    /// the whole path at `closest_point_step`.
    pub fn approximate_s_for_point(&self, point: Float3) -> f32 {
        self.approximate_s_in_range(point, 0.0, self.spline.total_length())
    }

    pub fn approximate_s_in_range(&self, point: Float3, s0: f32, s1: f32) -> f32 {
        let length = self.spline.total_length();
        let mut lo = s0.clamp(0.0, length);
        let mut hi = s1.clamp(0.0, length);
        if hi < lo {
            std::mem::swap(&mut lo, &mut hi);
        }
        let step = self.config.closest_point_step;

        let steps = ((hi - lo) / step).ceil() as usize;

        let mut best_s = lo;
        let mut best_d2 = f32::INFINITY;
        for i in 0..=steps {
            let s = (lo + i as f32 * step).min(hi);
            let d2 = (self.spline.position_at_s(s) - point).magnitude_squared();
            if d2 < best_d2 {
                best_d2 = d2;
                best_s = s;
            }
        }
        best_s
    }

    /// Arc length of a node: exact when it anchors a segment, closest point
    /// otherwise.
    fn arc_at_node(&self, index: usize) -> f32 {
        if let Ok(s) = self.spline.s_at_node(index) {
            return s;
        }
        let position = self.spline.nodes()[index].position;
        self.approximate_s_for_point(position)
    }

    fn build_station_intervals(&self) -> Vec<StationInterval> {
        if !self.spline.has_valid_lut() {
            return Vec::new();
        }
        let length = self.spline.total_length();
        let closed = self.spline.is_closed();
        let n = self.node_meta.len();
        let mut intervals = Vec::new();

        for (i, meta) in self.node_meta.iter().enumerate() {
            if meta.station_start && meta.station_length > 0.0 {
                let a = self.arc_at_node(i);
                let b = a + meta.station_length;
                if closed {
                    let b = if b <= length { b } else { b % length };
                    push_interval(&mut intervals, a, b, length);
                } else {
                    push_interval(&mut intervals, a, b.min(length), length);
                }
            }
        }

        let pairs = if closed { n } else { n.saturating_sub(1) };
        for i in 0..pairs {
            let j = (i + 1) % n;
            if !(self.node_meta[i].station_start && self.node_meta[j].station_end) {
                continue;
            }
            let a = self.arc_at_node(i);
            let b = self.arc_at_node(j);
            if closed {
                push_interval(&mut intervals, a, b, length);
            } else {
                push_interval(&mut intervals, a.min(b), a.max(b), length);
            }
        }

        merge_intervals(intervals, self.config.station_merge_gap)
    }

    /// One roll key per node. Shape-only end nodes are keyed at their
    /// closest point on the curve, and on a closed path a node sitting on the
    /// seam is keyed at 0. On-curve keys win ties.
    fn build_roll_keys(&self) -> Vec<RollKey> {
        if !self.spline.has_valid_lut() {
            return Vec::new();
        }
        let length = self.spline.total_length();
        let closed = self.spline.is_closed();
        let eps = self.config.roll_merge_eps;

        let mut mapped = Vec::new();
        let mut exact = Vec::new();
        for (i, node) in self.spline.nodes().iter().enumerate() {
            match self.spline.s_at_node(i) {
                Ok(s) if closed && length - s <= eps => {
                    mapped.push(RollKey::new(0.0, node.roll));
                }
                Ok(s) => exact.push(RollKey::new(s, node.roll)),
                Err(_) => {
                    let s = self.approximate_s_for_point(node.position);
                    mapped.push(RollKey::new(s, node.roll));
                }
            }
        }
        // the merge keeps the later of two keys at equal arc length
        mapped.extend(exact);
        prepare_roll_keys(mapped, eps)
    }

    // ---- queries ----

    /// Path length: the last frame's arc, or the spline's length before the
    /// first frame build.
    pub fn total_length(&self) -> f32 {
        self.frames
            .last()
            .map_or(self.spline.total_length(), |frame| frame.arc)
    }

    fn wrapped(&self, s: f32) -> f32 {
        if self.spline.is_closed() {
            wrap_arc(s, self.spline.total_length(), true)
        } else {
            s
        }
    }

    pub fn position_at_s(&self, s: f32) -> Float3 {
        PathSampler::new(&self.spline, &self.edge_meta)
            .sample_at_s(s)
            .position
    }

    pub fn tangent_at_s(&self, s: f32) -> Float3 {
        PathSampler::new(&self.spline, &self.edge_meta)
            .sample_at_s(s)
            .tangent
            .normalize_or(Float3::RIGHT)
    }

    /// Interpolated frame at `s`. Without frames, a frame is built from the
    /// curve sample and the up reference.
    pub fn frame_at_s(&self, s: f32) -> Frame {
        let s = self.wrapped(s);
        if let Some(frame) = interpolate_at_arc(&self.frames, s) {
            return frame;
        }
        let sample = PathSampler::new(&self.spline, &self.edge_meta).sample_at_s(s);
        let basis = Basis::from_tangent_and_up(sample.tangent, self.config.up);
        Frame::new(sample.position, basis, s)
    }

    pub fn cursor(&self) -> FrameCursor<'_> {
        FrameCursor::new(&self.frames, self.spline.is_closed())
    }
}

impl FrameMeta for TrackComponent {
    fn is_in_station(&self, s: f32) -> bool {
        is_in_station(&self.stations, self.wrapped(s))
    }

    fn station_edge_fade_weight(&self, s: f32) -> f32 {
        let loop_length = self
            .spline
            .is_closed()
            .then(|| self.spline.total_length());
        station_fade_weight(
            &self.stations,
            self.wrapped(s),
            self.config.station_feather,
            loop_length,
        )
    }

    fn manual_roll_at_s(&self, s: f32) -> f32 {
        evaluate_roll(
            &self.roll_keys,
            s,
            self.spline.total_length(),
            self.spline.is_closed(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_4;

    const TOLERANCE: f32 = 1e-4;

    fn track_from(positions: &[Float3], closed: bool) -> TrackComponent {
        TrackComponent::from_spline(
            Spline::from_positions(positions, closed),
            TrackConfig::default(),
        )
    }

    fn straight_track(count: usize) -> TrackComponent {
        let positions: Vec<Float3> = (0..count)
            .map(|i| Float3::new(10.0 * i as f32, 0.0, 0.0))
            .collect();
        let mut track = track_from(&positions, false);
        track.rebuild();
        track
    }

    fn square_loop() -> TrackComponent {
        let positions = [
            Float3::new(0.0, 0.0, 0.0),
            Float3::new(20.0, 0.0, 0.0),
            Float3::new(20.0, 0.0, 20.0),
            Float3::new(0.0, 0.0, 20.0),
        ];
        let mut track = track_from(&positions, true);
        track.rebuild();
        track
    }

    #[test]
    fn new_track_is_dirty_and_empty() {
        let mut track = TrackComponent::new();
        assert_eq!(track.state(), RebuildState::SplineDirty);
        track.rebuild();
        assert!(!track.is_dirty());
        assert!(track.frames().is_empty());
        assert_relative_eq!(track.total_length(), 0.0);

        let frame = track.frame_at_s(3.0);
        assert!(frame.basis().is_orthonormal(TOLERANCE));
        assert_eq!(frame.position, Float3::ZERO);
    }

    #[test]
    fn marking_never_lowers_state() {
        let mut track = straight_track(5);
        track.set_node_roll(2, 0.1).unwrap();
        assert_eq!(track.state(), RebuildState::MetaDirty);
        track.set_ds(0.25);
        assert_eq!(track.state(), RebuildState::MetaDirty);
        track.move_node(2, Float3::new(20.0, 1.0, 0.0)).unwrap();
        assert_eq!(track.state(), RebuildState::SplineDirty);
        track.rebuild();
        assert_eq!(track.state(), RebuildState::Clean);
    }

    #[test]
    fn edits_do_not_rebuild_eagerly() {
        let mut track = straight_track(5);
        let before = track.frames().to_vec();
        track.set_ds(1.0);
        assert_eq!(track.frames(), &before[..]);
        track.rebuild();
        assert!(track.frames().len() < before.len());
    }

    #[test]
    fn rebuild_twice_is_identical() {
        let mut track = square_loop();
        let first = track.frames().to_vec();
        track.mark_dirty();
        track.rebuild();
        assert_eq!(track.frames(), &first[..]);
        track.rebuild();
        assert_eq!(track.frames(), &first[..]);
    }

    #[test]
    fn frames_span_the_path() {
        let track = straight_track(5);
        let frames = track.frames();
        assert_relative_eq!(frames[0].arc, 0.0);
        assert_relative_eq!(frames[frames.len() - 1].arc, 20.0, epsilon = 1e-3);
        assert_relative_eq!(track.total_length(), 20.0, epsilon = 1e-3);
    }

    #[test]
    fn metadata_tracks_counts() {
        let mut track = straight_track(5);
        assert_eq!(track.node_meta().len(), 5);
        assert_eq!(track.edge_meta().len(), 2);

        track.add_node(Node::new(Float3::new(50.0, 0.0, 0.0)));
        track.rebuild();
        assert_eq!(track.node_meta().len(), 6);
        assert_eq!(track.edge_meta().len(), 3);
    }

    #[test]
    fn node_meta_follows_insert_and_remove() {
        let mut track = straight_track(6);
        track.set_station_end(3, true).unwrap();
        track
            .insert_node(1, Node::new(Float3::new(5.0, 0.0, 0.0)))
            .unwrap();
        assert!(track.node_meta()[4].station_end);

        track.remove_node(0).unwrap();
        assert!(track.node_meta()[3].station_end);
    }

    #[test]
    fn out_of_range_edits_fail() {
        let mut track = straight_track(5);
        assert_eq!(
            track.set_node_roll(5, 0.1),
            Err(TrackError::NodeOutOfRange { index: 5, len: 5 })
        );
        assert_eq!(
            track.set_linear_by_segment(2),
            Err(TrackError::SegmentOutOfRange { index: 2, count: 2 })
        );
        assert!(track.set_station_start(9, 1.0).is_err());
        assert!(track.set_linear_by_node(0).is_err());
        assert!(track.remove_node(7).is_err());
    }

    #[test]
    fn single_node_station() {
        let mut track = straight_track(6);
        // node 1 sits at s = 0
        track.set_station_start(2, 5.0).unwrap();
        track.rebuild();

        assert_eq!(track.stations().len(), 1);
        assert_relative_eq!(track.stations()[0].start, 10.0, epsilon = 1e-3);
        assert_relative_eq!(track.stations()[0].end, 15.0, epsilon = 1e-3);
        assert!(track.is_in_station(12.0));
        assert!(!track.is_in_station(16.0));
        assert!(track.station_edge_fade_weight(9.6) > 0.0);
    }

    #[test]
    fn paired_station_and_merge() {
        let mut track = straight_track(6);
        track.set_station_start(1, 0.0).unwrap();
        track.set_station_end(2, true).unwrap();
        track.set_station_start(2, 3.0).unwrap();
        track.rebuild();

        assert_eq!(track.stations().len(), 1);
        assert_relative_eq!(track.stations()[0].start, 0.0, epsilon = 1e-3);
        assert_relative_eq!(track.stations()[0].end, 13.0, epsilon = 1e-3);
    }

    #[test]
    fn off_curve_station_node_uses_closest_point() {
        let mut track = straight_track(6);
        track.set_station_start(0, 2.0).unwrap();
        track.rebuild();

        assert_eq!(track.stations().len(), 1);
        assert_relative_eq!(track.stations()[0].start, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn clear_station_removes_interval() {
        let mut track = straight_track(6);
        track.set_station_start(2, 5.0).unwrap();
        track.rebuild();
        track.clear_station(2).unwrap();
        track.rebuild();
        assert!(track.stations().is_empty());
    }

    #[test]
    fn closed_station_wraps_past_seam() {
        let mut track = square_loop();
        let length = track.spline().total_length();
        let s3 = track.spline().s_at_node(3).unwrap();
        let station = (length - s3) + 2.0;
        track.set_station_start(3, station).unwrap();
        track.rebuild();

        assert_eq!(track.stations().len(), 2);
        assert!(track.is_in_station(1.0));
        assert!(track.is_in_station(length - 1.0));
        assert!(!track.is_in_station(3.0));
    }

    #[test]
    fn station_frames_point_up() {
        let mut track = square_loop();
        track.set_node_roll(1, 0.5).unwrap();
        track.set_station_start(1, 8.0).unwrap();
        track.rebuild();

        let s1 = track.spline().s_at_node(1).unwrap();
        let frame = track.frame_at_s(s1 + 4.0);
        assert_relative_eq!(frame.normal.y, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn roll_keys_follow_nodes() {
        let mut track = straight_track(6);
        track.set_node_roll(2, FRAC_PI_4).unwrap();
        track.rebuild();

        // nodes 1..=4 anchor segments
        assert_eq!(track.roll_keys().len(), 4);
        for key in track.roll_keys() {
            assert_relative_eq!(track.manual_roll_at_s(key.s), key.roll, epsilon = TOLERANCE);
        }
        assert_relative_eq!(track.manual_roll_at_s(10.0), FRAC_PI_4, epsilon = TOLERANCE);
        assert_relative_eq!(track.manual_roll_at_s(5.0), FRAC_PI_4 * 0.5, epsilon = 1e-3);

        let frame = track.frame_at_s(10.0);
        assert_relative_eq!(frame.normal.y, FRAC_PI_4.cos(), epsilon = 1e-3);
    }

    #[test]
    fn end_node_rolls_map_to_closest_point() {
        let positions = [
            Float3::new(15.0, 2.0, 0.0),
            Float3::new(0.0, 0.0, 0.0),
            Float3::new(10.0, 0.0, 0.0),
            Float3::new(20.0, 0.0, 0.0),
            Float3::new(30.0, 0.0, 0.0),
            Float3::new(40.0, 0.0, 0.0),
        ];
        let mut track = track_from(&positions, false);
        track.set_node_roll(0, 0.4).unwrap();
        track.set_node_roll(4, 0.2).unwrap();
        track.set_node_roll(5, -0.5).unwrap();
        track.rebuild();

        // node 5 lands on node 4's key and yields to it
        assert_eq!(track.roll_keys().len(), 5);
        let length = track.total_length();
        assert_relative_eq!(track.manual_roll_at_s(length), 0.2, epsilon = TOLERANCE);

        let key = track
            .roll_keys()
            .iter()
            .find(|key| (key.roll - 0.4).abs() < TOLERANCE)
            .copied()
            .unwrap();
        assert!(track.position_at_s(key.s).distance(Float3::new(15.0, 0.0, 0.0)) < 0.1);
        assert_relative_eq!(track.manual_roll_at_s(key.s), 0.4, epsilon = TOLERANCE);
    }

    #[test]
    fn snapped_seam_node_shares_first_key() {
        let positions = [
            Float3::new(0.0, 0.0, 0.0),
            Float3::new(20.0, 0.0, 0.0),
            Float3::new(20.0, 0.0, 20.0),
            Float3::new(0.0, 0.0, 20.0),
            Float3::new(0.1, 0.0, 0.1),
        ];
        let mut track = track_from(&positions, false);
        track.set_closed(true);
        track.set_node_roll(0, 0.1).unwrap();
        track.set_node_roll(4, 0.3).unwrap();
        track.rebuild();

        let length = track.total_length();
        assert_eq!(track.roll_keys().len(), 4);
        for key in track.roll_keys() {
            assert!(key.s < length);
            assert_relative_eq!(track.manual_roll_at_s(key.s), key.roll, epsilon = TOLERANCE);
        }
        assert_relative_eq!(track.manual_roll_at_s(0.0), 0.1, epsilon = TOLERANCE);
        assert_relative_eq!(track.manual_roll_at_s(length), 0.1, epsilon = TOLERANCE);
    }

    #[test]
    fn station_fade_wraps_over_loop_seam() {
        let mut track = square_loop();
        track.set_station_start(0, 5.0).unwrap();
        track.rebuild();

        assert_eq!(track.stations().len(), 1);
        let end = track.stations()[0].end;
        let length = track.total_length();
        let before_seam = track.station_edge_fade_weight(length - 0.3);

        assert!(track.is_in_station(0.0));
        assert!(before_seam > 0.0);
        assert_relative_eq!(
            before_seam,
            track.station_edge_fade_weight(end + 0.3),
            epsilon = TOLERANCE
        );
        assert_relative_eq!(track.station_edge_fade_weight(length - 2.0), 0.0);
    }

    #[test]
    fn linear_override_straightens_segment() {
        let positions = [
            Float3::new(-5.0, 3.0, 0.0),
            Float3::new(0.0, 0.0, 0.0),
            Float3::new(10.0, 0.0, 0.0),
            Float3::new(15.0, -3.0, 0.0),
        ];
        let mut track = track_from(&positions, false);
        track.rebuild();
        let curved = track.position_at_s(track.total_length() * 0.25);
        assert!(curved.y.abs() > 1e-3);

        track.set_linear_by_node(1).unwrap();
        assert_eq!(track.state(), RebuildState::FramesDirty);
        track.rebuild();
        let mid = track.position_at_s(track.total_length() * 0.5);
        assert_relative_eq!(mid.x, 5.0, epsilon = TOLERANCE);
        assert_relative_eq!(mid.y, 0.0, epsilon = TOLERANCE);
        for frame in track.frames() {
            assert_relative_eq!(frame.position.y, 0.0, epsilon = TOLERANCE);
            assert_relative_eq!(frame.tangent.x, 1.0, epsilon = TOLERANCE);
        }
    }

    #[test]
    fn set_closed_snaps_near_endpoints() {
        let positions = [
            Float3::new(0.0, 0.0, 0.0),
            Float3::new(20.0, 0.0, 0.0),
            Float3::new(20.0, 0.0, 20.0),
            Float3::new(0.0, 0.0, 20.0),
            Float3::new(0.1, 0.0, 0.1),
        ];
        let mut track = track_from(&positions, false);
        track.set_closed(true);
        assert_eq!(track.nodes().len(), 5);
        assert_eq!(track.nodes()[4].position, Float3::ZERO);
        assert!(track.is_closed());
    }

    #[test]
    fn set_closed_stitches_wide_gap() {
        let positions = [
            Float3::new(0.0, 0.0, 0.0),
            Float3::new(20.0, 0.0, 0.0),
            Float3::new(20.0, 0.0, 20.0),
            Float3::new(0.0, 0.0, 20.0),
        ];
        let mut track = track_from(&positions, false);
        track.set_closed(true);

        assert_eq!(track.nodes().len(), 6);
        assert_eq!(track.node_meta().len(), 6);
        assert_relative_eq!(track.nodes()[4].position.z, 20.0 * 0.67, epsilon = TOLERANCE);
        assert_relative_eq!(track.nodes()[5].position.z, 20.0 * 0.34, epsilon = TOLERANCE);

        track.rebuild();
        assert_eq!(track.spline().segment_count(), 6);
    }

    #[test]
    fn set_closed_middle_gap_keeps_nodes() {
        let positions = [
            Float3::new(0.0, 0.0, 0.0),
            Float3::new(20.0, 0.0, 0.0),
            Float3::new(20.0, 0.0, 20.0),
            Float3::new(2.0, 0.0, 0.0),
        ];
        let mut track = track_from(&positions, false);
        track.set_closed(true);
        assert_eq!(track.nodes().len(), 4);
        assert_eq!(track.nodes()[3].position, Float3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn edge_override_keeps_its_anchors_across_closing() {
        let positions = [
            Float3::new(0.0, 0.0, 0.0),
            Float3::new(20.0, 0.0, 0.0),
            Float3::new(20.0, 0.0, 20.0),
            Float3::new(0.0, 0.0, 20.0),
            Float3::new(1.0, 0.0, 1.0),
        ];
        let mut track = track_from(&positions, false);
        track.rebuild();
        // open segment 1 runs node 2 -> node 3
        track.set_linear_by_segment(1).unwrap();
        track.set_closed(true);
        track.rebuild();
        assert!(track.edge_meta()[2].is_linear());
        assert_eq!(
            track.spline().segment_anchors(2).unwrap(),
            (positions[2], positions[3])
        );

        track.set_closed(false);
        track.rebuild();
        assert!(track.edge_meta()[1].is_linear());
    }

    #[test]
    fn closed_loop_seam_frames_match() {
        let track = square_loop();
        let frames = track.frames();
        let (first, last) = (frames[0], frames[frames.len() - 1]);
        assert_relative_eq!(first.normal.dot(last.normal), 1.0, epsilon = TOLERANCE);
        assert_relative_eq!(first.binormal.dot(last.binormal), 1.0, epsilon = TOLERANCE);
    }

    #[test]
    fn frame_at_s_wraps_on_loop() {
        let track = square_loop();
        let length = track.total_length();
        let a = track.frame_at_s(3.0);
        let b = track.frame_at_s(length + 3.0);
        assert_relative_eq!(a.position.distance(b.position), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn approximate_s_finds_closest_point() {
        let track = straight_track(6);
        let s = track.approximate_s_for_point(Float3::new(23.0, 4.0, 0.0));
        assert_relative_eq!(s, 13.0, epsilon = 0.05);
        let s = track.approximate_s_in_range(Float3::new(23.0, 4.0, 0.0), 20.0, 15.0);
        assert_relative_eq!(s, 15.0, epsilon = 0.05);
    }

    #[test]
    fn cursor_samples_current_frames() {
        let track = square_loop();
        let mut cursor = track.cursor();
        let pose = cursor.sample(5.0);
        let frame = track.frame_at_s(5.0);
        assert_relative_eq!(pose.position.distance(frame.position), 0.0, epsilon = 1e-3);
    }
}
