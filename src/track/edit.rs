//! Editor-facing helpers on top of [`TrackComponent`].

use super::component::TrackComponent;
use crate::curve::Node;
use crate::error::{Result, TrackError};
use crate::sim::{Easing, Float3};

/// Terrain height lookup used to drop new nodes onto the ground.
pub trait HeightSampler {
    fn sample_height_bilinear(&self, x: f32, z: f32) -> f32;
}

impl<F> HeightSampler for F
where
    F: Fn(f32, f32) -> f32,
{
    fn sample_height_bilinear(&self, x: f32, z: f32) -> f32 {
        self(x, z)
    }
}

/// Puts a point `clearance` metres above the terrain.
#[derive(Clone, Copy)]
pub struct GroundSnap<'a> {
    pub terrain: &'a dyn HeightSampler,
    pub clearance: f32,
}

impl<'a> GroundSnap<'a> {
    pub fn new(terrain: &'a dyn HeightSampler, clearance: f32) -> Self {
        Self { terrain, clearance }
    }

    pub fn apply(&self, position: Float3) -> Float3 {
        let ground = self.terrain.sample_height_bilinear(position.x, position.z);
        Float3::new(position.x, ground + self.clearance, position.z)
    }
}

fn snapped(position: Float3, snap: Option<GroundSnap<'_>>) -> Float3 {
    snap.map_or(position, |snap| snap.apply(position))
}

impl TrackComponent {
    fn last_roll(&self) -> f32 {
        self.nodes().last().map_or(0.0, |node| node.roll)
    }

    /// Appends a node, optionally snapped to the ground. The node inherits
    /// the current last node's roll. Returns its index.
    pub fn place_node(&mut self, position: Float3, snap: Option<GroundSnap<'_>>) -> usize {
        let roll = self.last_roll();
        self.add_node(Node::with_roll(snapped(position, snap), roll))
    }

    /// Inserts a node after `after`, or at the front for `None`. The node
    /// inherits its predecessor's roll (the first node's at the front).
    pub fn insert_node_after(
        &mut self,
        after: Option<usize>,
        position: Float3,
        snap: Option<GroundSnap<'_>>,
    ) -> Result<usize> {
        let len = self.nodes().len();
        let (index, roll) = match after {
            None => (0, self.nodes().first().map_or(0.0, |node| node.roll)),
            Some(after) if after < len => (after + 1, self.nodes()[after].roll),
            Some(after) => return Err(TrackError::NodeOutOfRange { index: after, len }),
        };
        self.insert_node(index, Node::with_roll(snapped(position, snap), roll))?;
        Ok(index)
    }

    /// Appends two nodes ending at `end`, the first `tail_length` back along
    /// `direction`. Returns the index of the first new node.
    pub fn add_tail_segment(
        &mut self,
        end: Float3,
        direction: Float3,
        tail_length: f32,
        snap: Option<GroundSnap<'_>>,
    ) -> usize {
        let direction = direction.normalize_or(Float3::RIGHT);
        let start = end - direction * tail_length;
        let roll = self.last_roll();
        let first = self.add_node(Node::with_roll(snapped(start, snap), roll));
        self.add_node(Node::with_roll(snapped(end, snap), roll));
        first
    }

    /// Sets roll over nodes `a..=b` by easing from `roll_a` to `roll_b`.
    /// The range may be given in either order.
    pub fn spread_roll(
        &mut self,
        a: usize,
        b: usize,
        roll_a: f32,
        roll_b: f32,
        easing: Easing,
    ) -> Result<()> {
        let len = self.nodes().len();
        for index in [a, b] {
            if index >= len {
                return Err(TrackError::NodeOutOfRange { index, len });
            }
        }
        let (lo, hi, from, to) = if a <= b {
            (a, b, roll_a, roll_b)
        } else {
            (b, a, roll_b, roll_a)
        };

        for i in lo..=hi {
            let t = if hi == lo {
                0.0
            } else {
                (i - lo) as f32 / (hi - lo) as f32
            };
            let w = easing.apply(t);
            self.set_node_roll(i, from * (1.0 - w) + to * w)?;
        }
        Ok(())
    }

    /// Marks the last `count` segments linear. Returns how many were marked.
    pub fn linearize_tail(&mut self, count: usize) -> usize {
        let segments = self.spline().segment_count();
        let count = count.min(segments);
        for segment in segments - count..segments {
            if let Err(err) = self.set_linear_by_segment(segment) {
                log::warn!("cannot linearize segment {segment}: {err}");
            }
        }
        count
    }
}
