//! Track orchestration: frames, stations, roll and the editable component.
//!
//! [`TrackComponent`] owns a spline plus its per-node and per-segment
//! metadata and turns them into an ordered [`Frame`] sequence on
//! [`TrackComponent::rebuild`]. [`FrameCursor`] reads that sequence on hot
//! paths.

mod builder;
mod component;
mod config;
mod cursor;
mod edit;
mod frame;
mod meta;

pub use builder::{build_frames, FrameMeta};
pub use component::{RebuildState, TrackComponent};
pub use config::TrackConfig;
pub use cursor::{CursorPose, FrameCursor};
pub use edit::{GroundSnap, HeightSampler};
pub use frame::{interpolate_at_arc, Frame};
pub use meta::{merge_intervals, push_interval, NodeMeta, StationInterval};
