//! railtrack - track-curve engine for roller coaster editors.
//!
//! # Architecture
//!
//! Layered modules with strict inward-only dependencies:
//!
//! - **sim**: Math/physics primitives (Float3, Quaternion, Basis, roll keys)
//! - **curve**: Centripetal Catmull-Rom spline, arc-length table, path sampler
//! - **track**: Rotation-minimizing frames, stations, the editable component
//! - **vehicle**: Fixed-substep ride integrator
//! - **ffi**: C FFI bindings
//!
//! # Usage
//!
//! ```
//! use railtrack::{Float3, Node, TrackComponent};
//!
//! let mut track = TrackComponent::new();
//! for i in 0..5 {
//!     track.add_node(Node::new(Float3::new(10.0 * i as f32, 0.0, 0.0)));
//! }
//! track.rebuild();
//! let frame = track.frame_at_s(5.0);
//! assert!(frame.position.is_finite());
//! ```
//!
//! For C/C#/Unity, build with the `ffi` feature, link the cdylib and use
//! the `rt_track_*` functions.

pub mod curve;
pub mod error;
pub mod sim;
pub mod track;
pub mod vehicle;

#[cfg(feature = "ffi")]
pub mod ffi;

// Re-export commonly used types at crate root
pub use curve::{EdgeType, Node, PathSampler, Spline};
pub use error::{Result, TrackError};
pub use sim::{Basis, Easing, Float3, Matrix3, Quaternion};
pub use track::{Frame, FrameCursor, RebuildState, TrackComponent, TrackConfig};
pub use vehicle::Vehicle;
