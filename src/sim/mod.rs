//! Pure math and physics primitives for the track engine.
//!
//! Vectors, quaternions, orthonormal bases, roll keys and ride parameters.
//! Nothing here knows about splines or frames.

mod basis;
mod keyframe;
mod math;
mod vehicle_params;

pub mod physics;

pub use basis::Basis;
pub use keyframe::{evaluate_roll, prepare_roll_keys, Easing, RollKey};
pub use math::{Float3, Matrix3, Quaternion};
pub use physics::{smoothstep, wrap_angle, wrap_arc, DT, EPSILON, G, HZ};
pub use vehicle_params::VehicleParams;
