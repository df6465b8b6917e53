//! Single-body ride simulation along built track frames.

mod acceleration;
mod integrator;

pub use acceleration::{driving_acceleration, friction_acceleration};
pub use integrator::{ExtraAcceleration, Vehicle};
