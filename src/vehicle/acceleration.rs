use crate::sim::{Float3, VehicleParams};

/// Net driving acceleration along the track (m/s^2): the tangential part of
/// gravity, quadratic drag and any external term.
pub fn driving_acceleration(
    up: Float3,
    tangent: Float3,
    velocity: f32,
    params: &VehicleParams,
    external: f32,
) -> f32 {
    let gravity = -params.gravity * up.dot(tangent);
    let drag = -(params.drag / params.mass) * velocity * velocity.abs();
    gravity + drag + external
}

/// Rolling friction for the current velocity and driving acceleration.
///
/// While moving, friction opposes the velocity at the ceiling `mu * g`.
/// Near standstill it cancels a driving acceleration up to the ceiling and
/// opposes a larger one at the ceiling.
pub fn friction_acceleration(velocity: f32, driving: f32, params: &VehicleParams) -> f32 {
    let ceiling = params.friction_ceiling();
    if velocity.abs() > params.stop_speed {
        -velocity.signum() * ceiling
    } else if driving.abs() <= ceiling {
        -driving
    } else {
        -driving.signum() * ceiling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::G;
    use approx::assert_relative_eq;

    const TOLERANCE: f32 = 1e-5;

    #[test]
    fn flat_track_has_no_gravity_term() {
        let params = VehicleParams::frictionless();
        let a = driving_acceleration(Float3::UP, Float3::RIGHT, 0.0, &params, 0.0);
        assert_eq!(a, 0.0);
    }

    #[test]
    fn downhill_accelerates() {
        let params = VehicleParams::frictionless();
        let tangent = Float3::new(1.0, -1.0, 0.0).normalize();
        let a = driving_acceleration(Float3::UP, tangent, 0.0, &params, 0.0);
        assert_relative_eq!(a, G * std::f32::consts::FRAC_1_SQRT_2, epsilon = TOLERANCE);
    }

    #[test]
    fn drag_is_quadratic_and_opposes_motion() {
        let params = VehicleParams {
            drag: 0.02,
            mass: 400.0,
            ..VehicleParams::frictionless()
        };
        let forward = driving_acceleration(Float3::UP, Float3::RIGHT, 10.0, &params, 0.0);
        let backward = driving_acceleration(Float3::UP, Float3::RIGHT, -10.0, &params, 0.0);
        assert_relative_eq!(forward, -0.005, epsilon = TOLERANCE);
        assert_relative_eq!(backward, 0.005, epsilon = TOLERANCE);
    }

    #[test]
    fn external_term_is_added() {
        let params = VehicleParams::frictionless();
        let a = driving_acceleration(Float3::UP, Float3::RIGHT, 0.0, &params, 1.5);
        assert_relative_eq!(a, 1.5);
    }

    #[test]
    fn moving_friction_opposes_velocity() {
        let params = VehicleParams::default();
        let ceiling = params.friction_ceiling();
        assert_relative_eq!(friction_acceleration(5.0, 3.0, &params), -ceiling);
        assert_relative_eq!(friction_acceleration(-5.0, 3.0, &params), ceiling);
    }

    #[test]
    fn static_friction_cancels_small_drive() {
        let params = VehicleParams::default();
        let small = 0.5 * params.friction_ceiling();
        assert_relative_eq!(friction_acceleration(0.0, small, &params), -small);
        assert_relative_eq!(friction_acceleration(0.01, -small, &params), small);
    }

    #[test]
    fn static_friction_saturates_for_large_drive() {
        let params = VehicleParams::default();
        let ceiling = params.friction_ceiling();
        assert_relative_eq!(friction_acceleration(0.0, 2.0, &params), -ceiling);
        assert_relative_eq!(friction_acceleration(0.0, -2.0, &params), ceiling);
    }
}
