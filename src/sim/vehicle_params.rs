use super::physics::{DT, G};

/// Tunables for the ride integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleParams {
    /// Vehicle mass (kg), scales air drag.
    pub mass: f32,
    pub gravity: f32,
    /// Rolling friction coefficient; the friction ceiling is `mu * g`.
    pub rolling_friction: f32,
    /// Quadratic drag coefficient.
    pub drag: f32,
    pub max_speed: f32,
    /// Speeds below this count as stopped.
    pub stop_speed: f32,
    /// Fixed physics substep (s).
    pub substep: f32,
    pub min_speed_enabled: bool,
    pub min_speed: f32,
    /// The min-speed assist stays off this close to open-path ends (m).
    pub assist_end_margin: f32,
}

impl VehicleParams {
    pub const DEFAULT: Self = Self {
        mass: 400.0,
        gravity: G,
        rolling_friction: 0.002,
        drag: 0.02,
        max_speed: 550.0,
        stop_speed: 0.02,
        substep: DT,
        min_speed_enabled: false,
        min_speed: 20.0,
        assist_end_margin: 2.0,
    };

    /// Parameters with every dissipative term switched off.
    pub fn frictionless() -> Self {
        Self {
            rolling_friction: 0.0,
            drag: 0.0,
            ..Self::DEFAULT
        }
    }

    /// Friction ceiling in m/s^2.
    pub fn friction_ceiling(&self) -> f32 {
        self.rolling_friction.max(0.0) * self.gravity
    }

    /// Clamps values that would break the integrator.
    pub fn sanitized(mut self) -> Self {
        if self.substep.is_nan() || self.substep <= 0.0 {
            log::warn!("vehicle substep {} is not positive, using {}", self.substep, DT);
            self.substep = DT;
        }
        if self.mass.is_nan() || self.mass <= 0.0 {
            log::warn!("vehicle mass {} is not positive, using 400", self.mass);
            self.mass = Self::DEFAULT.mass;
        }
        self.max_speed = self.max_speed.abs();
        self.stop_speed = self.stop_speed.abs();
        self
    }
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self::DEFAULT
    }
}
