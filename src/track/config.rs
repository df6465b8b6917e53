use crate::curve::MIN_LUT_SAMPLES;
use crate::sim::Float3;

/// Smallest accepted frame spacing and closest-point scan step (m).
pub(crate) const MIN_STEP: f32 = 1e-3;

/// Track tunables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackConfig {
    /// Frame spacing along the path (m).
    pub ds: f32,
    /// World-up reference for seeding and stations.
    pub up: Float3,
    pub lut_samples: usize,
    /// Fade band length outside each station (m).
    pub station_feather: f32,
    pub station_merge_gap: f32,
    pub roll_merge_eps: f32,
    /// Scan step of the closest-point search for off-curve nodes (m).
    pub closest_point_step: f32,
    /// Closing a loop moves the last node onto the first below this distance.
    pub snap_distance: f32,
    /// Closing a loop inserts two bridge nodes above this distance.
    pub stitch_distance: f32,
}

impl TrackConfig {
    pub const DEFAULT: Self = Self {
        ds: 0.5,
        up: Float3::UP,
        lut_samples: 64,
        station_feather: 0.75,
        station_merge_gap: 1e-4,
        roll_merge_eps: 1e-4,
        closest_point_step: 0.05,
        snap_distance: 0.25,
        stitch_distance: 4.0,
    };

    const FALLBACK_DS: f32 = 0.05;

    /// Replaces values that would break a rebuild with safe ones.
    pub fn sanitized(mut self) -> Self {
        if self.ds.is_nan() || self.ds <= 0.0 {
            log::warn!("frame step {} is not positive, using {}", self.ds, Self::FALLBACK_DS);
            self.ds = Self::FALLBACK_DS;
        } else if self.ds < MIN_STEP {
            log::warn!("frame step {} is too small, using {MIN_STEP}", self.ds);
            self.ds = MIN_STEP;
        }
        if self.lut_samples < MIN_LUT_SAMPLES {
            log::warn!(
                "{} lut samples per segment is too few, using {}",
                self.lut_samples,
                MIN_LUT_SAMPLES
            );
            self.lut_samples = MIN_LUT_SAMPLES;
        }
        if self.station_feather.is_nan() || self.station_feather <= 0.0 {
            log::warn!(
                "station feather {} is not positive, using {}",
                self.station_feather,
                Self::DEFAULT.station_feather
            );
            self.station_feather = Self::DEFAULT.station_feather;
        }
        if self.closest_point_step.is_nan() || self.closest_point_step <= 0.0 {
            self.closest_point_step = Self::DEFAULT.closest_point_step;
        } else if self.closest_point_step < MIN_STEP {
            log::warn!(
                "closest point step {} is too small, using {MIN_STEP}",
                self.closest_point_step
            );
            self.closest_point_step = MIN_STEP;
        }
        let up = self.up.normalize();
        if up == Float3::ZERO {
            log::warn!("up vector {:?} is degenerate, using +Y", self.up);
            self.up = Float3::UP;
        } else {
            self.up = up;
        }
        self
    }
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_values() {
        let config = TrackConfig::default();
        assert_eq!(config.ds, 0.5);
        assert_eq!(config.up, Float3::UP);
        assert_eq!(config.lut_samples, 64);
        assert_eq!(config.station_feather, 0.75);
        assert_eq!(config.snap_distance, 0.25);
        assert_eq!(config.stitch_distance, 4.0);
    }

    #[test]
    fn test_default_is_already_sane() {
        assert_eq!(TrackConfig::default().sanitized(), TrackConfig::default());
    }

    #[test]
    fn test_sanitized_clamps_bad_values() {
        let config = TrackConfig {
            ds: -1.0,
            up: Float3::ZERO,
            lut_samples: 0,
            station_feather: 0.0,
            ..TrackConfig::default()
        }
        .sanitized();

        assert_relative_eq!(config.ds, 0.05);
        assert_eq!(config.up, Float3::UP);
        assert_eq!(config.lut_samples, MIN_LUT_SAMPLES);
        assert_relative_eq!(config.station_feather, 0.75);
    }

    #[test]
    fn test_sanitized_raises_tiny_steps() {
        let config = TrackConfig {
            ds: 1e-9,
            closest_point_step: f32::MIN_POSITIVE,
            ..TrackConfig::default()
        }
        .sanitized();

        assert_relative_eq!(config.ds, MIN_STEP);
        assert_relative_eq!(config.closest_point_step, MIN_STEP);

        let fine = TrackConfig {
            ds: 0.002,
            ..TrackConfig::default()
        }
        .sanitized();
        assert_relative_eq!(fine.ds, 0.002);
    }

    #[test]
    fn test_sanitized_normalizes_up() {
        let config = TrackConfig {
            up: Float3::new(0.0, 3.0, 4.0),
            ..TrackConfig::default()
        }
        .sanitized();
        assert_relative_eq!(config.up.y, 0.6, epsilon = 1e-6);
        assert_relative_eq!(config.up.z, 0.8, epsilon = 1e-6);
    }
}
