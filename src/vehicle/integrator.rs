use super::acceleration::{driving_acceleration, friction_acceleration};
use crate::sim::{wrap_arc, Float3, Matrix3, VehicleParams};
use crate::track::{FrameCursor, TrackComponent};

const MAX_SUBSTEPS: usize = 250;
const BACKWARD_ENTER_SPEED: f32 = 0.12;
const BACKWARD_EXIT_SPEED: f32 = 0.08;

/// External acceleration as a function of `(s, v)`.
pub type ExtraAcceleration = Box<dyn Fn(f32, f32) -> f32>;

/// Single-body ride along a track's frames.
///
/// Integrates at a fixed substep regardless of the caller's frame time.
/// Only the cursor's index is kept between updates, so the vehicle never
/// holds a borrow of the track.
pub struct Vehicle {
    s: f32,
    v: f32,
    params: VehicleParams,
    accumulator: f32,
    extra: Option<ExtraAcceleration>,
    cursor_hint: usize,
    position: Float3,
    orientation: Matrix3,
    backwards: bool,
}

impl Vehicle {
    pub fn new(params: VehicleParams) -> Self {
        Self {
            s: 0.0,
            v: 0.0,
            params: params.sanitized(),
            accumulator: 0.0,
            extra: None,
            cursor_hint: 0,
            position: Float3::ZERO,
            orientation: Matrix3::IDENTITY,
            backwards: false,
        }
    }

    pub fn params(&self) -> &VehicleParams {
        &self.params
    }

    pub fn set_params(&mut self, params: VehicleParams) {
        self.params = params.sanitized();
    }

    pub fn s(&self) -> f32 {
        self.s
    }

    pub fn velocity(&self) -> f32 {
        self.v
    }

    /// Moves the vehicle to `s` and drops any banked frame time.
    pub fn set_s(&mut self, s: f32) {
        self.s = s;
        self.accumulator = 0.0;
    }

    /// Sets the velocity directly, clamped to the speed limit.
    pub fn kick(&mut self, v0: f32) {
        self.v = v0.clamp(-self.params.max_speed, self.params.max_speed);
        self.update_direction();
    }

    pub fn set_extra_acceleration(&mut self, f: impl Fn(f32, f32) -> f32 + 'static) {
        self.extra = Some(Box::new(f));
    }

    pub fn clear_extra_acceleration(&mut self) {
        self.extra = None;
    }

    pub fn position(&self) -> Float3 {
        self.position
    }

    /// World orientation with columns (tangent, normal, binormal).
    pub fn orientation(&self) -> Matrix3 {
        self.orientation
    }

    pub fn is_moving_backwards(&self) -> bool {
        self.backwards
    }

    /// Re-seats the vehicle on freshly built frames.
    pub fn on_track_rebuilt(&mut self, track: &TrackComponent) {
        self.s = wrap_arc(self.s, track.total_length(), track.is_closed());
        self.cursor_hint = 0;
        self.refresh_pose(&mut track.cursor());
    }

    /// Advances by `dt` seconds of frame time.
    pub fn update(&mut self, dt: f32, track: &TrackComponent) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }
        let frames = track.frames();
        if frames.is_empty() {
            self.accumulator = 0.0;
            return;
        }

        let closed = track.is_closed();
        let length = track.total_length();
        let up = track.config().up;
        let h = self.params.substep;
        let mut cursor = FrameCursor::with_hint(frames, closed, self.cursor_hint);

        self.accumulator += dt;
        let mut steps = 0;
        while self.accumulator >= h {
            if steps == MAX_SUBSTEPS {
                log::debug!(
                    "dropping {:.3} s of frame time after {MAX_SUBSTEPS} substeps",
                    self.accumulator
                );
                self.accumulator = 0.0;
                break;
            }
            self.step(&mut cursor, up, h, length, closed);
            self.accumulator -= h;
            steps += 1;
        }

        self.refresh_pose(&mut cursor);
        self.update_direction();
    }

    fn step(
        &mut self,
        cursor: &mut FrameCursor<'_>,
        up: Float3,
        h: f32,
        length: f32,
        closed: bool,
    ) {
        let params = self.params;
        let pose = cursor.sample(self.s);
        let external = self.extra.as_ref().map_or(0.0, |f| f(self.s, self.v));

        let driving = driving_acceleration(up, pose.basis.tangent, self.v, &params, external);
        let a = driving + friction_acceleration(self.v, driving, &params);

        let mut v = (self.v + a * h).clamp(-params.max_speed, params.max_speed);
        // friction alone never reverses the direction of travel
        let coasting = self.v + driving * h;
        if v * self.v < 0.0 && coasting * self.v >= 0.0 {
            v = 0.0;
        }
        if v.abs() < params.stop_speed && driving.abs() <= params.friction_ceiling() {
            v = 0.0;
        }

        if params.min_speed_enabled && v.abs() < params.min_speed {
            let margin = params.assist_end_margin;
            if closed || (self.s > margin && self.s < length - margin) {
                v = if v < 0.0 { -params.min_speed } else { params.min_speed };
            }
        }

        let s = self.s + v * h;
        if closed {
            self.s = wrap_arc(s, length, true);
        } else if s < 0.0 {
            self.s = 0.0;
            v = 0.0;
        } else if s > length {
            self.s = length;
            v = 0.0;
        } else {
            self.s = s;
        }
        self.v = v;
    }

    fn refresh_pose(&mut self, cursor: &mut FrameCursor<'_>) {
        let pose = cursor.sample(self.s);
        self.cursor_hint = cursor.index();
        self.position = pose.position;
        self.orientation = pose.basis.matrix();
    }

    fn update_direction(&mut self) {
        if self.backwards {
            if self.v > -BACKWARD_EXIT_SPEED {
                self.backwards = false;
            }
        } else if self.v < -BACKWARD_ENTER_SPEED {
            self.backwards = true;
        }
    }
}

impl Default for Vehicle {
    fn default() -> Self {
        Self::new(VehicleParams::default())
    }
}
