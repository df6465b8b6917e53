use super::math::{Float3, Matrix3, Quaternion};

const VERTICAL_EPSILON: f32 = 1e-8;
const TRANSPORT_EPSILON: f32 = 1e-6;
const ANTI_PARALLEL_COS: f32 = -0.9999;

/// Orthonormal track basis.
///
/// Right-handed coordinate system with three orthogonal unit vectors:
/// - `tangent`: direction of travel along the path
/// - `normal`: "up" of the track surface
/// - `binormal`: `tangent x normal`
///
/// C-compatible layout for FFI.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Basis {
    pub tangent: Float3,
    pub normal: Float3,
    pub binormal: Float3,
}

impl Basis {
    pub const fn new(tangent: Float3, normal: Float3, binormal: Float3) -> Self {
        Self {
            tangent,
            normal,
            binormal,
        }
    }

    pub const DEFAULT: Self = Self::new(Float3::RIGHT, Float3::UP, Float3::FORWARD);

    /// Builds a basis whose normal is `up` projected onto the plane
    /// perpendicular to `tangent`.
    ///
    /// A (nearly) vertical tangent makes the projection degenerate; then world
    /// Y is used, or world X if the tangent itself is close to Y.
    pub fn from_tangent_and_up(tangent: Float3, up: Float3) -> Self {
        let tangent = tangent.normalize_or(Float3::RIGHT);
        let mut raw = up - tangent * up.dot(tangent);
        if raw.magnitude_squared() <= VERTICAL_EPSILON || !raw.is_finite() {
            let fallback = if tangent.y.abs() < 0.9 {
                Float3::UP
            } else {
                Float3::RIGHT
            };
            raw = fallback - tangent * fallback.dot(tangent);
        }
        Self::new(tangent, raw, Float3::ZERO).reorthonormalize()
    }

    /// Re-orthonormalizes keeping `tangent` exact:
    /// `B = normalize(T x N)`, `N = normalize(B x T)`.
    pub fn reorthonormalize(self) -> Self {
        self.reorthonormalize_with_up(Float3::UP)
    }

    /// Like [`reorthonormalize`](Self::reorthonormalize), but a normal that
    /// collapsed onto the tangent is rebuilt from `up`.
    pub fn reorthonormalize_with_up(self, up: Float3) -> Self {
        let tangent = self.tangent.normalize_or(Float3::RIGHT);
        let mut binormal = tangent.cross(self.normal).normalize();
        if binormal == Float3::ZERO {
            return Self::from_tangent_and_up(tangent, up);
        }
        let normal = binormal.cross(tangent).normalize();
        binormal = tangent.cross(normal).normalize();
        Self::new(tangent, normal, binormal)
    }

    /// Rotates the basis around an arbitrary axis by the given angle.
    pub fn rotate_around(self, axis: Float3, angle: f32) -> Self {
        let q = Quaternion::from_axis_angle(axis, angle);
        Self {
            tangent: q.mul_vec(self.tangent).normalize(),
            normal: q.mul_vec(self.normal).normalize(),
            binormal: q.mul_vec(self.binormal).normalize(),
        }
    }

    /// Parallel-transports this basis onto a new tangent.
    ///
    /// The normal is rotated by the minimal rotation carrying the old tangent
    /// onto the new one. Anti-parallel tangents flip both normal and binormal.
    /// A degenerate result is rebuilt from `up`.
    pub fn transported(self, tangent: Float3, up: Float3) -> Self {
        let tangent = tangent.normalize_or(self.tangent);
        let axis = self.tangent.cross(tangent);
        let sin_phi = axis.magnitude();
        let cos_phi = self.tangent.dot(tangent).clamp(-1.0, 1.0);

        if sin_phi >= TRANSPORT_EPSILON {
            let phi = sin_phi.atan2(cos_phi);
            let normal = Quaternion::from_axis_angle(axis / sin_phi, phi).mul_vec(self.normal);
            return Self::new(tangent, normal, Float3::ZERO).reorthonormalize_with_up(up);
        }
        if cos_phi < ANTI_PARALLEL_COS {
            return Self::new(tangent, -self.normal, -self.binormal).reorthonormalize_with_up(up);
        }
        Self::new(tangent, self.normal, self.binormal).reorthonormalize_with_up(up)
    }

    /// Rotates normal and binormal around the tangent (bank angle).
    pub fn with_roll(self, roll: f32) -> Self {
        let q = Quaternion::from_axis_angle(self.tangent, roll);
        Self::new(self.tangent, q.mul_vec(self.normal), self.binormal).reorthonormalize()
    }

    /// Blends the normal toward `target`'s normal by `weight` in [0, 1],
    /// keeping this tangent. A blend that cancels out falls back to `target`'s
    /// normal.
    pub fn blend_normal(self, target: Self, weight: f32) -> Self {
        let normal = self.normal.lerp(target.normal, weight.clamp(0.0, 1.0));
        Self::new(self.tangent, normal, self.binormal).reorthonormalize_with_up(target.normal)
    }

    /// Rotation matrix with columns (T, N, B).
    pub fn matrix(self) -> Matrix3 {
        Matrix3::from_columns(self.tangent, self.normal, self.binormal)
    }

    pub fn orientation(self) -> Quaternion {
        Quaternion::from_rotation(&self.matrix())
    }

    pub fn from_orientation(q: Quaternion) -> Self {
        let m = Matrix3::from_quaternion(q);
        Self::new(m.c0, m.c1, m.c2)
    }

    pub fn is_orthonormal(self, tolerance: f32) -> bool {
        let unit = |v: Float3| (v.magnitude() - 1.0).abs() <= tolerance;
        unit(self.tangent)
            && unit(self.normal)
            && unit(self.binormal)
            && self.tangent.dot(self.normal).abs() <= tolerance
            && self.tangent.dot(self.binormal).abs() <= tolerance
            && self.normal.dot(self.binormal).abs() <= tolerance
            && self.tangent.cross(self.normal).dot(self.binormal) > 0.0
    }
}

impl Default for Basis {
    fn default() -> Self {
        Self::DEFAULT
    }
}
