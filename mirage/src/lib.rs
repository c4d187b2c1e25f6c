//! Light rays bending through a horizontally stratified atmosphere.
//!
//! Rays live in the vertical plane (downrange distance `x`, height `y`) and follow the
//! ray-curvature equation of geometric optics, integrated with a fixed-step RK4 scheme.
//! The refractive index profile is supplied through [`Atmosphere`], and what happens at
//! the ground, along with how a finished ray is classified, through [`TracePolicy`].

pub use nalgebra;

use nalgebra::{SVector, Unit, Vector2};

mod atmosphere;
mod domain;
mod driver;
mod fan;
mod policy;
mod rk4;

pub use atmosphere::*;
pub use domain::*;
pub use driver::*;
pub use fan::*;
pub use policy::*;
pub use rk4::*;

pub type Float = f64;

/// A light ray at launch, represented as a half-line in the vertical plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// The launch point, `[x, y]`
    pub origin: Vector2<Float>,
    /// The initial heading
    pub direction: Unit<Vector2<Float>>,
}

impl Ray {
    #[inline]
    #[must_use]
    pub fn new(origin: impl Into<Vector2<Float>>, direction: Unit<Vector2<Float>>) -> Self {
        Self {
            origin: origin.into(),
            direction,
        }
    }

    /// Returns `None` if `direction` is (almost) the zero vector.
    #[inline]
    #[must_use]
    pub fn try_new(
        origin: impl Into<Vector2<Float>>,
        direction: impl Into<Vector2<Float>>,
    ) -> Option<Self> {
        Unit::try_new(direction.into(), Float::EPSILON).map(|direction| Self::new(origin, direction))
    }

    /// A ray leaving `origin` with the given elevation angle, in radians,
    /// measured counter-clockwise from the `+x` axis.
    #[inline]
    #[must_use]
    pub fn from_angle(origin: impl Into<Vector2<Float>>, angle: Float) -> Self {
        let (sin, cos) = angle.sin_cos();
        // SAFETY: cos² + sin² = 1
        Self::new(origin, Unit::new_unchecked(Vector2::new(cos, sin)))
    }

    /// The heading, in radians, in `(-π, π]`
    #[inline]
    pub fn angle(&self) -> Float {
        self.direction.y.atan2(self.direction.x)
    }

    /// Get the point at distance `t` (can be negative) from the ray's origin,
    /// ignoring any bending.
    #[inline]
    pub fn at(&self, t: Float) -> Vector2<Float> {
        self.origin + self.direction.as_ref() * t
    }
}

/// Position and direction of a ray being integrated: `[x, y, vx, vy]`.
///
/// `(vx, vy)` is kept at unit length by [`RayState::renormalize`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayState(pub SVector<Float, 4>);

impl RayState {
    /// Below this speed, renormalizing would divide by (almost) zero.
    pub const MIN_SPEED: Float = 1e-15;

    #[inline]
    #[must_use]
    pub fn new(x: Float, y: Float, vx: Float, vy: Float) -> Self {
        Self(SVector::<Float, 4>::new(x, y, vx, vy))
    }

    #[inline]
    pub fn x(&self) -> Float {
        self.0[0]
    }

    #[inline]
    pub fn y(&self) -> Float {
        self.0[1]
    }

    #[inline]
    pub fn vx(&self) -> Float {
        self.0[2]
    }

    #[inline]
    pub fn vy(&self) -> Float {
        self.0[3]
    }

    #[inline]
    pub fn set_y(&mut self, y: Float) {
        self.0[1] = y;
    }

    #[inline]
    pub fn set_vy(&mut self, vy: Float) {
        self.0[3] = vy;
    }

    #[inline]
    pub fn position(&self) -> Vector2<Float> {
        Vector2::new(self.x(), self.y())
    }

    #[inline]
    pub fn speed(&self) -> Float {
        self.vx().hypot(self.vy())
    }

    /// Rescale the direction back to unit length.
    ///
    /// Leaves the state untouched, and returns `false`, if the speed
    /// is below [`Self::MIN_SPEED`].
    #[inline]
    pub fn renormalize(&mut self) -> bool {
        let mag = self.speed();
        if mag < Self::MIN_SPEED {
            return false;
        }
        self.0[2] /= mag;
        self.0[3] /= mag;
        true
    }
}

impl From<&Ray> for RayState {
    #[inline]
    fn from(ray: &Ray) -> Self {
        Self::new(ray.origin.x, ray.origin.y, ray.direction.x, ray.direction.y)
    }
}
