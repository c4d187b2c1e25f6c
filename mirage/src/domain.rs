use super::*;

/// The rectangle, in the vertical plane, outside of which a ray has left the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DomainBounds {
    pub x_min: Float,
    pub x_max: Float,
    pub y_min: Float,
    pub y_max: Float,
}

impl DomainBounds {
    #[inline]
    #[must_use]
    pub const fn new(x_min: Float, x_max: Float, y_min: Float, y_max: Float) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    #[inline]
    pub fn width(&self) -> Float {
        self.x_max - self.x_min
    }

    #[inline]
    pub fn height(&self) -> Float {
        self.y_max - self.y_min
    }

    /// Whether `y` is under the lower bound (the ground, or the sea surface).
    #[inline]
    pub fn is_below_floor(&self, y: Float) -> bool {
        y < self.y_min
    }

    /// How a ray at `p` has left the domain through its sides or top, if it has.
    ///
    /// The floor is not checked here, what happens there is up to the [`TracePolicy`].
    #[inline]
    pub fn exit(&self, p: &Vector2<Float>) -> Option<Termination> {
        if p.x < self.x_min || p.x > self.x_max {
            Some(Termination::ExitedSide)
        } else if p.y > self.y_max {
            Some(Termination::ExitedTop)
        } else {
            None
        }
    }

    #[inline]
    pub fn contains(&self, p: &Vector2<Float>) -> bool {
        !self.is_below_floor(p.y) && self.exit(p).is_none()
    }
}
