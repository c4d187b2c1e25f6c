use tracing::trace;

use super::*;

/// What a [`RayTracker`] did with a ray that went below the domain's floor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloorContact {
    /// The state was moved back above the floor, the ray keeps going.
    Clamped,
    /// The ray ends here.
    Absorbed,
}

/// Per-trace strategy: local step size, behaviour at the floor, and how a
/// finished ray is classified.
///
/// A policy is shared by every ray of a fan, per-ray bookkeeping lives in
/// the [`RayTracker`] it hands out for each trace.
pub trait TracePolicy {
    type Tracker: RayTracker;

    /// The integration step to use at height `y`, given the nominal step `ds`.
    #[inline]
    fn step_size(&self, _y: Float, ds: Float) -> Float {
        ds
    }

    /// Start tracking a ray launched with state `start`.
    fn tracker(&self, start: &RayState) -> Self::Tracker;
}

impl<P: TracePolicy + ?Sized> TracePolicy for &P {
    type Tracker = P::Tracker;

    #[inline]
    fn step_size(&self, y: Float, ds: Float) -> Float {
        (**self).step_size(y, ds)
    }

    #[inline]
    fn tracker(&self, start: &RayState) -> Self::Tracker {
        (**self).tracker(start)
    }
}

pub trait RayTracker {
    type Classification;

    /// Called after every completed step, before any boundary handling.
    fn observe(&mut self, state: &RayState);

    /// Called when a step ended below `domain.y_min`.
    ///
    /// May modify `state` (e. g. move it back into the domain).
    fn at_floor(&mut self, state: &mut RayState, domain: &DomainBounds) -> FloorContact;

    fn finish(self) -> Self::Classification;
}

/// Desert behaviour: hot ground acting as a reflective floor, finer steps
/// close to it, and detection of the first turning point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundClampTurningPoint {
    /// Scale height of the atmosphere's index depression.
    pub scale_height: Float,
}

impl GroundClampTurningPoint {
    /// Below `REFINED_BAND * scale_height`, steps are shortened.
    pub const REFINED_BAND: Float = 1.5;
    /// Shortest step, as a fraction of the nominal one.
    pub const MIN_STEP_RATIO: Float = 0.12;
    /// How far above the floor a clamped ray is put back.
    pub const FLOOR_OFFSET: Float = 1e-3;

    #[inline]
    #[must_use]
    pub const fn new(scale_height: Float) -> Self {
        Self { scale_height }
    }
}

impl TracePolicy for GroundClampTurningPoint {
    type Tracker = TurningPointTracker;

    #[inline]
    fn step_size(&self, y: Float, ds: Float) -> Float {
        let band = Self::REFINED_BAND * self.scale_height;
        if y < band {
            ds * (y / band).max(Self::MIN_STEP_RATIO)
        } else {
            ds
        }
    }

    #[inline]
    fn tracker(&self, start: &RayState) -> Self::Tracker {
        TurningPointTracker {
            prev_vy: start.vy(),
            turning_y: None,
            ground_contacts: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TurningPointTracker {
    prev_vy: Float,
    turning_y: Option<Float>,
    ground_contacts: usize,
}

/// Classification of a desert ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TurningPoint {
    /// The vertical direction reversed at least once: the inferior mirage signature.
    pub has_turning_point: bool,
    /// Height at the first reversal, `0.0` if there was none.
    pub turning_y: Float,
    /// Times the ray was clamped back above the ground.
    pub ground_contacts: usize,
}

impl RayTracker for TurningPointTracker {
    type Classification = TurningPoint;

    #[inline]
    fn observe(&mut self, state: &RayState) {
        let vy = state.vy();
        if self.turning_y.is_none() && self.prev_vy * vy < 0.0 {
            self.turning_y = Some(state.y());
        }
        self.prev_vy = vy;
    }

    fn at_floor(&mut self, state: &mut RayState, domain: &DomainBounds) -> FloorContact {
        trace!(x = state.x(), y = state.y(), "ray clamped at ground level");

        state.set_y(domain.y_min + GroundClampTurningPoint::FLOOR_OFFSET);
        state.set_vy(state.vy().abs());
        self.ground_contacts += 1;

        FloorContact::Clamped
    }

    #[inline]
    fn finish(self) -> Self::Classification {
        TurningPoint {
            has_turning_point: self.turning_y.is_some(),
            turning_y: self.turning_y.unwrap_or(0.0),
            ground_contacts: self.ground_contacts,
        }
    }
}

/// Ocean behaviour: the sea surface ends rays, and rays oscillating
/// in the air are reported as trapped in a duct.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceExitOscillationTrap {
    /// Fewest vertical reversals for a ray to count as trapped.
    pub min_oscillations: usize,
    /// A trapped ray never went lower than this.
    pub trap_floor: Float,
}

impl Default for SurfaceExitOscillationTrap {
    fn default() -> Self {
        Self {
            min_oscillations: 2,
            trap_floor: 0.5,
        }
    }
}

impl TracePolicy for SurfaceExitOscillationTrap {
    type Tracker = DuctTrapTracker;

    #[inline]
    fn tracker(&self, start: &RayState) -> Self::Tracker {
        DuctTrapTracker {
            policy: *self,
            prev_vy: start.vy(),
            oscillations: 0,
            min_y: start.y(),
            max_y: start.y(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DuctTrapTracker {
    policy: SurfaceExitOscillationTrap,
    prev_vy: Float,
    oscillations: usize,
    min_y: Float,
    max_y: Float,
}

/// Classification of an ocean ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DuctTrap {
    /// Oscillated enough while staying aloft: the superior mirage signature.
    pub is_trapped: bool,
    /// Number of sign changes of the vertical direction.
    pub oscillation_count: usize,
    pub min_y: Float,
    pub max_y: Float,
}

impl RayTracker for DuctTrapTracker {
    type Classification = DuctTrap;

    #[inline]
    fn observe(&mut self, state: &RayState) {
        let (y, vy) = (state.y(), state.vy());

        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);

        if self.prev_vy * vy < 0.0 {
            self.oscillations += 1;
        }
        self.prev_vy = vy;
    }

    #[inline]
    fn at_floor(&mut self, _state: &mut RayState, _domain: &DomainBounds) -> FloorContact {
        FloorContact::Absorbed
    }

    #[inline]
    fn finish(self) -> Self::Classification {
        let trapped = self.oscillations >= self.policy.min_oscillations
            && self.min_y > self.policy.trap_floor;

        DuctTrap {
            is_trapped: trapped,
            oscillation_count: self.oscillations,
            min_y: self.min_y,
            max_y: self.max_y,
        }
    }
}
