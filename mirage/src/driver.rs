use core::fmt;

use tracing::debug;

use super::*;

/// Step size, step budget and output decimation of a trace.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceParams {
    /// Nominal arc length of an integration step.
    pub step_size: Float,
    /// A ray still inside the domain after this many steps ends as
    /// [`Termination::MaxStepsReached`].
    pub max_steps: usize,
    /// Keep one point every `sample_every` steps. Only affects the output, not the physics.
    pub sample_every: usize,
}

impl TraceParams {
    #[inline]
    #[must_use]
    pub const fn new(step_size: Float, max_steps: usize, sample_every: usize) -> Self {
        Self {
            step_size,
            max_steps,
            sample_every,
        }
    }
}

/// How a ray stopped being traced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Termination {
    /// Left through `x_min` or `x_max`.
    ExitedSide,
    /// Went above `y_max`.
    ExitedTop,
    /// Went below `y_min` under a policy that absorbs rays there.
    Surface,
    /// Ran out of steps while still inside the domain: an unresolved ray.
    MaxStepsReached,
}

impl Termination {
    pub const ALL: [Self; 4] = [
        Self::ExitedSide,
        Self::ExitedTop,
        Self::Surface,
        Self::MaxStepsReached,
    ];

    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExitedSide => "exited_side",
            Self::ExitedTop => "exited_top",
            Self::Surface => "surface",
            Self::MaxStepsReached => "max_steps_reached",
        }
    }

    /// Whether the ray left the domain through its sides or top.
    #[inline]
    pub const fn is_exit(self) -> bool {
        matches!(self, Self::ExitedSide | Self::ExitedTop)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened during an integration step, besides moving the ray.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepEvent {
    Free,
    /// The ray went below the floor and was put back, see [`FloorContact::Clamped`].
    Clamped,
    /// The ray is done, this was the last step.
    Ended(Termination),
}

/// A completed integration step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    /// `0` for the first step after launch.
    pub index: usize,
    /// The state after the step and any boundary handling.
    pub state: RayState,
    /// Total arc length travelled so far.
    pub arc_length: Float,
    pub event: StepEvent,
}

/// The steps of a single ray, one [`Step`] per iteration.
///
/// Stops after the step that ends the ray or after the step budget is spent.
pub struct RayPath<'a, A: ?Sized, P: TracePolicy> {
    atmosphere: &'a A,
    policy: &'a P,
    domain: DomainBounds,
    step_size: Float,
    max_steps: usize,
    state: RayState,
    tracker: P::Tracker,
    arc_length: Float,
    steps: usize,
    ended: Option<Termination>,
}

impl<'a, A: Atmosphere + ?Sized, P: TracePolicy> RayPath<'a, A, P> {
    #[inline]
    pub fn new(
        atmosphere: &'a A,
        policy: &'a P,
        domain: DomainBounds,
        ray: &Ray,
        step_size: Float,
        max_steps: usize,
    ) -> Self {
        let state = RayState::from(ray);
        Self {
            atmosphere,
            policy,
            domain,
            step_size,
            max_steps,
            tracker: policy.tracker(&state),
            state,
            arc_length: 0.0,
            steps: 0,
            ended: None,
        }
    }

    #[inline]
    pub fn state(&self) -> &RayState {
        &self.state
    }

    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }

    #[inline]
    pub fn arc_length(&self) -> Float {
        self.arc_length
    }

    /// How the ray ended, `None` if it can still move.
    #[inline]
    pub fn termination(&self) -> Option<Termination> {
        self.ended.or_else(|| {
            (self.steps >= self.max_steps).then_some(Termination::MaxStepsReached)
        })
    }

    /// Stop tracing and classify the ray.
    #[inline]
    pub fn into_classification(self) -> <P::Tracker as RayTracker>::Classification {
        self.tracker.finish()
    }

    fn advance(&mut self) -> StepEvent {
        let ds = self.policy.step_size(self.state.y(), self.step_size);
        let atmosphere = self.atmosphere;

        self.state.0 = rk4_step(
            |_, s| ray_curvature(atmosphere, s),
            self.arc_length,
            &self.state.0,
            ds,
        );
        self.state.renormalize();
        self.arc_length += ds;

        self.tracker.observe(&self.state);

        let mut event = StepEvent::Free;

        if self.domain.is_below_floor(self.state.y()) {
            match self.tracker.at_floor(&mut self.state, &self.domain) {
                FloorContact::Clamped => event = StepEvent::Clamped,
                FloorContact::Absorbed => return StepEvent::Ended(Termination::Surface),
            }
        }

        self.domain
            .exit(&self.state.position())
            .map_or(event, StepEvent::Ended)
    }
}

impl<A: Atmosphere + ?Sized, P: TracePolicy> Iterator for RayPath<'_, A, P> {
    type Item = Step;

    fn next(&mut self) -> Option<Self::Item> {
        if self.termination().is_some() {
            return None;
        }

        let event = self.advance();
        if let StepEvent::Ended(termination) = event {
            self.ended = Some(termination);
        }

        let step = Step {
            index: self.steps,
            state: self.state,
            arc_length: self.arc_length,
            event,
        };
        self.steps += 1;

        Some(step)
    }
}

/// A traced ray.
#[derive(Clone, Debug, PartialEq)]
pub struct RayResult<C> {
    /// Launch point first, then every `sample_every`-th step, then the final point.
    pub points: Vec<Vector2<Float>>,
    pub termination: Termination,
    /// Height of the final state, not clamped.
    pub final_y: Float,
    pub arc_length: Float,
    /// Number of integration steps taken.
    pub steps: usize,
    pub classification: C,
}

impl<C> RayResult<C> {
    /// `false` if the ray ran out of steps without leaving the domain.
    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.termination != Termination::MaxStepsReached
    }

    #[inline]
    pub fn launch_point(&self) -> Option<&Vector2<Float>> {
        self.points.first()
    }

    #[inline]
    pub fn end_point(&self) -> Option<&Vector2<Float>> {
        self.points.last()
    }
}

/// Trace a single ray through `atmosphere` until it leaves `domain`,
/// is stopped by `policy`, or runs out of steps.
pub fn trace_ray<A, P>(
    atmosphere: &A,
    policy: &P,
    domain: &DomainBounds,
    ray: &Ray,
    params: &TraceParams,
) -> RayResult<<P::Tracker as RayTracker>::Classification>
where
    A: Atmosphere + ?Sized,
    P: TracePolicy,
{
    let sample_every = params.sample_every.max(1);

    let mut path = RayPath::new(
        atmosphere,
        policy,
        *domain,
        ray,
        params.step_size,
        params.max_steps,
    );

    let mut points = vec![ray.origin];

    for step in path.by_ref() {
        match step.event {
            StepEvent::Ended(Termination::Surface) => {
                let p = step.state.position();
                points.push(Vector2::new(p.x, p.y.max(0.0)));
            }
            StepEvent::Ended(_) => points.push(step.state.position()),
            _ if step.index % sample_every == 0 => points.push(step.state.position()),
            _ => {}
        }
    }

    let termination = path
        .termination()
        .unwrap_or(Termination::MaxStepsReached);

    let last = path.state().position();
    if termination == Termination::MaxStepsReached && points.last() != Some(&last) {
        points.push(last);
    }

    let final_y = path.state().y();
    let arc_length = path.arc_length();
    let steps = path.steps();

    debug!(%termination, steps, final_y, arc_length, "ray traced");

    RayResult {
        points,
        termination,
        final_y,
        arc_length,
        steps,
        classification: path.into_classification(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Uniform;

    impl Atmosphere for Uniform {
        fn n(&self, _y: Float) -> Float {
            1.0
        }

        fn dn_dy(&self, _y: Float) -> Float {
            0.0
        }
    }

    /// Fixed steps, never clamps, counts steps as its classification.
    struct Counting;

    struct CountingTracker(usize);

    impl TracePolicy for Counting {
        type Tracker = CountingTracker;

        fn tracker(&self, _start: &RayState) -> Self::Tracker {
            CountingTracker(0)
        }
    }

    impl RayTracker for CountingTracker {
        type Classification = usize;

        fn observe(&mut self, _state: &RayState) {
            self.0 += 1;
        }

        fn at_floor(&mut self, _state: &mut RayState, _domain: &DomainBounds) -> FloorContact {
            FloorContact::Absorbed
        }

        fn finish(self) -> usize {
            self.0
        }
    }

    const DOMAIN: DomainBounds = DomainBounds::new(0.0, 100.0, 0.0, 50.0);

    #[test]
    fn test_straight_ray_exits_side() {
        let ray = Ray::from_angle([0.0, 10.0], 0.0);
        let result = trace_ray(&Uniform, &Counting, &DOMAIN, &ray, &TraceParams::new(1.0, 1000, 10));

        assert_eq!(result.termination, Termination::ExitedSide);
        assert_eq!(result.steps, 101);
        assert_eq!(result.classification, 101);
        assert!((result.arc_length - 101.0).abs() < 1e-9);
        assert_eq!(result.final_y, 10.0);

        // launch, steps 0, 10, ..., 90, then the exit at step 100
        assert_eq!(result.points.len(), 1 + 10 + 1);
        assert_eq!(result.points[0], Vector2::new(0.0, 10.0));
        assert_eq!(result.points[1], Vector2::new(1.0, 10.0));
        assert!((result.end_point().unwrap().x - 101.0).abs() < 1e-9);
    }

    #[test]
    fn test_straight_ray_exits_top() {
        let ray = Ray::from_angle([10.0, 10.0], core::f64::consts::FRAC_PI_2);
        let result = trace_ray(&Uniform, &Counting, &DOMAIN, &ray, &TraceParams::new(1.0, 1000, 1));

        assert_eq!(result.termination, Termination::ExitedTop);
        assert!(result.final_y > 50.0);
        assert_eq!(result.steps, 41);
        assert_eq!(result.points.len(), 1 + 41);
    }

    #[test]
    fn test_surface_exit_clamps_reported_height() {
        let ray = Ray::from_angle([0.0, 0.5], -core::f64::consts::FRAC_PI_4);
        let result = trace_ray(&Uniform, &Counting, &DOMAIN, &ray, &TraceParams::new(1.0, 1000, 50));

        assert_eq!(result.termination, Termination::Surface);
        assert!(result.final_y < 0.0);
        assert_eq!(result.end_point().unwrap().y, 0.0);
        assert_eq!(result.steps, 1);
        assert_eq!(result.points.len(), 2);
    }

    #[test]
    fn test_step_budget_appends_final_point() {
        let ray = Ray::from_angle([0.0, 10.0], 0.0);
        let result = trace_ray(&Uniform, &Counting, &DOMAIN, &ray, &TraceParams::new(1.0, 25, 10));

        assert_eq!(result.termination, Termination::MaxStepsReached);
        assert!(!result.is_resolved());
        assert_eq!(result.steps, 25);

        // launch, steps 0, 10, 20, then the last state (step 24)
        let xs: Vec<_> = result.points.iter().map(|p| p.x.round()).collect();
        assert_eq!(xs, vec![0.0, 1.0, 11.0, 21.0, 25.0]);
    }

    #[test]
    fn test_final_point_is_not_duplicated() {
        let ray = Ray::from_angle([0.0, 10.0], 0.0);
        let result = trace_ray(&Uniform, &Counting, &DOMAIN, &ray, &TraceParams::new(1.0, 21, 10));

        let xs: Vec<_> = result.points.iter().map(|p| p.x.round()).collect();
        assert_eq!(xs, vec![0.0, 1.0, 11.0, 21.0]);
    }

    #[test]
    fn test_no_steps() {
        let ray = Ray::from_angle([3.0, 4.0], 0.0);
        let result = trace_ray(&Uniform, &Counting, &DOMAIN, &ray, &TraceParams::new(1.0, 0, 1));

        assert_eq!(result.termination, Termination::MaxStepsReached);
        assert_eq!(result.points, vec![Vector2::new(3.0, 4.0)]);
        assert_eq!(result.final_y, 4.0);
        assert_eq!(result.classification, 0);
    }

    #[test]
    fn test_zero_decimation_records_every_step() {
        let ray = Ray::from_angle([0.0, 10.0], 0.0);
        let result = trace_ray(&Uniform, &Counting, &DOMAIN, &ray, &TraceParams::new(1.0, 5, 0));

        assert_eq!(result.points.len(), 6);
    }

    #[test]
    fn test_path_is_fused_after_termination() {
        let ray = Ray::from_angle([99.5, 10.0], 0.0);
        let mut path = RayPath::new(&Uniform, &Counting, DOMAIN, &ray, 1.0, 100);

        let step = path.next().unwrap();
        assert_eq!(step.event, StepEvent::Ended(Termination::ExitedSide));
        assert_eq!(path.termination(), Some(Termination::ExitedSide));
        assert!(path.next().is_none());
        assert_eq!(path.steps(), 1);
    }

    #[test]
    fn test_unit_speed_is_kept() {
        struct Steep;

        impl Atmosphere for Steep {
            fn n(&self, y: Float) -> Float {
                1.0 + 1e-2 * y.max(0.0)
            }

            fn dn_dy(&self, _y: Float) -> Float {
                1e-2
            }
        }

        let ray = Ray::from_angle([0.0, 10.0], -0.2);
        let path = RayPath::new(&Steep, &Counting, DOMAIN, &ray, 0.5, 400);

        for step in path {
            let speed = step.state.speed();
            assert!((speed - 1.0).abs() <= 1e-9, "speed drifted to {speed}");
        }
    }
}
