use tracing::info;

use super::*;

/// Air over hot ground: the index is depressed near the surface and recovers
/// exponentially with height,
///
/// `n(y) = n_base - delta_n * exp(-y / scale_height)`.
///
/// Rays bend upwards, away from the ground, producing inferior mirages.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DesertAtmosphere {
    /// Refractive index far from the ground.
    pub n_base: Float,
    /// Index depression at ground level.
    pub delta_n: Float,
    /// Height over which the depression decays, in meters.
    pub scale_height: Float,
    /// Ground temperature, °C. Informative only, not used by the profile.
    pub ground_temp: Float,
    /// Air temperature, °C. Informative only, not used by the profile.
    pub air_temp: Float,
}

impl Default for DesertAtmosphere {
    fn default() -> Self {
        Self {
            n_base: 1.000293,
            delta_n: 2.4e-4,
            scale_height: 3.0,
            ground_temp: 65.0,
            air_temp: 28.0,
        }
    }
}

impl DesertAtmosphere {
    /// The trace policy matching this atmosphere.
    #[inline]
    pub fn policy(&self) -> GroundClampTurningPoint {
        GroundClampTurningPoint::new(self.scale_height)
    }
}

impl Atmosphere for DesertAtmosphere {
    #[inline]
    fn n(&self, y: Float) -> Float {
        let y = y.max(0.0);
        self.n_base - self.delta_n * (-y / self.scale_height).exp()
    }

    #[inline]
    fn dn_dy(&self, y: Float) -> Float {
        let y = y.max(0.0);
        (self.delta_n / self.scale_height) * (-y / self.scale_height).exp()
    }
}

impl Validate for DesertAtmosphere {
    fn validate(&self) -> Result<(), ParameterError> {
        positive("n_base", self.n_base)?;
        non_negative("delta_n", self.delta_n)?;
        positive("scale_height", self.scale_height)?;
        finite("ground_temp", self.ground_temp)?;
        finite("air_temp", self.air_temp)?;
        Ok(())
    }
}

/// A desert atmosphere with everything needed to trace through it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DesertMirage {
    pub atmosphere: DesertAtmosphere,
    pub domain: DomainBounds,
    /// Settings for [`Self::trace_ray`].
    pub trace: TraceParams,
    /// Settings for [`Self::trace_display_rays`].
    pub display: TraceParams,
}

impl Default for DesertMirage {
    fn default() -> Self {
        Self::new(DesertAtmosphere::default())
    }
}

impl DesertMirage {
    pub const DOMAIN: DomainBounds = DomainBounds::new(0.0, 3000.0, 0.0, 200.0);
    pub const TRACE: TraceParams = TraceParams::new(1.0, 12000, 8);

    /// The scene shown when nothing else is specified.
    pub const SCENE: Scene = Scene {
        object_x: 1800.0,
        object_height: 35.0,
        observer_x: 0.0,
        observer_height: 4.0,
        ray_count: 12,
    };

    #[inline]
    #[must_use]
    pub const fn new(atmosphere: DesertAtmosphere) -> Self {
        Self {
            atmosphere,
            domain: Self::DOMAIN,
            trace: Self::TRACE,
            display: Self::TRACE,
        }
    }

    pub fn trace_ray(&self, ray: &Ray) -> RayResult<TurningPoint> {
        mirage::trace_ray(
            &self.atmosphere,
            &self.atmosphere.policy(),
            &self.domain,
            ray,
            &self.trace,
        )
    }

    /// Rays from the object towards the observer, one per source height.
    pub fn trace_display_rays(&self, scene: &Scene) -> Vec<RayResult<TurningPoint>> {
        let results = trace_fan(
            &self.atmosphere,
            &self.atmosphere.policy(),
            &self.domain,
            &self.display,
            scene,
            &FanLayout::AIMED,
        );

        let turning = results
            .iter()
            .filter(|r| r.classification.has_turning_point)
            .count();
        info!(rays = results.len(), turning, "desert display rays traced");

        results
    }
}

impl Validate for DesertMirage {
    fn validate(&self) -> Result<(), ParameterError> {
        self.atmosphere.validate()?;
        self.domain.validate()?;
        self.trace.validate()?;
        self.display.validate()
    }
}
