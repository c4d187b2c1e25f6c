use tracing::info;

use super::*;

/// Air over a cold sea under a temperature inversion,
///
/// `n(y) = n_base + a * exp(-y / h1) - b * exp(-y / h2)`.
///
/// With ducting disabled, a plain standard-atmosphere decay is used instead:
/// `n(y) = n_base - 3e-5 * (1 - exp(-y / 8000))`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OceanAtmosphere {
    /// Refractive index of the reference air.
    pub n_base: Float,
    /// Strength of the inversion term.
    pub a: Float,
    /// Strength of the counter term.
    pub b: Float,
    /// Height scale of the inversion term, in meters.
    pub h1: Float,
    /// Height scale of the counter term, in meters.
    pub h2: Float,
    /// Sea temperature, °C. Informative only, not used by the profile.
    pub sea_temp: Float,
    /// Air temperature, °C. Informative only, not used by the profile.
    pub air_temp: Float,
    pub ducting_enabled: bool,
}

impl Default for OceanAtmosphere {
    fn default() -> Self {
        Self {
            n_base: 1.000293,
            a: 1.2e-4,
            b: 4.0e-5,
            h1: 12.0,
            h2: 40.0,
            sea_temp: 10.0,
            air_temp: 25.0,
            ducting_enabled: true,
        }
    }
}

impl OceanAtmosphere {
    /// Total index drop of the standard atmosphere used without ducting.
    pub const STANDARD_DROP: Float = 3e-5;
    /// Height scale of the standard atmosphere used without ducting, in meters.
    pub const STANDARD_SCALE: Float = 8000.0;

    /// The height where `dn_dy` vanishes, in closed form:
    ///
    /// `y* = h1 h2 / (h2 - h1) * ln(a h2 / (b h1))`.
    ///
    /// Returns `-1.0` if ducting is disabled, if there is no such height above
    /// the sea, or if `h1` and `h2` are too close for it to be computed.
    pub fn duct_height(&self) -> Float {
        if !self.ducting_enabled {
            return -1.0;
        }

        let ratio = (self.a * self.h2) / (self.b * self.h1 + 1e-30);
        if ratio <= 0.0 {
            return -1.0;
        }

        let dh = self.h2 - self.h1;
        if dh.abs() < 1e-6 {
            return -1.0;
        }

        let y_star = (self.h1 * self.h2 / dh) * ratio.ln();
        if y_star > 0.0 {
            y_star
        } else {
            -1.0
        }
    }

    /// The trace policy matching this atmosphere.
    #[inline]
    pub fn policy(&self) -> SurfaceExitOscillationTrap {
        SurfaceExitOscillationTrap::default()
    }
}

impl Atmosphere for OceanAtmosphere {
    #[inline]
    fn n(&self, y: Float) -> Float {
        let y = y.max(0.0);

        if !self.ducting_enabled {
            return self.n_base - Self::STANDARD_DROP * (1.0 - (-y / Self::STANDARD_SCALE).exp());
        }

        self.n_base + self.a * (-y / self.h1).exp() - self.b * (-y / self.h2).exp()
    }

    #[inline]
    fn dn_dy(&self, y: Float) -> Float {
        let y = y.max(0.0);

        if !self.ducting_enabled {
            return -Self::STANDARD_DROP / Self::STANDARD_SCALE * (-y / Self::STANDARD_SCALE).exp();
        }

        -(self.a / self.h1) * (-y / self.h1).exp() + (self.b / self.h2) * (-y / self.h2).exp()
    }
}

impl Validate for OceanAtmosphere {
    fn validate(&self) -> Result<(), ParameterError> {
        positive("n_base", self.n_base)?;
        non_negative("a", self.a)?;
        non_negative("b", self.b)?;
        positive("h1", self.h1)?;
        positive("h2", self.h2)?;
        finite("sea_temp", self.sea_temp)?;
        finite("air_temp", self.air_temp)?;
        Ok(())
    }
}

/// An ocean atmosphere with everything needed to trace through it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OceanMirage {
    pub atmosphere: OceanAtmosphere,
    /// Domain for [`Self::trace_ray`], display rays get one fitted to their scene.
    pub domain: DomainBounds,
    /// Settings for [`Self::trace_ray`].
    pub trace: TraceParams,
    /// Settings for [`Self::trace_display_rays`].
    pub display: TraceParams,
}

impl Default for OceanMirage {
    fn default() -> Self {
        Self::new(OceanAtmosphere::default())
    }
}

impl OceanMirage {
    pub const DOMAIN: DomainBounds = DomainBounds::new(0.0, 50000.0, 0.0, 500.0);
    pub const TRACE: TraceParams = TraceParams::new(5.0, 15000, 20);
    pub const DISPLAY: TraceParams = TraceParams::new(10.0, 15000, 30);

    /// Height of the top of the display domain.
    pub const DISPLAY_CEILING: Float = 300.0;

    /// The scene shown when nothing else is specified.
    pub const SCENE: Scene = Scene {
        object_x: 15000.0,
        object_height: 25.0,
        observer_x: 0.0,
        observer_height: 15.0,
        ray_count: 10,
    };

    #[inline]
    #[must_use]
    pub const fn new(atmosphere: OceanAtmosphere) -> Self {
        Self {
            atmosphere,
            domain: Self::DOMAIN,
            trace: Self::TRACE,
            display: Self::DISPLAY,
        }
    }

    /// The domain display rays are traced in: 20% past the farthest of
    /// the object and the observer, plus a kilometer.
    pub fn display_domain(scene: &Scene) -> DomainBounds {
        let x_max = scene.object_x.max(scene.observer_x) * 1.2 + 1000.0;
        DomainBounds::new(0.0, x_max, 0.0, Self::DISPLAY_CEILING)
    }

    pub fn trace_ray(&self, ray: &Ray) -> RayResult<DuctTrap> {
        mirage::trace_ray(
            &self.atmosphere,
            &self.atmosphere.policy(),
            &self.domain,
            ray,
            &self.trace,
        )
    }

    /// A fan of near-horizontal rays from just below the top of the object.
    pub fn trace_display_rays(&self, scene: &Scene) -> Vec<RayResult<DuctTrap>> {
        let results = trace_fan(
            &self.atmosphere,
            &self.atmosphere.policy(),
            &Self::display_domain(scene),
            &self.display,
            scene,
            &FanLayout::ANGULAR,
        );

        let trapped = results
            .iter()
            .filter(|r| r.classification.is_trapped)
            .count();
        info!(
            rays = results.len(),
            trapped,
            duct_height = self.atmosphere.duct_height(),
            "ocean display rays traced"
        );

        results
    }
}

impl Validate for OceanMirage {
    fn validate(&self) -> Result<(), ParameterError> {
        self.atmosphere.validate()?;
        self.domain.validate()?;
        self.trace.validate()?;
        self.display.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_matches_finite_difference(atm: &OceanAtmosphere) {
        let h = 1e-3;

        for y in [0.01, 0.5, 2.0, 8.0, 12.0, 25.0, 39.0, 60.0, 150.0, 400.0, 5000.0] {
            let numeric = (atm.n(y + h) - atm.n(y - h)) / (2.0 * h);
            let analytic = atm.dn_dy(y);
            // absolute floor for heights where the gradient crosses zero
            let tolerance = (1e-6 * analytic.abs()).max(1e-13);
            assert!(
                (numeric - analytic).abs() <= tolerance,
                "y = {y}: {numeric} vs {analytic}"
            );
        }
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        // n_base only offsets the curve, leaving it out keeps roundoff out of the difference
        let atm = OceanAtmosphere {
            n_base: 0.0,
            ..Default::default()
        };
        assert_matches_finite_difference(&atm);

        assert_matches_finite_difference(&OceanAtmosphere {
            h1: 40.0,
            h2: 12.0,
            b: 6e-5,
            ..atm
        });

        assert_matches_finite_difference(&OceanAtmosphere {
            ducting_enabled: false,
            ..atm
        });
    }

    #[test]
    fn test_below_sea_reads_sea_level() {
        let atm = OceanAtmosphere::default();
        assert_eq!(atm.n(-3.0), atm.n(0.0));
        assert_eq!(atm.dn_dy(-3.0), atm.dn_dy(0.0));
    }

    #[test]
    fn test_sea_level_index() {
        let atm = OceanAtmosphere::default();
        assert!((atm.n(0.0) - (1.000293 + 1.2e-4 - 4e-5)).abs() < 1e-15);
    }

    #[test]
    fn test_standard_atmosphere_without_ducting() {
        let atm = OceanAtmosphere {
            ducting_enabled: false,
            ..Default::default()
        };

        assert_eq!(atm.n(0.0), atm.n_base);
        assert!(atm.n(100.0) < atm.n(10.0));
        assert!(atm.dn_dy(50.0) < 0.0);
    }

    #[test]
    fn test_duct_height() {
        let atm = OceanAtmosphere::default();
        let y = atm.duct_height();

        // (12 * 40 / 28) * ln(10)
        assert!(y.is_finite() && y > 0.0);
        assert!((y - 480.0 / 28.0 * (10.0 as Float).ln()).abs() < 1e-9);
        assert!(atm.dn_dy(y).abs() < 1e-15);
    }

    #[test]
    fn test_duct_height_sentinels() {
        let atm = OceanAtmosphere::default();

        let disabled = OceanAtmosphere {
            ducting_enabled: false,
            ..atm
        };
        assert_eq!(disabled.duct_height(), -1.0);

        let no_inversion = OceanAtmosphere { a: 0.0, ..atm };
        assert_eq!(no_inversion.duct_height(), -1.0);

        let degenerate = OceanAtmosphere {
            h1: 20.0,
            h2: 20.0,
            ..atm
        };
        assert_eq!(degenerate.duct_height(), -1.0);

        // a h2 < b h1 with h1 < h2: the zero would be below the sea
        let underwater = OceanAtmosphere {
            a: 1e-5,
            b: 1e-4,
            ..atm
        };
        assert_eq!(underwater.duct_height(), -1.0);
    }

    #[test]
    fn test_display_domain() {
        let domain = OceanMirage::display_domain(&OceanMirage::SCENE);
        assert_eq!(domain, DomainBounds::new(0.0, 19000.0, 0.0, 300.0));

        let behind = Scene {
            observer_x: 20000.0,
            ..OceanMirage::SCENE
        };
        assert_eq!(OceanMirage::display_domain(&behind).x_max, 25000.0);
    }

    #[test]
    fn test_validation() {
        assert!(OceanMirage::default().validate().is_ok());

        let negative = OceanAtmosphere {
            b: -1e-5,
            ..Default::default()
        };
        assert!(matches!(
            negative.validate(),
            Err(ParameterError::Negative { name: "b", .. })
        ));
    }
}
