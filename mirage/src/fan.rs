use tracing::debug;

use super::*;

/// Where the object and the observer stand, and how many display rays to trace.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scene {
    /// Downrange position of the object.
    pub object_x: Float,
    pub object_height: Float,
    pub observer_x: Float,
    pub observer_height: Float,
    pub ray_count: usize,
}

/// How a fan of display rays is laid out from a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FanLayout {
    /// Sources spread over the object's height, each aimed at the observer.
    ///
    /// Sources go from `floor` to the top of the object, and each heading is
    /// tilted by `spread * (t - 1/2)`, `t` being the source's relative height,
    /// so the bundle stays visibly fanned.
    Aimed { floor: Float, spread: Float },
    /// A single source at `height_fraction` of the object's height, headings
    /// evenly spaced from `min_angle` to `max_angle`, regardless of the observer.
    Angular {
        height_fraction: Float,
        min_angle: Float,
        max_angle: Float,
    },
}

impl FanLayout {
    /// The desert display fan.
    pub const AIMED: Self = Self::Aimed {
        floor: 0.3,
        spread: 0.012,
    };

    /// The ocean display fan.
    pub const ANGULAR: Self = Self::Angular {
        height_fraction: 0.8,
        min_angle: -0.004,
        max_angle: 0.010,
    };

    /// The launches of the fan, in order.
    pub fn launches(&self, scene: &Scene) -> Vec<Ray> {
        let k = scene.ray_count;

        match *self {
            Self::Aimed { floor, spread } => {
                let dx = scene.observer_x - scene.object_x;

                (0..k)
                    .map(|i| {
                        let t = if k > 1 {
                            i as Float / (k - 1) as Float
                        } else {
                            0.5
                        };
                        let src_y = floor + t * (scene.object_height - floor);
                        let dy = scene.observer_height - src_y;
                        let angle = dy.atan2(dx) + spread * (t - 0.5);

                        Ray::from_angle([scene.object_x, src_y], angle)
                    })
                    .collect()
            }
            Self::Angular {
                height_fraction,
                min_angle,
                max_angle,
            } => {
                let origin = [scene.object_x, scene.object_height * height_fraction];

                linspace(min_angle, max_angle, k)
                    .into_iter()
                    .map(|angle| Ray::from_angle(origin, angle))
                    .collect()
            }
        }
    }
}

/// Trace every launch of `layout` for `scene`, results in launch order.
pub fn trace_fan<A, P>(
    atmosphere: &A,
    policy: &P,
    domain: &DomainBounds,
    params: &TraceParams,
    scene: &Scene,
    layout: &FanLayout,
) -> Vec<RayResult<<P::Tracker as RayTracker>::Classification>>
where
    A: Atmosphere + ?Sized,
    P: TracePolicy,
{
    let results: Vec<_> = layout
        .launches(scene)
        .iter()
        .map(|ray| trace_ray(atmosphere, policy, domain, ray, params))
        .collect();

    log_fan(&results);

    results
}

/// Like [`trace_fan`], with the rays traced in parallel.
///
/// Produces exactly the same, identically ordered, results.
#[cfg(feature = "rayon")]
pub fn par_trace_fan<A, P>(
    atmosphere: &A,
    policy: &P,
    domain: &DomainBounds,
    params: &TraceParams,
    scene: &Scene,
    layout: &FanLayout,
) -> Vec<RayResult<<P::Tracker as RayTracker>::Classification>>
where
    A: Atmosphere + Sync + ?Sized,
    P: TracePolicy + Sync,
    <P::Tracker as RayTracker>::Classification: Send,
{
    use rayon::prelude::*;

    let results: Vec<_> = layout
        .launches(scene)
        .par_iter()
        .map(|ray| trace_ray(atmosphere, policy, domain, ray, params))
        .collect();

    log_fan(&results);

    results
}

fn log_fan<C>(results: &[RayResult<C>]) {
    let unresolved = results.iter().filter(|r| !r.is_resolved()).count();
    debug!(rays = results.len(), unresolved, "display fan traced");
}
