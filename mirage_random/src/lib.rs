use mirage::*;
use mirage_atmospheres::*;

use core::iter;
pub use rand;

pub trait Random: Sized {
    /// Generate a randomized version of this value using the provided `rng`
    ///
    /// Values are drawn from the ranges the interactive controls allow, so
    /// they always pass validation.
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self;
}

/// Simulations having a random scene to go with them.
pub trait RandomScene {
    fn random_scene(rng: &mut (impl rand::Rng + ?Sized)) -> Scene;
}

impl Random for DesertAtmosphere {
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        Self {
            delta_n: rng.gen_range(5e-5..=6e-4),
            scale_height: rng.gen_range(0.5..=10.0),
            ground_temp: rng.gen_range(10.0..=90.0),
            air_temp: rng.gen_range(0.0..=45.0),
            ..Default::default()
        }
    }
}

impl Random for OceanAtmosphere {
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        Self {
            a: rng.gen_range(3e-5..=3e-4),
            b: rng.gen_range(1e-5..=1.5e-4),
            h1: rng.gen_range(3.0..=50.0),
            h2: rng.gen_range(15.0..=120.0),
            ducting_enabled: rng.gen_bool(0.8),
            ..Default::default()
        }
    }
}

impl Random for DesertMirage {
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        Self::new(DesertAtmosphere::random(rng))
    }
}

impl Random for OceanMirage {
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        Self::new(OceanAtmosphere::random(rng))
    }
}

impl RandomScene for DesertMirage {
    fn random_scene(rng: &mut (impl rand::Rng + ?Sized)) -> Scene {
        Scene {
            object_x: rng.gen_range(200.0..=2800.0),
            object_height: rng.gen_range(5.0..=60.0),
            observer_x: 0.0,
            observer_height: rng.gen_range(0.5..=20.0),
            ray_count: rng.gen_range(1..=30),
        }
    }
}

impl RandomScene for OceanMirage {
    fn random_scene(rng: &mut (impl rand::Rng + ?Sized)) -> Scene {
        Scene {
            object_x: rng.gen_range(2.0..=35.0) * 1000.0,
            object_height: rng.gen_range(5.0..=50.0),
            observer_x: 0.0,
            observer_height: rng.gen_range(2.0..=40.0),
            ray_count: rng.gen_range(1..=25),
        }
    }
}

/// A ray launched from the left edge of `domain`, in its lower quarter,
/// heading at most `max_angle` radians away from the horizontal.
pub fn random_launch(
    rng: &mut (impl rand::Rng + ?Sized),
    domain: &DomainBounds,
    max_angle: Float,
) -> Ray {
    let y = domain.y_min + rng.gen::<Float>() * domain.height() * 0.25;
    let angle = (rng.gen::<Float>() - 0.5) * (max_angle.abs() * 2.0);

    Ray::from_angle([domain.x_min, y], angle)
}

pub fn random_simulation<M: Random + RandomScene>(
    rng: &mut (impl rand::Rng + ?Sized),
) -> (M, Scene) {
    (M::random(rng), M::random_scene(rng))
}

pub fn random_launches(
    n: usize,
    rng: &mut (impl rand::Rng + ?Sized),
    domain: &DomainBounds,
    max_angle: Float,
) -> Vec<Ray> {
    iter::repeat_with(|| random_launch(rng, domain, max_angle))
        .take(n)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_random_simulations_are_valid() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let (desert, scene) = random_simulation::<DesertMirage>(&mut rng);
            assert!(desert.validate().is_ok());
            assert!(scene.validate().is_ok());
            assert!((1..=30).contains(&scene.ray_count));

            let (ocean, scene) = random_simulation::<OceanMirage>(&mut rng);
            assert!(ocean.validate().is_ok());
            assert!(scene.validate().is_ok());
            assert!((2000.0..=35000.0).contains(&scene.object_x));
        }
    }

    #[test]
    fn test_same_seed_same_simulation() {
        let a = random_simulation::<OceanMirage>(&mut StdRng::seed_from_u64(42));
        let b = random_simulation::<OceanMirage>(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_launches_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let domain = DesertMirage::DOMAIN;

        let rays = random_launches(50, &mut rng, &domain, 0.05);

        assert_eq!(rays.len(), 50);
        for ray in &rays {
            assert_eq!(ray.origin.x, 0.0);
            assert!((0.0..=50.0).contains(&ray.origin.y));
            assert!(ray.angle().abs() <= 0.05 + 1e-12);
        }
    }
}
