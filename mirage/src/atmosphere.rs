use std::{rc::Rc, sync::Arc};

use nalgebra::SVector;

use super::*;

/// A refractive index profile that only varies with height.
///
/// This is the trait to implement when adding a new kind of atmosphere: the ray
/// driver reads [`Atmosphere::n`] and [`Atmosphere::dn_dy`] at every integration stage.
///
/// Implementations are expected to:
///  - treat heights below ground as ground level, i.e. evaluate at `y.max(0.0)`.
///  - return from `dn_dy` the analytic derivative of `n`.
///  - be deterministic: same height, same value.
pub trait Atmosphere {
    /// Refractive index at height `y`.
    fn n(&self, y: Float) -> Float;

    /// Vertical gradient of the refractive index at height `y`.
    fn dn_dy(&self, y: Float) -> Float;

    /// Elementwise [`Self::n`].
    #[inline]
    fn n_many(&self, heights: &[Float]) -> Vec<Float> {
        heights.iter().map(|&y| self.n(y)).collect()
    }

    /// Elementwise [`Self::dn_dy`].
    #[inline]
    fn dn_dy_many(&self, heights: &[Float]) -> Vec<Float> {
        heights.iter().map(|&y| self.dn_dy(y)).collect()
    }

    /// `n_pts` heights evenly spaced over `[0, y_max]` and the index at each of them.
    fn n_profile(&self, y_max: Float, n_pts: usize) -> (Vec<Float>, Vec<Float>) {
        let heights = linspace(0.0, y_max, n_pts);
        let indices = self.n_many(&heights);
        (heights, indices)
    }
}

// One impl per smart pointer rather than a blanket impl over `Deref`,
// which would prevent downstream crates from implementing the trait for their own wrappers.

impl<T: Atmosphere + ?Sized> Atmosphere for &T {
    #[inline]
    fn n(&self, y: Float) -> Float {
        (**self).n(y)
    }

    #[inline]
    fn dn_dy(&self, y: Float) -> Float {
        (**self).dn_dy(y)
    }
}

impl<T: Atmosphere + ?Sized> Atmosphere for &mut T {
    #[inline]
    fn n(&self, y: Float) -> Float {
        (**self).n(y)
    }

    #[inline]
    fn dn_dy(&self, y: Float) -> Float {
        (**self).dn_dy(y)
    }
}

impl<T: Atmosphere + ?Sized> Atmosphere for Box<T> {
    #[inline]
    fn n(&self, y: Float) -> Float {
        self.as_ref().n(y)
    }

    #[inline]
    fn dn_dy(&self, y: Float) -> Float {
        self.as_ref().dn_dy(y)
    }
}

impl<T: Atmosphere + ?Sized> Atmosphere for Rc<T> {
    #[inline]
    fn n(&self, y: Float) -> Float {
        self.as_ref().n(y)
    }

    #[inline]
    fn dn_dy(&self, y: Float) -> Float {
        self.as_ref().dn_dy(y)
    }
}

impl<T: Atmosphere + ?Sized> Atmosphere for Arc<T> {
    #[inline]
    fn n(&self, y: Float) -> Float {
        self.as_ref().n(y)
    }

    #[inline]
    fn dn_dy(&self, y: Float) -> Float {
        self.as_ref().dn_dy(y)
    }
}

/// Right-hand side of the ray-curvature equation, with respect to arc length,
/// for `state = [x, y, vx, vy]`:
///
/// ```text
/// dx/ds  = vx
/// dy/ds  = vy
/// dvx/ds = -(vy vx / n(y)) dn/dy(y)
/// dvy/ds =  (vx²   / n(y)) dn/dy(y)
/// ```
///
/// Rays bend towards higher refractive index.
#[inline]
pub fn ray_curvature(
    atmosphere: &(impl Atmosphere + ?Sized),
    state: &SVector<Float, 4>,
) -> SVector<Float, 4> {
    let (y, vx, vy) = (state[1], state[2], state[3]);

    let g = atmosphere.dn_dy(y) / atmosphere.n(y);

    SVector::<Float, 4>::new(vx, vy, -vy * vx * g, vx * vx * g)
}

/// `n` evenly spaced values from `start` to `end`, both included.
///
/// A single value is `start`, and `n == 0` gives an empty vector.
pub fn linspace(start: Float, end: Float, n: usize) -> Vec<Float> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let last = n - 1;
            let step = (end - start) / last as Float;
            (0..n)
                .map(|i| if i == last { end } else { start + step * i as Float })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `n(y) = 1 + k * max(y, 0)`
    struct Linear {
        k: Float,
    }

    impl Atmosphere for Linear {
        fn n(&self, y: Float) -> Float {
            1.0 + self.k * y.max(0.0)
        }

        fn dn_dy(&self, _y: Float) -> Float {
            self.k
        }
    }

    #[test]
    fn test_linspace() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 5.0, 1), vec![2.0]);
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);

        let descending = linspace(0.010, -0.004, 3);
        assert_eq!(descending.len(), 3);
        assert!((descending[1] - 0.003).abs() < 1e-15);
        assert_eq!(descending[2], -0.004);
    }

    #[test]
    fn test_profile_matches_scalar() {
        let atm = Linear { k: 1e-3 };
        let (heights, indices) = atm.n_profile(50.0, 11);

        assert_eq!(heights.len(), 11);
        assert_eq!(heights[0], 0.0);
        assert_eq!(heights[10], 50.0);

        for (y, n) in heights.iter().zip(&indices) {
            assert_eq!(*n, atm.n(*y));
        }

        assert_eq!(atm.dn_dy_many(&heights), vec![1e-3; 11]);
    }

    fn index_at_three(atmosphere: impl Atmosphere) -> Float {
        atmosphere.n(3.0)
    }

    #[test]
    fn test_forwarding_impls() {
        let atm = Linear { k: 2e-4 };
        let expected = atm.n(3.0);

        let boxed: Box<dyn Atmosphere> = Box::new(Linear { k: 2e-4 });
        assert_eq!(index_at_three(boxed), expected);
        assert_eq!(index_at_three(Arc::new(Linear { k: 2e-4 })), expected);
        assert_eq!(index_at_three(Rc::new(Linear { k: 2e-4 })), expected);
        assert_eq!(index_at_three(&atm), expected);
    }

    #[test]
    fn test_curvature_of_uniform_medium_is_straight() {
        let atm = Linear { k: 0.0 };
        let state = SVector::<Float, 4>::new(0.0, 1.0, 0.6, 0.8);

        let d = ray_curvature(&atm, &state);
        assert_eq!(d, SVector::<Float, 4>::new(0.6, 0.8, 0.0, 0.0));
    }

    #[test]
    fn test_curvature_bends_towards_higher_index() {
        let atm = Linear { k: 1e-4 };
        let horizontal = SVector::<Float, 4>::new(0.0, 1.0, 1.0, 0.0);

        let d = ray_curvature(&atm, &horizontal);
        assert!(d[3] > 0.0);
        assert_eq!(d[2], 0.0);

        let falling = Linear { k: -1e-4 };
        assert!(ray_curvature(&falling, &horizontal)[3] < 0.0);
    }
}
