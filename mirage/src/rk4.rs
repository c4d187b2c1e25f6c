use super::*;

/// Advance `state` by one classical 4-stage Runge-Kutta step of size `ds`.
///
/// `f(s, state)` returns the derivative of the state at the independent variable `s`.
/// The four stages are evaluated at `s`, `s + ds/2` (twice) and `s + ds`, each on
/// a trial state displaced along the previous stage, and combined as
/// `state + ds/6 (k1 + 2 k2 + 2 k3 + k4)`.
#[inline]
#[must_use]
pub fn rk4_step<const N: usize>(
    mut f: impl FnMut(Float, &SVector<Float, N>) -> SVector<Float, N>,
    s: Float,
    state: &SVector<Float, N>,
    ds: Float,
) -> SVector<Float, N> {
    let half = 0.5 * ds;

    let k1 = f(s, state);
    let k2 = f(s + half, &(state + k1 * half));
    let k3 = f(s + half, &(state + k2 * half));
    let k4 = f(s + ds, &(state + k3 * ds));

    state + (k1 + (k2 + k3) * 2.0 + k4) * (ds / 6.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_decay() {
        let mut y = SVector::<Float, 1>::new(1.0);
        let mut s = 0.0;

        for _ in 0..10 {
            y = rk4_step(|_, y| -y, s, &y, 0.1);
            s += 0.1;
        }

        assert!((y[0] - (-1.0 as Float).exp()).abs() < 1e-6);
    }

    #[test]
    fn test_uses_independent_variable() {
        // y' = 2s, y(0) = 0, is integrated exactly by RK4
        let mut y = SVector::<Float, 1>::zeros();
        let mut s = 0.0;

        for _ in 0..4 {
            y = rk4_step(|s, _| SVector::<Float, 1>::new(2.0 * s), s, &y, 0.5);
            s += 0.5;
        }

        assert!((y[0] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_harmonic_oscillator_keeps_energy() {
        // x'' = -x, one full period
        let steps = 1000;
        let ds = core::f64::consts::TAU / steps as Float;

        let mut state = SVector::<Float, 2>::new(1.0, 0.0);
        for i in 0..steps {
            state = rk4_step(
                |_, v| SVector::<Float, 2>::new(v[1], -v[0]),
                i as Float * ds,
                &state,
                ds,
            );
        }

        assert!((state[0] - 1.0).abs() < 1e-9);
        assert!(state[1].abs() < 1e-9);
    }

    #[test]
    fn test_straight_ray_in_uniform_medium() {
        struct Uniform;

        impl Atmosphere for Uniform {
            fn n(&self, _y: Float) -> Float {
                1.000293
            }

            fn dn_dy(&self, _y: Float) -> Float {
                0.0
            }
        }

        let (sin, cos) = 0.2f64.sin_cos();
        let state = SVector::<Float, 4>::new(0.0, 1.0, cos, sin);

        let next = rk4_step(|_, s| ray_curvature(&Uniform, s), 0.0, &state, 2.0);

        assert!((next[0] - 2.0 * cos).abs() < 1e-15);
        assert!((next[1] - (1.0 + 2.0 * sin)).abs() < 1e-15);
        assert_eq!((next[2], next[3]), (cos, sin));
    }
}
