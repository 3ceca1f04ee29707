//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Limit `value` to the closed range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float
{
    value.max(min).min(max)
}

/// Wrap an angle into the range (-pi, pi].
pub fn wrap_pi<T>(value: T) -> T
where
    T: Float
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap_or_else(T::zero);
    let tau_t: T = pi_t + pi_t;

    // Map into [0, 2pi) first, then shift the upper half down
    let mut r = value % tau_t;
    if r < T::zero() {
        r = r + tau_t;
    }

    if r > pi_t {
        r - tau_t
    }
    else {
        r
    }
}

/// Squared distance between two points in the horizontal (x, z) plane.
pub fn planar_dist_sq<T>(a: (T, T), b: (T, T)) -> T
where
    T: Float
{
    (b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;

    #[test]
    fn test_wrap_pi() {
        assert!((wrap_pi(0f64)).abs() < 1e-12);
        assert!((wrap_pi(PI) - PI).abs() < 1e-12);
        assert!((wrap_pi(-PI) - PI).abs() < 1e-12);
        assert!((wrap_pi(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((wrap_pi(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-12);
        assert!((wrap_pi(-0.25) + 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(1.2f64, -1.0, 1.0), 1.0);
        assert_eq!(clamp(-1.0000001f64, -1.0, 1.0), -1.0);
        assert_eq!(clamp(0.5f64, -1.0, 1.0), 0.5);
    }

    #[test]
    fn test_planar_dist_sq() {
        assert_eq!(planar_dist_sq((0f64, 0f64), (3f64, 4f64)), 25.0);
        assert_eq!(planar_dist_sq((1f64, 1f64), (1f64, 1f64)), 0.0);
    }
}
