//! Interpolation helpers.

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Cubic ease-in-out on `t` in [0, 1].
#[inline]
pub fn cubic_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        assert_eq!(cubic_in_out(0.0), 0.0);
        assert_eq!(cubic_in_out(1.0), 1.0);
        assert!((cubic_in_out(0.5) - 0.5).abs() < 1e-6);
        assert_eq!(cubic_in_out(2.0), 1.0);
    }

    #[test]
    fn test_monotonic() {
        let mut previous = 0.0;
        for step in 1..=100 {
            let value = cubic_in_out(step as f32 / 100.0);
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(10.0, 20.0, 0.25), 12.5);
    }
}
