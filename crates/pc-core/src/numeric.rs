use crate::PcError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, PcError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(PcError::NonFinite { what, value: v })
    }
}

/// Clamp a physically non-negative quantity at zero.
///
/// Negative values (typically round-off from a subtraction of nearly equal
/// terms) are replaced by zero and reported through `tracing` as a numerical
/// instability warning. NaN is passed through untouched; guard it with
/// [`ensure_finite`].
pub fn clamp_non_negative(v: Real, what: &'static str) -> Real {
    if v < 0.0 {
        tracing::warn!(quantity = what, value = v, "numerical instability: clamped to zero");
        0.0
    } else {
        v
    }
}

/// Relative closure residual of a balance `net = sum(components)`.
///
/// Scaled by the sum of absolute component magnitudes (floored at 1) so that
/// cancelling terms do not blow the ratio up.
pub fn closure_residual(net: Real, components: &[Real]) -> Real {
    let sum: Real = components.iter().sum();
    let scale: Real = components.iter().map(|c| c.abs()).sum::<Real>().max(1.0);
    (net - sum).abs() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn clamp_non_negative_zeroes_round_off() {
        assert_eq!(clamp_non_negative(-1e-18, "conc"), 0.0);
        assert_eq!(clamp_non_negative(2.5, "conc"), 2.5);
        assert!(clamp_non_negative(Real::NAN, "conc").is_nan());
    }

    #[test]
    fn closure_residual_of_exact_sum_is_zero() {
        let parts = [120.0, -30.5, 7.25];
        let net: Real = parts.iter().sum();
        assert_eq!(closure_residual(net, &parts), 0.0);
        assert!(closure_residual(net + 1.0, &parts) > 1e-3);
    }
}
