//! Bracketed scalar root finding.

use crate::{PcError, PcResult};

/// Iteration limits for [`bisect`].
#[derive(Clone, Copy, Debug)]
pub struct RootOptions {
    pub max_iter: usize,
    /// Absolute tolerance on the bracket width.
    pub x_tol: f64,
    /// Absolute tolerance on |f(x)|.
    pub f_tol: f64,
}

impl Default for RootOptions {
    fn default() -> Self {
        Self {
            max_iter: 100,
            x_tol: 1e-12,
            f_tol: 1e-12,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootSolution {
    pub root: f64,
    pub residual: f64,
    pub iterations: usize,
}

/// Find a root of `f` in `[lo, hi]` by bisection.
///
/// `f(lo)` and `f(hi)` must have opposite signs (or one of them must be zero).
/// Fails with [`PcError::NoConvergence`] carrying the last residual when the
/// iteration budget runs out before either tolerance is met.
pub fn bisect<F>(
    mut f: F,
    lo: f64,
    hi: f64,
    opts: RootOptions,
    what: &'static str,
) -> PcResult<RootSolution>
where
    F: FnMut(f64) -> f64,
{
    if !(lo.is_finite() && hi.is_finite()) || lo >= hi {
        return Err(PcError::InvalidArg {
            what: "bisect bracket must be finite with lo < hi",
        });
    }

    let (mut a, mut b) = (lo, hi);
    let mut fa = f(a);
    let fb = f(b);
    if !(fa.is_finite() && fb.is_finite()) {
        return Err(PcError::NonFinite {
            what,
            value: if fa.is_finite() { fb } else { fa },
        });
    }
    if fa == 0.0 {
        return Ok(RootSolution { root: a, residual: 0.0, iterations: 0 });
    }
    if fb == 0.0 {
        return Ok(RootSolution { root: b, residual: 0.0, iterations: 0 });
    }
    if fa.signum() == fb.signum() {
        return Err(PcError::NotBracketed { what, f_lo: fa, f_hi: fb });
    }

    let mut last_residual = fa.abs().min(fb.abs());
    for iter in 1..=opts.max_iter {
        let mid = 0.5 * (a + b);
        let fm = f(mid);
        if !fm.is_finite() {
            return Err(PcError::NonFinite { what, value: fm });
        }
        if fm.abs() <= opts.f_tol || 0.5 * (b - a) <= opts.x_tol {
            return Ok(RootSolution {
                root: mid,
                residual: fm.abs(),
                iterations: iter,
            });
        }
        last_residual = fm.abs();
        if fm.signum() == fa.signum() {
            a = mid;
            fa = fm;
        } else {
            b = mid;
        }
    }

    Err(PcError::NoConvergence {
        what,
        iterations: opts.max_iter,
        residual: last_residual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bisect_finds_sqrt_two() {
        let sol = bisect(|x| x * x - 2.0, 0.0, 2.0, RootOptions::default(), "sqrt2").unwrap();
        assert!((sol.root - 2.0_f64.sqrt()).abs() < 1e-10);
        assert!(sol.iterations > 0);
    }

    #[test]
    fn bisect_rejects_unbracketed() {
        let err = bisect(|x| x * x + 1.0, -1.0, 1.0, RootOptions::default(), "no root").unwrap_err();
        assert!(matches!(err, PcError::NotBracketed { .. }));
    }

    #[test]
    fn bisect_reports_residual_when_budget_exhausted() {
        let opts = RootOptions {
            max_iter: 3,
            x_tol: 0.0,
            f_tol: 0.0,
        };
        let err = bisect(|x| x - 0.123_456, 0.0, 1.0, opts, "tight").unwrap_err();
        match err {
            PcError::NoConvergence { iterations, residual, .. } => {
                assert_eq!(iterations, 3);
                assert!(residual > 0.0);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
