//! Leak orifice with compressible (choked / unchoked) and incompressible flow.

use crate::common::{CHOKE_TOLERANCE, EPSILON_PRESSURE, check_finite};
use pc_core::roots::{RootOptions, bisect};
use pc_core::units::{Area, Length, MassRate, circle_area, kgps};
use pc_core::{PcError, PcResult};
use pc_sim::SimResult;

/// Hole-to-vessel diameter ratio at or below which the small-bore critical
/// ratio applies.
pub const SMALL_BORE_LIMIT: f64 = 0.2;

/// Critical pressure ratio for an ideal nozzle, `(2/(γ+1))^(γ/(γ-1))`.
pub fn ideal_critical_ratio(gamma: f64) -> f64 {
    (2.0 / (gamma + 1.0)).powf(gamma / (gamma - 1.0))
}

/// Critical pressure ratio for a hole of diameter ratio `beta` in a vessel.
///
/// Solves `Rc^((1-γ)/γ) + (γ-1)/2 β⁴ Rc^(2/γ) = (γ+1)/2`. Reduces to the
/// ideal ratio at `beta = 0`.
pub fn small_bore_critical_ratio(gamma: f64, beta: f64) -> PcResult<f64> {
    if !(gamma > 1.0 && gamma.is_finite()) {
        return Err(PcError::InvalidArg {
            what: "heat capacity ratio must exceed 1",
        });
    }
    if !(0.0..1.0).contains(&beta) {
        return Err(PcError::InvalidArg {
            what: "diameter ratio must lie in [0, 1)",
        });
    }
    let b4 = beta.powi(4);
    let residual = |rc: f64| {
        rc.powf((1.0 - gamma) / gamma) + 0.5 * (gamma - 1.0) * b4 * rc.powf(2.0 / gamma)
            - 0.5 * (gamma + 1.0)
    };
    let opts = RootOptions {
        max_iter: 200,
        x_tol: 1e-14,
        f_tol: 1e-14,
    };
    Ok(bisect(residual, 1e-6, 1.0 - 1e-12, opts, "small-bore critical ratio")?.root)
}

/// Result of a gas orifice evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GasFlow {
    pub mass_flow: MassRate,
    pub choked: bool,
}

/// Sharp-edged leak hole.
#[derive(Debug, Clone)]
pub struct Orifice {
    /// Discharge coefficient (dimensionless, typically 0.6-1.0)
    pub cd: f64,
    /// Hole area
    pub area: Area,
    /// Hole-to-vessel diameter ratio, when known
    pub diameter_ratio: Option<f64>,
}

impl Orifice {
    pub fn new(cd: f64, area: Area) -> Self {
        Self {
            cd,
            area,
            diameter_ratio: None,
        }
    }

    pub fn from_diameter(cd: f64, diameter: Length) -> Self {
        Self::new(cd, circle_area(diameter))
    }

    pub fn with_diameter_ratio(mut self, beta: f64) -> Self {
        self.diameter_ratio = Some(beta);
        self
    }

    /// Critical pressure ratio, corrected for small bores.
    pub fn critical_pressure_ratio(&self, gamma: f64) -> PcResult<f64> {
        match self.diameter_ratio {
            Some(beta) if beta <= SMALL_BORE_LIMIT => small_bore_critical_ratio(gamma, beta),
            _ => Ok(ideal_critical_ratio(gamma)),
        }
    }

    /// Gas mass flow from an upstream reservoir of density `rho_up`.
    ///
    /// Choked when `p_down / p_up <= r_crit` (plus [`CHOKE_TOLERANCE`]); the
    /// flow then no longer depends on `p_down`.
    pub fn gas_flow(&self, p_up: f64, rho_up: f64, p_down: f64, gamma: f64) -> SimResult<GasFlow> {
        if p_up - p_down < EPSILON_PRESSURE {
            return Ok(GasFlow {
                mass_flow: kgps(0.0),
                choked: false,
            });
        }
        check_finite(rho_up, "upstream density")?;
        check_finite(gamma, "gamma")?;

        let ratio = p_down / p_up;
        let r_crit = self.critical_pressure_ratio(gamma)?;
        let choked = ratio <= r_crit + CHOKE_TOLERANCE;

        let ca = self.cd * self.area.value;
        let mdot = if choked {
            let choke_factor = (2.0 / (gamma + 1.0)).powf((gamma + 1.0) / (gamma - 1.0));
            ca * (rho_up * p_up * gamma * choke_factor).sqrt()
        } else {
            let psi = ratio.powf(2.0 / gamma) - ratio.powf((gamma + 1.0) / gamma);
            ca * (2.0 * rho_up * p_up * gamma / (gamma - 1.0) * psi.max(0.0)).sqrt()
        };
        check_finite(mdot, "gas mass flow rate")?;

        Ok(GasFlow {
            mass_flow: kgps(mdot),
            choked,
        })
    }

    /// Bernoulli liquid discharge through an effective fraction of the hole.
    pub fn liquid_flow(&self, rho: f64, dp: f64, open_fraction: f64) -> SimResult<MassRate> {
        if dp < EPSILON_PRESSURE || open_fraction <= 0.0 {
            return Ok(kgps(0.0));
        }
        check_finite(rho, "liquid density")?;
        let area = self.area.value * open_fraction.min(1.0);
        let mdot = self.cd * area * (2.0 * rho * dp).sqrt();
        check_finite(mdot, "liquid mass flow rate")?;
        Ok(kgps(mdot))
    }
}
