//! Release-rate samples and whole-run statistics.

use serde::{Deserialize, Serialize};

/// Mass fractions of the discharged stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseSplit {
    pub vapor: f64,
    /// Droplets carried along with the vapor.
    pub aerosol: f64,
    /// Liquid that rains out.
    pub liquid: f64,
}

impl PhaseSplit {
    pub const VAPOR: Self = Self {
        vapor: 1.0,
        aerosol: 0.0,
        liquid: 0.0,
    };

    pub const LIQUID: Self = Self {
        vapor: 0.0,
        aerosol: 0.0,
        liquid: 1.0,
    };

    /// Split of a flashing jet: the flashed vapor entrains at most an equal
    /// mass of droplets; the rest rains out.
    pub fn from_flash_fraction(flash_fraction: f64) -> Self {
        let vapor = flash_fraction.clamp(0.0, 1.0);
        let aerosol = vapor.min(1.0 - vapor);
        Self {
            vapor,
            aerosol,
            liquid: (1.0 - vapor - aerosol).max(0.0),
        }
    }

    pub fn airborne(&self) -> f64 {
        self.vapor + self.aerosol
    }
}

/// One point of a source-term time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReleaseSample {
    pub time_s: f64,
    /// Rate leaving the containment.
    pub mass_flow_kg_s: f64,
    /// Rate entering the atmosphere.
    pub airborne_kg_s: f64,
    /// Temperature of the airborne stream.
    pub temperature_k: f64,
    pub phase: PhaseSplit,
    /// Cumulative mass out of containment.
    pub released_kg: f64,
}

/// Collected release series, time ordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseTimeSeries {
    pub samples: Vec<ReleaseSample>,
}

impl ReleaseTimeSeries {
    pub fn new(samples: Vec<ReleaseSample>) -> Self {
        Self { samples }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_s(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(a), Some(b)) => b.time_s - a.time_s,
            _ => 0.0,
        }
    }

    pub fn total_released_kg(&self) -> f64 {
        self.samples.last().map_or(0.0, |s| s.released_kg)
    }

    pub fn peak_rate_kg_s(&self) -> f64 {
        self.samples.iter().map(|s| s.mass_flow_kg_s).fold(0.0, f64::max)
    }

    pub fn peak_airborne_kg_s(&self) -> f64 {
        self.samples.iter().map(|s| s.airborne_kg_s).fold(0.0, f64::max)
    }

    /// Airborne mass integrated with the trapezoid rule.
    pub fn total_airborne_kg(&self) -> f64 {
        self.cumulative_airborne().last().copied().unwrap_or(0.0)
    }

    /// Mass-weighted mean temperature of the airborne stream.
    pub fn mean_airborne_temperature_k(&self) -> Option<f64> {
        let weight: f64 = self.samples.iter().map(|s| s.airborne_kg_s).sum();
        if weight <= 0.0 {
            return self.samples.first().map(|s| s.temperature_k);
        }
        Some(
            self.samples
                .iter()
                .map(|s| s.airborne_kg_s * s.temperature_k)
                .sum::<f64>()
                / weight,
        )
    }

    fn cumulative_airborne(&self) -> Vec<f64> {
        let mut acc = 0.0;
        let mut out = Vec::with_capacity(self.samples.len());
        for (i, s) in self.samples.iter().enumerate() {
            if i > 0 {
                let prev = &self.samples[i - 1];
                acc += 0.5 * (prev.airborne_kg_s + s.airborne_kg_s) * (s.time_s - prev.time_s);
            }
            out.push(acc);
        }
        out
    }

    /// Highest running-average airborne rate over `window_s`.
    ///
    /// Releases shorter than the window are averaged over their own
    /// duration.
    pub fn max_average_airborne_kg_s(&self, window_s: f64) -> f64 {
        let duration = self.duration_s();
        if self.samples.len() < 2 || duration <= 0.0 {
            return self.samples.first().map_or(0.0, |s| s.airborne_kg_s);
        }
        let cumulative = self.cumulative_airborne();
        if !(window_s > 0.0) || duration <= window_s {
            return cumulative[cumulative.len() - 1] / duration;
        }
        let times: Vec<f64> = self.samples.iter().map(|s| s.time_s).collect();
        let at = |t: f64| -> f64 {
            let j = times.partition_point(|&x| x < t);
            if j == 0 {
                return cumulative[0];
            }
            if j >= times.len() {
                return cumulative[cumulative.len() - 1];
            }
            let (t0, t1) = (times[j - 1], times[j]);
            let f = if t1 > t0 { (t - t0) / (t1 - t0) } else { 1.0 };
            cumulative[j - 1] + f * (cumulative[j] - cumulative[j - 1])
        };

        let t_end = times[times.len() - 1];
        let mut best = 0.0_f64;
        for (i, &t) in times.iter().enumerate() {
            if t + window_s <= t_end {
                best = best.max((at(t + window_s) - cumulative[i]) / window_s);
            }
            if t - window_s >= times[0] {
                best = best.max((cumulative[i] - at(t - window_s)) / window_s);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(time_s: f64, rate: f64, released_kg: f64) -> ReleaseSample {
        ReleaseSample {
            time_s,
            mass_flow_kg_s: rate,
            airborne_kg_s: rate,
            temperature_k: 290.0,
            phase: PhaseSplit::VAPOR,
            released_kg,
        }
    }

    #[test]
    fn constant_rate_statistics() {
        let series = ReleaseTimeSeries::new(
            (0..=100).map(|i| sample(i as f64, 2.0, 2.0 * i as f64)).collect(),
        );
        assert_eq!(series.duration_s(), 100.0);
        assert_eq!(series.total_released_kg(), 200.0);
        assert!((series.total_airborne_kg() - 200.0).abs() < 1e-9);
        assert!((series.max_average_airborne_kg_s(10.0) - 2.0).abs() < 1e-9);
        assert!((series.max_average_airborne_kg_s(600.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn window_finds_the_strong_part() {
        let samples = (0..=100)
            .map(|i| {
                let t = i as f64;
                sample(t, if t < 20.0 { 10.0 } else { 1.0 }, 0.0)
            })
            .collect();
        let series = ReleaseTimeSeries::new(samples);
        let avg = series.max_average_airborne_kg_s(10.0);
        assert!((avg - 10.0).abs() < 1e-9, "avg = {avg}");
        assert!(series.max_average_airborne_kg_s(50.0) < avg);
    }

    proptest! {
        #[test]
        fn flash_split_is_a_partition(chi in -0.5f64..1.5) {
            let p = PhaseSplit::from_flash_fraction(chi);
            prop_assert!(p.vapor >= 0.0 && p.aerosol >= 0.0 && p.liquid >= 0.0);
            prop_assert!((p.vapor + p.aerosol + p.liquid - 1.0).abs() < 1e-12);
            prop_assert!(p.aerosol <= p.vapor);
        }
    }
}
