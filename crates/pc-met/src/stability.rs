//! Pasquill-Gifford stability classification.

use crate::error::{MetError, MetResult, require_positive};
use crate::solar::{cloud_corrected_insolation, solar_position};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Atmospheric stability class, A (most unstable) to F (most stable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StabilityClass {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl StabilityClass {
    pub const ALL: [StabilityClass; 6] = [
        StabilityClass::A,
        StabilityClass::B,
        StabilityClass::C,
        StabilityClass::D,
        StabilityClass::E,
        StabilityClass::F,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StabilityClass::A => "A",
            StabilityClass::B => "B",
            StabilityClass::C => "C",
            StabilityClass::D => "D",
            StabilityClass::E => "E",
            StabilityClass::F => "F",
        }
    }

    pub fn is_unstable(&self) -> bool {
        matches!(self, StabilityClass::A | StabilityClass::B | StabilityClass::C)
    }

    pub fn is_stable(&self) -> bool {
        matches!(self, StabilityClass::E | StabilityClass::F)
    }
}

impl fmt::Display for StabilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StabilityClass {
    type Err = MetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(StabilityClass::A),
            "B" => Ok(StabilityClass::B),
            "C" => Ok(StabilityClass::C),
            "D" => Ok(StabilityClass::D),
            "E" => Ok(StabilityClass::E),
            "F" => Ok(StabilityClass::F),
            _ => Err(MetError::invalid("unrecognized stability class", s)),
        }
    }
}

/// Incoming solar radiation category, W/m^2 thresholds 851 / 520 / 176.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsolationCategory {
    Strong,
    Moderate,
    Slight,
    Weak,
}

impl InsolationCategory {
    pub fn from_flux(insolation_w_m2: f64) -> Self {
        if insolation_w_m2 > 851.0 {
            InsolationCategory::Strong
        } else if insolation_w_m2 > 520.0 {
            InsolationCategory::Moderate
        } else if insolation_w_m2 > 176.0 {
            InsolationCategory::Slight
        } else {
            InsolationCategory::Weak
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeOfDay {
    Day,
    Night,
}

/// Daytime classification needs insolation; night-time needs cloud cover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkyCondition {
    /// Incoming solar flux, W/m^2.
    Insolation(f64),
    /// Cloud cover in tenths (0 clear .. 10 overcast).
    CloudCover(f64),
}

/// Wind speed bins: < 2, 2-3, 3-5, 5-6, >= 6 m/s.
fn wind_bin(wind_speed: f64) -> usize {
    if wind_speed < 2.0 {
        0
    } else if wind_speed < 3.0 {
        1
    } else if wind_speed < 5.0 {
        2
    } else if wind_speed < 6.0 {
        3
    } else {
        4
    }
}

use StabilityClass::{A, B, C, D, E, F};

const DAY_STRONG: [StabilityClass; 5] = [A, B, B, C, C];
const DAY_MODERATE: [StabilityClass; 5] = [B, B, C, D, D];
const DAY_SLIGHT: [StabilityClass; 5] = [B, C, C, D, D];
const NIGHT_CLOUDY: [StabilityClass; 5] = [E, E, D, D, D];
const NIGHT_CLEAR: [StabilityClass; 5] = [F, F, E, D, D];

/// Night-time cloud cover (tenths) at or above which the cloudy column applies.
const NIGHT_CLOUDY_TENTHS: f64 = 5.0;

/// Pasquill-Gifford classification from 10 m wind speed and sky condition.
///
/// Daytime with weak insolation (heavy overcast) is neutral (D).
pub fn classify_stability(
    wind_speed: f64,
    sky: SkyCondition,
    time_of_day: TimeOfDay,
) -> MetResult<StabilityClass> {
    let wind_speed = require_positive(wind_speed, "wind speed must be positive")?;
    let bin = wind_bin(wind_speed);

    match (time_of_day, sky) {
        (TimeOfDay::Day, SkyCondition::Insolation(flux)) => {
            if !(flux.is_finite() && flux >= 0.0) {
                return Err(MetError::invalid("insolation must be non-negative", flux));
            }
            Ok(match InsolationCategory::from_flux(flux) {
                InsolationCategory::Strong => DAY_STRONG[bin],
                InsolationCategory::Moderate => DAY_MODERATE[bin],
                InsolationCategory::Slight => DAY_SLIGHT[bin],
                InsolationCategory::Weak => D,
            })
        }
        (TimeOfDay::Night, SkyCondition::CloudCover(tenths)) => {
            if !(0.0..=10.0).contains(&tenths) {
                return Err(MetError::invalid("cloud cover must be 0-10 tenths", tenths));
            }
            Ok(if tenths >= NIGHT_CLOUDY_TENTHS {
                NIGHT_CLOUDY[bin]
            } else {
                NIGHT_CLEAR[bin]
            })
        }
        (TimeOfDay::Day, SkyCondition::CloudCover(_)) => Err(MetError::invalid(
            "daytime classification requires insolation",
            "cloud cover given",
        )),
        (TimeOfDay::Night, SkyCondition::Insolation(_)) => Err(MetError::invalid(
            "night-time classification requires cloud cover",
            "insolation given",
        )),
    }
}

/// Classification from place, time and cloud cover via the solar position.
pub fn stability_from_conditions(
    wind_speed: f64,
    latitude_deg: f64,
    longitude_deg: f64,
    datetime: &DateTime<FixedOffset>,
    cloud_cover_tenths: f64,
) -> MetResult<StabilityClass> {
    let sun = solar_position(latitude_deg, longitude_deg, datetime)?;
    if sun.elevation_deg > 0.0 {
        let flux = cloud_corrected_insolation(sun.insolation_w_m2, cloud_cover_tenths)?;
        classify_stability(wind_speed, SkyCondition::Insolation(flux), TimeOfDay::Day)
    } else {
        classify_stability(
            wind_speed,
            SkyCondition::CloudCover(cloud_cover_tenths),
            TimeOfDay::Night,
        )
    }
}
