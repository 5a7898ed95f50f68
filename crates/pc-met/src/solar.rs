//! Solar geometry and clear-sky insolation for energy-balance models.

use crate::error::{MetError, MetResult};
use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};

/// Clear-sky insolation scale, W/m^2.
const INSOLATION_SCALE: f64 = 1111.0;
/// Below this sine of elevation insolation is taken as zero.
const MIN_SIN_ELEVATION: f64 = 0.1;
const CLOUD_ATTENUATION: f64 = 0.0071;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarPosition {
    /// Angle above the horizon, degrees (negative at night).
    pub elevation_deg: f64,
    /// Clockwise from true north, degrees in [0, 360).
    pub azimuth_deg: f64,
    /// Clear-sky incoming flux on a horizontal surface, W/m^2.
    pub insolation_w_m2: f64,
}

/// Sun position for a site and a zoned local time.
///
/// Longitude is positive east. The offset of `datetime` gives the standard
/// meridian used for the local-solar-time correction.
pub fn solar_position(
    latitude_deg: f64,
    longitude_deg: f64,
    datetime: &DateTime<FixedOffset>,
) -> MetResult<SolarPosition> {
    if !(-90.0..=90.0).contains(&latitude_deg) {
        return Err(MetError::invalid("latitude out of range", latitude_deg));
    }
    if !(-180.0..=180.0).contains(&longitude_deg) {
        return Err(MetError::invalid("longitude out of range", longitude_deg));
    }

    let day_of_year = datetime.ordinal() as f64;
    let clock_hours = datetime.hour() as f64
        + datetime.minute() as f64 / 60.0
        + datetime.second() as f64 / 3600.0;
    let utc_offset_hours = datetime.offset().local_minus_utc() as f64 / 3600.0;
    let standard_meridian = 15.0 * utc_offset_hours;

    let b = (360.0 / 365.0 * (day_of_year - 81.0)).to_radians();
    let equation_of_time_min = 9.87 * (2.0 * b).sin() - 7.53 * b.cos() - 1.5 * b.sin();
    let solar_hours =
        clock_hours + (4.0 * (longitude_deg - standard_meridian) + equation_of_time_min) / 60.0;
    let hour_angle = (15.0 * (solar_hours - 12.0)).to_radians();

    let declination = (23.45 * b.sin()).to_radians();
    let lat = latitude_deg.to_radians();

    let sin_elev = (declination.sin() * lat.sin()
        + declination.cos() * lat.cos() * hour_angle.cos())
    .clamp(-1.0, 1.0);
    let elevation = sin_elev.asin();

    let azimuth = (-hour_angle.sin() * declination.cos())
        .atan2(declination.sin() * lat.cos() - declination.cos() * lat.sin() * hour_angle.cos())
        .to_degrees()
        .rem_euclid(360.0);

    let insolation = if sin_elev > MIN_SIN_ELEVATION {
        INSOLATION_SCALE * (sin_elev - MIN_SIN_ELEVATION)
    } else {
        0.0
    };

    Ok(SolarPosition {
        elevation_deg: elevation.to_degrees(),
        azimuth_deg: azimuth,
        insolation_w_m2: insolation,
    })
}

/// Attenuate clear-sky flux for cloud cover given in tenths.
pub fn cloud_corrected_insolation(clear_sky_w_m2: f64, cloud_cover_tenths: f64) -> MetResult<f64> {
    if !(0.0..=10.0).contains(&cloud_cover_tenths) {
        return Err(MetError::invalid(
            "cloud cover must be 0-10 tenths",
            cloud_cover_tenths,
        ));
    }
    Ok(clear_sky_w_m2 * (1.0 - CLOUD_ATTENUATION * cloud_cover_tenths * cloud_cover_tenths))
}
