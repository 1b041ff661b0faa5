use time::{Date, Duration, OffsetDateTime, Time};

use crate::errors::SolarError;

pub trait SolarCalculator: Send + Sync {
    /// Sunset for the given calendar date, in UTC, to the minute.
    fn sunset_utc(&self, latitude: f64, longitude: f64, date: Date) -> Result<OffsetDateTime, SolarError>;
}

/// Sunrise/sunset algorithm from the Almanac for Computers (1990), using the
/// official zenith of 90°50'.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlmanacSun;

impl AlmanacSun {
    pub const OFFICIAL_ZENITH: f64 = 90.8;

    pub fn new() -> Self {
        Self
    }
}

impl SolarCalculator for AlmanacSun {
    fn sunset_utc(&self, latitude: f64, longitude: f64, date: Date) -> Result<OffsetDateTime, SolarError> {
        let day_of_year = date.ordinal() as f64;
        let lng_hour = longitude / 15.0;

        // Approximate time of the event, mean anomaly and true longitude.
        let t = day_of_year + (18.0 - lng_hour) / 24.0;
        let mean_anomaly = 0.9856 * t - 3.289;
        let true_longitude = (mean_anomaly
            + 1.916 * sin_deg(mean_anomaly)
            + 0.020 * sin_deg(2.0 * mean_anomaly)
            + 282.634)
            .rem_euclid(360.0);

        // Right ascension, moved into the quadrant of the true longitude.
        let mut right_ascension = atan_deg(0.91764 * tan_deg(true_longitude)).rem_euclid(360.0);
        let l_quadrant = (true_longitude / 90.0).floor() * 90.0;
        let ra_quadrant = (right_ascension / 90.0).floor() * 90.0;
        right_ascension = (right_ascension + l_quadrant - ra_quadrant) / 15.0;

        let sin_dec = 0.39782 * sin_deg(true_longitude);
        let cos_dec = sin_dec.asin().cos();

        let cos_h = (cos_deg(Self::OFFICIAL_ZENITH) - sin_dec * sin_deg(latitude)) / (cos_dec * cos_deg(latitude));
        if cos_h > 1.0 {
            return Err(SolarError::NeverRises);
        }
        if cos_h < -1.0 {
            return Err(SolarError::NeverSets);
        }

        let hour_angle = cos_h.acos().to_degrees() / 15.0;
        let local_mean_time = (hour_angle + right_ascension - 0.06571 * t - 6.622).rem_euclid(24.0);

        // Unwrapped UTC hours: below 0 or above 24 means the event falls on the
        // neighbouring UTC day.
        let utc_hours = local_mean_time - lng_hour;
        let minutes = (utc_hours * 60.0).round() as i64;

        let midnight = date.with_time(Time::MIDNIGHT).assume_utc();
        midnight
            .checked_add(Duration::minutes(minutes))
            .ok_or(SolarError::InvalidDate)
    }
}

fn sin_deg(degrees: f64) -> f64 {
    degrees.to_radians().sin()
}

fn cos_deg(degrees: f64) -> f64 {
    degrees.to_radians().cos()
}

fn tan_deg(degrees: f64) -> f64 {
    degrees.to_radians().tan()
}

fn atan_deg(value: f64) -> f64 {
    value.atan().to_degrees()
}
