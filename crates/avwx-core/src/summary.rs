//! Convenience queries over decoded records

use chrono::{DateTime, Utc};

use crate::types::{FlightCategory, MetarRecord, TafForecastPeriod, TafRecord};
use crate::units::{celsius_to_fahrenheit, hpa_to_inches_hg, knots_to_mph, visibility_statute_miles};

/// Visibility tokens meaning "more than six statute miles"
const UNLIMITED_VISIBILITY: [&str; 2] = ["6+", "P6SM"];

const SIGNIFICANT_WEATHER: [&str; 8] = ["TS", "SH", "FZ", "SN", "IC", "PL", "GR", "GS"];

const PRECIPITATION: [&str; 9] = ["DZ", "RA", "SN", "SG", "IC", "PL", "GR", "GS", "UP"];

impl MetarRecord {
    pub fn is_vfr(&self) -> bool {
        self.flight_category == FlightCategory::Vfr
    }

    /// IFR or LIFR
    pub fn is_ifr(&self) -> bool {
        self.flight_category >= FlightCategory::Ifr
    }

    pub fn has_precipitation(&self) -> bool {
        self.present_weather
            .iter()
            .any(|wx| PRECIPITATION.iter().any(|p| wx.contains(p)))
    }

    pub fn temperature_fahrenheit(&self) -> Option<f64> {
        self.temperature_celsius.map(celsius_to_fahrenheit)
    }

    pub fn dewpoint_fahrenheit(&self) -> Option<f64> {
        self.dewpoint_celsius.map(celsius_to_fahrenheit)
    }

    pub fn altimeter_inches_hg(&self) -> f64 {
        hpa_to_inches_hg(self.altimeter_hpa)
    }

    pub fn wind_speed_mph(&self) -> Option<f64> {
        self.wind_speed_knots.map(|kt| knots_to_mph(f64::from(kt)))
    }
}

impl TafForecastPeriod {
    pub fn is_significant_weather(&self) -> bool {
        match &self.weather_phenomena {
            Some(wx) => SIGNIFICANT_WEATHER.iter().any(|code| wx.contains(code)),
            None => false,
        }
    }

    /// Below three statute miles
    pub fn has_low_visibility(&self) -> bool {
        if UNLIMITED_VISIBILITY.contains(&self.visibility.as_str()) {
            return false;
        }
        visibility_statute_miles(&self.visibility).map_or(false, |sm| sm < 3.0)
    }

    pub fn wind_speed_mph(&self) -> Option<f64> {
        self.wind_speed_knots.map(|kt| knots_to_mph(f64::from(kt)))
    }

    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.valid_from.time <= at && at <= self.valid_to.time
    }
}

impl TafRecord {
    /// Lowest finite visibility token across periods, or "6+" when every
    /// period forecasts unlimited visibility.
    ///
    /// Returns the source token as written (`"2"`, `"1/2"`), not a
    /// normalized number such as `"2.0"`. Use
    /// [`visibility_statute_miles`] for the numeric value.
    pub fn lowest_visibility(&self) -> String {
        self.forecast_periods
            .iter()
            .filter(|p| !UNLIMITED_VISIBILITY.contains(&p.visibility.as_str()))
            .filter_map(|p| visibility_statute_miles(&p.visibility).map(|sm| (sm, &p.visibility)))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, token)| token.clone())
            .unwrap_or_else(|| "6+".to_string())
    }

    pub fn highest_wind_speed(&self) -> Option<u16> {
        self.forecast_periods
            .iter()
            .filter_map(|p| p.wind_speed_knots)
            .max()
    }

    pub fn validity_hours(&self) -> f64 {
        (self.valid_to.time - self.valid_from.time).num_seconds() as f64 / 3600.0
    }

    pub fn periods_with_significant_weather(&self) -> Vec<&TafForecastPeriod> {
        self.forecast_periods
            .iter()
            .filter(|p| p.is_significant_weather())
            .collect()
    }

    /// First period whose window contains `at`
    pub fn period_at(&self, at: DateTime<Utc>) -> Option<&TafForecastPeriod> {
        self.forecast_periods.iter().find(|p| p.covers(at))
    }
}
