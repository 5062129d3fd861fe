use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// What a weather query is keyed by.
#[derive(Debug, Clone, PartialEq)]
pub enum Locator {
    Place(String),
    Coordinates(Coordinates),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Place(name) => write!(f, "{name}"),
            Locator::Coordinates(c) => write!(f, "{:.4},{:.4}", c.latitude, c.longitude),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub place: String,
    pub temperature_c: f64,
    pub condition: String,
    pub icon_code: String,
    pub observed_at: DateTime<Utc>,
}

/// One element of the 3-hourly forecast list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub sample_time: DateTime<Utc>,
    pub temperature_c: f64,
    pub condition: String,
    pub icon_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDisplayEntry {
    pub day_label: String,
    pub temperature_text: String,
    pub icon_url: Option<Url>,
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayState {
    pub temperature: String,
    pub description: String,
    pub icon_url: Option<Url>,
    pub city_name: String,
    pub current_date: String,
    pub forecast_items: Vec<ForecastDisplayEntry>,
}

impl DisplayState {
    /// True until the first successful lookup or offline restore.
    pub fn is_empty(&self) -> bool {
        self.city_name.is_empty() && self.temperature.is_empty()
    }
}

/// Persisted current-conditions row.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedCurrent {
    pub place: String,
    pub temperature_c: f64,
    pub condition: String,
    pub captured_at: DateTime<Utc>,
}

/// Persisted forecast row.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedForecast {
    pub place: String,
    pub temperature_c: f64,
    pub icon_code: String,
    pub sample_time: DateTime<Utc>,
}

/// The single offline snapshot slot, as read back from the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSnapshot {
    pub current: Option<CachedCurrent>,
    pub forecasts: Vec<CachedForecast>,
}

impl WeatherSnapshot {
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.forecasts.is_empty()
    }
}
