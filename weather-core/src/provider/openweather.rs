use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use url::Url;

use crate::{
    GatewayError,
    model::{CurrentConditions, ForecastSample, Locator},
};

use super::WeatherGateway;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/";

const CURRENT_ENDPOINT: &str = "weather";
const FORECAST_ENDPOINT: &str = "forecast";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct OpenWeatherGateway {
    api_key: String,
    base_url: Url,
    http: Client,
}

impl OpenWeatherGateway {
    pub fn new(api_key: String) -> Result<Self, GatewayError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// `base_url` is the directory holding the `weather` and `forecast`
    /// endpoints; a missing trailing slash is added.
    pub fn with_base_url(api_key: String, base_url: &str) -> Result<Self, GatewayError> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|source| GatewayError::Transport {
                endpoint: "client",
                source,
            })?;

        Ok(Self {
            api_key,
            base_url,
            http,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        locator: &Locator,
    ) -> Result<T, GatewayError> {
        let url = self.base_url.join(endpoint)?;

        let mut query: Vec<(&str, String)> = match locator {
            Locator::Place(name) => vec![("q", name.clone())],
            Locator::Coordinates(c) => {
                vec![("lat", c.latitude.to_string()), ("lon", c.longitude.to_string())]
            }
        };
        query.push(("appid", self.api_key.clone()));
        query.push(("units", "metric".to_string()));

        tracing::debug!(endpoint, %locator, "requesting OpenWeather");

        let res = self
            .http
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(|source| GatewayError::Transport { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| GatewayError::Transport { endpoint, source })?;

        if !status.is_success() {
            return Err(GatewayError::Status {
                endpoint,
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body)
            .map_err(|source| GatewayError::Decode { endpoint, source })
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    #[serde(default)]
    dt: Option<i64>,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

/// Condition text and icon code of the first `weather[]` element.
fn first_condition(weather: &[OwWeather]) -> (String, String) {
    weather
        .first()
        .map(|w| (w.description.clone(), w.icon.clone()))
        .unwrap_or_default()
}

impl From<OwCurrentResponse> for CurrentConditions {
    fn from(parsed: OwCurrentResponse) -> Self {
        let (condition, icon_code) = first_condition(&parsed.weather);

        CurrentConditions {
            place: parsed.name,
            temperature_c: parsed.main.temp,
            condition,
            icon_code,
            observed_at: parsed.dt.and_then(unix_to_utc).unwrap_or_else(Utc::now),
        }
    }
}

#[async_trait]
impl WeatherGateway for OpenWeatherGateway {
    async fn fetch_current(&self, locator: &Locator) -> Result<CurrentConditions, GatewayError> {
        let parsed: OwCurrentResponse = self.get(CURRENT_ENDPOINT, locator).await?;
        Ok(parsed.into())
    }

    async fn fetch_forecast(&self, locator: &Locator) -> Result<Vec<ForecastSample>, GatewayError> {
        let parsed: OwForecastResponse = self.get(FORECAST_ENDPOINT, locator).await?;

        let samples = parsed
            .list
            .into_iter()
            .filter_map(|entry| {
                let Some(sample_time) = unix_to_utc(entry.dt) else {
                    tracing::warn!(dt = entry.dt, "skipping forecast entry with out-of-range time");
                    return None;
                };
                let (condition, icon_code) = first_condition(&entry.weather);

                Some(ForecastSample {
                    sample_time,
                    temperature_c: entry.main.temp,
                    condition,
                    icon_code,
                })
            })
            .collect();

        Ok(samples)
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
