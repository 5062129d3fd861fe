use crate::{
    Config, GatewayError,
    model::{CurrentConditions, ForecastSample, Locator},
    provider::openweather::OpenWeatherGateway,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Upstream weather source: one call per endpoint, no retry, no caching.
#[async_trait]
pub trait WeatherGateway: Send + Sync + Debug {
    async fn fetch_current(&self, locator: &Locator) -> Result<CurrentConditions, GatewayError>;

    async fn fetch_forecast(&self, locator: &Locator) -> Result<Vec<ForecastSample>, GatewayError>;
}

/// Construct the OpenWeather gateway from config.
pub fn gateway_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherGateway>> {
    let api_key = config.api_key()?;
    let gateway = OpenWeatherGateway::with_base_url(api_key, config.api_base_url())?;
    Ok(Arc::new(gateway))
}
