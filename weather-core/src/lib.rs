//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - The OpenWeather gateway (current conditions + 5-day forecast)
//! - Projection of raw forecasts into display-ready entries
//! - A single-slot SQLite snapshot used when the network is down
//! - The orchestrator that joins both fetches and publishes display state
//! - Configuration & credentials handling
//!
//! It is used by `weather-cli`, but can also be reused by other front ends.

pub mod config;
pub mod connectivity;
pub mod display;
pub mod error;
pub mod forecast;
pub mod format;
pub mod location;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod store;

pub use config::Config;
pub use connectivity::{ConnectivityProbe, TcpProbe};
pub use display::DisplayStore;
pub use error::{GatewayError, LocationError, StoreError};
pub use location::{CoordinateSource, FixedLocation, LocationFeed};
pub use model::{
    Coordinates, CurrentConditions, DisplayState, ForecastDisplayEntry, ForecastSample, Locator,
    WeatherSnapshot,
};
pub use orchestrator::{LookupOutcome, StartupOutcome, WeatherOrchestrator};
pub use provider::{WeatherGateway, gateway_from_config, openweather::OpenWeatherGateway};
pub use store::{SnapshotStore, SqliteSnapshotStore};
