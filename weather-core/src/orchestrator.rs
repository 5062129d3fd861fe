//! Fetch, join, project, cache, or fall back to the cached snapshot.

use chrono::{DateTime, Days, Local, Utc};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    connectivity::ConnectivityProbe,
    display::DisplayStore,
    forecast,
    format::{self, IconCdn},
    location::CoordinateSource,
    model::{
        CachedForecast, Coordinates, CurrentConditions, DisplayState, ForecastDisplayEntry,
        ForecastSample, Locator, WeatherSnapshot,
    },
    provider::WeatherGateway,
    store::SnapshotStore,
};

/// How a single lookup ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Nothing to look up (empty place name).
    Skipped,
    /// Both legs succeeded; display state and snapshot were replaced.
    Ready,
    /// At least one leg failed; display state was left alone.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupOutcome {
    /// Network is up and a location fix was requested.
    Live,
    /// Network is down; `restored` tells whether a snapshot was shown.
    Offline { restored: bool },
}

pub struct WeatherOrchestrator {
    gateway: Arc<dyn WeatherGateway>,
    store: Arc<dyn SnapshotStore>,
    probe: Arc<dyn ConnectivityProbe>,
    icons: IconCdn,
    display: DisplayStore,
}

impl WeatherOrchestrator {
    pub fn new(
        gateway: Arc<dyn WeatherGateway>,
        store: Arc<dyn SnapshotStore>,
        probe: Arc<dyn ConnectivityProbe>,
    ) -> Self {
        Self {
            gateway,
            store,
            probe,
            icons: IconCdn::default(),
            display: DisplayStore::new(),
        }
    }

    pub fn with_icon_cdn(mut self, icons: IconCdn) -> Self {
        self.icons = icons;
        self
    }

    pub fn display(&self) -> &DisplayStore {
        &self.display
    }

    /// Startup path: with connectivity, ask the source for a fix; without it,
    /// skip the network entirely and show the cached snapshot.
    pub fn start(&self, source: &dyn CoordinateSource) -> StartupOutcome {
        if self.probe.is_reachable() {
            source.request_location();
            StartupOutcome::Live
        } else {
            tracing::info!("network unreachable at startup, using cached weather");
            StartupOutcome::Offline {
                restored: self.restore_offline(),
            }
        }
    }

    /// Looks up every coordinate the stream yields until it closes.
    pub async fn follow_location(&self, mut updates: broadcast::Receiver<Coordinates>) {
        loop {
            match updates.recv().await {
                Ok(coordinates) => {
                    self.lookup_location(coordinates).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "location updates lagged, continuing with newest");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    pub async fn lookup_place(&self, name: &str) -> LookupOutcome {
        let name = name.trim();
        if name.is_empty() {
            return LookupOutcome::Skipped;
        }
        self.lookup(Locator::Place(name.to_string())).await
    }

    pub async fn lookup_location(&self, coordinates: Coordinates) -> LookupOutcome {
        self.lookup(Locator::Coordinates(coordinates)).await
    }

    async fn lookup(&self, locator: Locator) -> LookupOutcome {
        tracing::debug!(%locator, "fetching current conditions and forecast");

        let (current, forecast) = tokio::join!(
            self.gateway.fetch_current(&locator),
            self.gateway.fetch_forecast(&locator),
        );

        match (current, forecast) {
            (Ok(current), Ok(forecast)) => {
                self.display
                    .publish(live_state(&current, &forecast, Local::now(), &self.icons));
                self.store.save(&current, &forecast);
                tracing::info!(%locator, place = %current.place, "weather updated");
                LookupOutcome::Ready
            }
            (current, forecast) => {
                if let Err(e) = current {
                    tracing::warn!(%locator, error = %e, "current conditions fetch failed");
                }
                if let Err(e) = forecast {
                    tracing::warn!(%locator, error = %e, "forecast fetch failed");
                }
                LookupOutcome::Failed
            }
        }
    }

    /// Publishes the cached snapshot. Returns false when there is none.
    pub fn restore_offline(&self) -> bool {
        let snapshot = self.store.load();
        if snapshot.is_empty() {
            tracing::info!("no cached weather to show");
            return false;
        }

        self.display
            .publish(offline_state(self.display.current(), &snapshot, &self.icons));
        true
    }
}

fn live_state(
    current: &CurrentConditions,
    forecast: &[ForecastSample],
    now: DateTime<Local>,
    icons: &IconCdn,
) -> DisplayState {
    DisplayState {
        temperature: format::temperature_text(current.temperature_c),
        description: format::capitalize_words(&current.condition),
        icon_url: icons.url_for(&current.icon_code),
        city_name: current.place.clone(),
        current_date: format::current_date_text(&now),
        forecast_items: forecast::project_in(forecast, &Local, icons),
    }
}

/// Fields the snapshot lacks (the current icon) keep whatever was shown.
fn offline_state(
    mut state: DisplayState,
    snapshot: &WeatherSnapshot,
    icons: &IconCdn,
) -> DisplayState {
    if let Some(current) = &snapshot.current {
        state.city_name = current.place.clone();
        state.temperature = format::truncated_temperature_text(current.temperature_c);
        state.description = current.condition.clone();
        state.current_date = format::current_date_text(&current.captured_at.with_timezone(&Local));
    }
    state.forecast_items = offline_forecast(&snapshot.forecasts, icons);
    state
}

/// Cached sample times are stale, so the i-th row is pushed forward i days
/// before its weekday is taken. This keeps labels roughly in the current week
/// rather than reporting the real sample days.
fn offline_forecast(rows: &[CachedForecast], icons: &IconCdn) -> Vec<ForecastDisplayEntry> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let shifted: DateTime<Utc> = row
                .sample_time
                .checked_add_days(Days::new(i as u64))
                .unwrap_or(row.sample_time);

            ForecastDisplayEntry {
                day_label: format::day_label(&shifted),
                temperature_text: format::truncated_temperature_text(row.temperature_c),
                icon_url: icons.url_for(&row.icon_code),
            }
        })
        .collect()
}
