use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use weather_core::{
    Config, CoordinateSource, Coordinates, DisplayState, FixedLocation, LookupOutcome,
    OpenWeatherGateway, SqliteSnapshotStore, StartupOutcome, TcpProbe, WeatherGateway,
    WeatherOrchestrator, format::IconCdn, gateway_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure,

    /// Show current weather and forecast for a place.
    Show {
        /// City or place name.
        place: String,
    },

    /// Show weather for a position, falling back to the cached snapshot when offline.
    Here {
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Show the cached snapshot without touching the network.
    Cached,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config)?,
            Command::Show { place } => {
                let orch = orchestrator(&config, gateway_from_config(&config)?)?;
                match orch.lookup_place(&place).await {
                    LookupOutcome::Ready => render(&orch.display().subscribe().borrow(), false),
                    LookupOutcome::Skipped => bail!("Place name must not be empty."),
                    LookupOutcome::Failed => bail!(
                        "Could not fetch weather for '{place}'.\n\
                         Hint: run with RUST_LOG=debug for details."
                    ),
                }
            }
            Command::Here { lat, lon } => {
                let coordinates = match (lat, lon) {
                    (Some(lat), Some(lon)) => Coordinates::new(lat, lon),
                    _ => config.default_location.ok_or_else(|| {
                        anyhow!(
                            "No coordinates given and no default location configured.\n\
                             Hint: pass --lat and --lon, or set [default_location] in {}.",
                            Config::config_file_path()
                                .map(|p| p.display().to_string())
                                .unwrap_or_else(|_| "the config file".to_string())
                        )
                    })?,
                };
                here(&config, coordinates).await?;
            }
            Command::Cached => {
                let orch = orchestrator(&config, offline_gateway(&config)?)?;
                if !orch.restore_offline() {
                    bail!("No cached weather yet. Run `weather show <place>` while online first.");
                }
                render(&orch.display().subscribe().borrow(), true);
            }
        }

        Ok(())
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if key.trim().is_empty() {
        bail!("API key must not be empty.");
    }

    config.set_api_key(key.trim().to_string());
    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn here(config: &Config, coordinates: Coordinates) -> anyhow::Result<()> {
    let orch = orchestrator(config, startup_gateway(config)?)?;
    let source = FixedLocation::new(coordinates);
    let updates = source.subscribe();

    match orch.start(&source) {
        StartupOutcome::Live => {
            // Closing the source ends the stream after the requested fix.
            drop(source);
            orch.follow_location(updates).await;

            let display = orch.display().subscribe();
            if display.borrow().is_empty() {
                bail!("Could not fetch weather for this location.");
            }
            render(&display.borrow(), false);
        }
        StartupOutcome::Offline { restored: true } => {
            render(&orch.display().subscribe().borrow(), true);
        }
        StartupOutcome::Offline { restored: false } => {
            bail!("Network unreachable and no cached weather available.");
        }
    }

    Ok(())
}

fn orchestrator(
    config: &Config,
    gateway: Arc<dyn WeatherGateway>,
) -> anyhow::Result<WeatherOrchestrator> {
    let store = SqliteSnapshotStore::open_or_in_memory(config.snapshot_file_path()?)
        .context("Failed to set up the weather snapshot")?;
    let probe = TcpProbe::for_url(config.api_base_url(), config.connectivity_timeout())
        .ok_or_else(|| anyhow!("Invalid API base URL: {}", config.api_base_url()))?;

    Ok(
        WeatherOrchestrator::new(gateway, Arc::new(store), Arc::new(probe))
            .with_icon_cdn(IconCdn::new(config.icon_base_url())),
    )
}

/// `here` can end up on the cached snapshot, so a missing key is only fatal
/// once a live fetch is actually attempted.
fn startup_gateway(config: &Config) -> anyhow::Result<Arc<dyn WeatherGateway>> {
    match gateway_from_config(config) {
        Ok(gateway) => Ok(gateway),
        Err(e) => {
            tracing::warn!(error = %e, "no usable API key, live lookups will fail");
            offline_gateway(config)
        }
    }
}

/// Reading the snapshot never touches the network, so a key is optional.
fn offline_gateway(config: &Config) -> anyhow::Result<Arc<dyn WeatherGateway>> {
    let key = config.api_key.clone().unwrap_or_default();
    let gateway = OpenWeatherGateway::with_base_url(key, config.api_base_url())?;
    Ok(Arc::new(gateway))
}

fn render(state: &DisplayState, offline: bool) {
    let suffix = if offline { "  (cached)" } else { "" };
    println!("{}, {}{suffix}", state.city_name, state.current_date);
    println!("{}  {}", state.temperature, state.description);
    if let Some(url) = &state.icon_url {
        println!("icon: {url}");
    }

    if state.forecast_items.is_empty() {
        return;
    }

    println!();
    for item in &state.forecast_items {
        let icon = item.icon_url.as_ref().map(|u| u.as_str()).unwrap_or("-");
        println!("  {:<4} {:>5}  {icon}", item.day_label, item.temperature_text);
    }
}
