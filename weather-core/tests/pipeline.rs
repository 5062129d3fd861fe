//! End-to-end tests: real OpenWeather gateway against a mock server, real
//! SQLite snapshot in a temp directory.

use chrono::{Local, TimeZone, Utc};
use std::sync::Arc;
use weather_core::{
    ConnectivityProbe, CoordinateSource, Coordinates, CurrentConditions, FixedLocation,
    ForecastSample, GatewayError, Locator, LookupOutcome, OpenWeatherGateway, SnapshotStore,
    SqliteSnapshotStore, StartupOutcome, WeatherGateway, WeatherOrchestrator,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "TEST_KEY";

struct StaticProbe(bool);

impl ConnectivityProbe for StaticProbe {
    fn is_reachable(&self) -> bool {
        self.0
    }
}

fn local_noon_unix(day: u32) -> i64 {
    Local
        .with_ymd_and_hms(2025, 7, day, 12, 0, 0)
        .single()
        .expect("unambiguous local noon")
        .timestamp()
}

fn london_current() -> serde_json::Value {
    serde_json::json!({
        "name": "London",
        "main": { "temp": 18.4 },
        "weather": [{ "description": "clear sky", "icon": "01d" }]
    })
}

fn forecast_item(dt: i64, temp: f64, description: &str, icon: &str) -> serde_json::Value {
    serde_json::json!({
        "dt": dt,
        "main": { "temp": temp },
        "weather": [{ "description": description, "icon": icon }]
    })
}

fn london_forecast() -> serde_json::Value {
    let noon = local_noon_unix(21);
    serde_json::json!({
        "list": [
            forecast_item(noon - 3 * 3600, 17.0, "mist", "50d"),
            forecast_item(noon, 20.2, "few clouds", "02d"),
            forecast_item(noon + 3 * 3600, 21.0, "few clouds", "02d"),
        ]
    })
}

async fn mount_london(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "London"))
        .and(query_param("appid", KEY))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_current()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("q", "London"))
        .and(query_param("appid", KEY))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_forecast()))
        .mount(server)
        .await;
}

fn online() -> Arc<StaticProbe> {
    Arc::new(StaticProbe(true))
}

fn gateway(server: &MockServer) -> Arc<OpenWeatherGateway> {
    let base = format!("{}/data/2.5/", server.uri());
    Arc::new(OpenWeatherGateway::with_base_url(KEY.to_string(), &base).expect("gateway"))
}

#[tokio::test]
async fn london_lookup_publishes_and_caches() {
    let server = MockServer::start().await;
    mount_london(&server).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SqliteSnapshotStore::open(dir.path().join("snapshot.db")).expect("store");
    let store = Arc::new(store);

    let orch = WeatherOrchestrator::new(gateway(&server), store.clone(), online());

    assert_eq!(orch.lookup_place("London").await, LookupOutcome::Ready);

    let state = orch.display().current();
    assert_eq!(state.temperature, "18°");
    assert_eq!(state.description, "Clear Sky");
    assert_eq!(state.city_name, "London");
    assert_eq!(state.forecast_items.len(), 1);
    assert_eq!(state.forecast_items[0].temperature_text, "20°");
    assert!(
        state.forecast_items[0]
            .icon_url
            .as_ref()
            .is_some_and(|u| u.as_str().ends_with("/02d@2x.png"))
    );

    let snapshot = store.load();
    let current = snapshot.current.expect("current row");
    assert_eq!(current.place, "London");
    assert_eq!(current.temperature_c, 18.4);
    assert_eq!(current.condition, "clear sky");
    assert_eq!(snapshot.forecasts.len(), 3);
    assert!(snapshot.forecasts.windows(2).all(|w| w[0].sample_time <= w[1].sample_time));
}

#[tokio::test]
async fn coordinate_lookup_sends_lat_lon() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("lat", "51.5"))
        .and(query_param("lon", "-0.12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_current()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("lat", "51.5"))
        .and(query_param("lon", "-0.12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_forecast()))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(SqliteSnapshotStore::in_memory().expect("store"));
    let orch = WeatherOrchestrator::new(gateway(&server), store, Arc::new(StaticProbe(true)));
    let source = FixedLocation::new(Coordinates::new(51.5, -0.12));
    let updates = source.subscribe();

    assert_eq!(orch.start(&source), StartupOutcome::Live);
    drop(source);
    orch.follow_location(updates).await;

    assert_eq!(orch.display().current().city_name, "London");
}

#[tokio::test]
async fn forecast_failure_means_no_update_and_no_save() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_current()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let store = Arc::new(SqliteSnapshotStore::in_memory().expect("store"));
    let orch = WeatherOrchestrator::new(gateway(&server), store.clone(), online());

    assert_eq!(orch.lookup_place("London").await, LookupOutcome::Failed);
    assert!(orch.display().current().is_empty());
    assert!(store.load().is_empty());
}

#[tokio::test]
async fn offline_startup_reads_snapshot_and_never_calls_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("snapshot.db");
    SqliteSnapshotStore::open(&path).expect("store").save(
        &CurrentConditions {
            place: "Cairo".into(),
            temperature_c: 15.0,
            condition: "sunny".into(),
            icon_code: "01d".into(),
            observed_at: Utc::now(),
        },
        &[ForecastSample {
            sample_time: Utc::now(),
            temperature_c: 22.8,
            condition: "sunny".into(),
            icon_code: "01d".into(),
        }],
    );

    let store = Arc::new(SqliteSnapshotStore::open(&path).expect("store"));
    let orch = WeatherOrchestrator::new(gateway(&server), store, Arc::new(StaticProbe(false)));
    let source = FixedLocation::new(Coordinates::new(30.0, 31.2));

    assert_eq!(orch.start(&source), StartupOutcome::Offline { restored: true });

    let state = orch.display().current();
    assert_eq!(state.temperature, "15°");
    assert_eq!(state.city_name, "Cairo");
    assert_eq!(state.forecast_items.len(), 1);
    assert_eq!(state.forecast_items[0].temperature_text, "22°");
}

#[tokio::test]
async fn gateway_errors_are_distinguishable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string(r#"{"cod":"404","message":"city not found"}"#),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"list": "nope"}"#))
        .mount(&server)
        .await;

    let gw = gateway(&server);
    let locator = Locator::Place("Atlantis".into());

    let err = gw.fetch_current(&locator).await.unwrap_err();
    assert!(matches!(err, GatewayError::Status { status, .. } if status.as_u16() == 404));
    assert!(err.to_string().contains("city not found"));

    let err = gw.fetch_forecast(&locator).await.unwrap_err();
    assert!(err.is_decode());
}

#[tokio::test]
async fn unreachable_upstream_is_a_transport_error() {
    // Reserve a port, then release it so nothing is listening there.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("local addr").port()
    };
    let base = format!("http://127.0.0.1:{port}/data/2.5/");
    let gw = OpenWeatherGateway::with_base_url(KEY.into(), &base).expect("gateway");

    let err = gw.fetch_current(&Locator::Place("London".into())).await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport { .. }));
}
