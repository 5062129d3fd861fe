//! SQLite-backed offline snapshot: one current row plus up to five forecast
//! rows, replaced wholesale on every save.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::{fs, path::Path};

use crate::{
    error::StoreError,
    model::{CachedCurrent, CachedForecast, CurrentConditions, ForecastSample, WeatherSnapshot},
};

/// How many forecast samples a snapshot keeps.
pub const SNAPSHOT_FORECAST_LIMIT: usize = 5;

/// The single offline snapshot slot.
///
/// Neither operation fails from the caller's point of view: errors are logged
/// and a failed load reads as an empty snapshot.
pub trait SnapshotStore: Send + Sync {
    fn save(&self, current: &CurrentConditions, forecast: &[ForecastSample]);

    fn load(&self) -> WeatherSnapshot;
}

pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
}

impl SqliteSnapshotStore {
    /// Open (or create) the snapshot database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(StoreError::Open)?;
        Self::with_connection(conn)
    }

    /// Like [`open`](Self::open), but a database that cannot be opened is
    /// replaced by an in-memory one so lookups still run; nothing survives
    /// the process in that case.
    pub fn open_or_in_memory<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        Self::open(path).or_else(|e| {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "snapshot unavailable, caching in memory"
            );
            Self::in_memory()
        })
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::Open)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cached_weather (
                place TEXT NOT NULL,
                temperature REAL NOT NULL,
                condition TEXT NOT NULL,
                captured_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS cached_forecast (
                place TEXT NOT NULL,
                temperature REAL NOT NULL,
                icon TEXT NOT NULL,
                sample_time INTEGER NOT NULL
            );
            "#,
        )
        .map_err(StoreError::Open)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn try_save(
        &self,
        current: &CurrentConditions,
        forecast: &[ForecastSample],
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(StoreError::Write)?;

        tx.execute("DELETE FROM cached_weather", [])
            .map_err(StoreError::Write)?;
        tx.execute("DELETE FROM cached_forecast", [])
            .map_err(StoreError::Write)?;

        tx.execute(
            "INSERT INTO cached_weather (place, temperature, condition, captured_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                current.place,
                current.temperature_c,
                current.condition,
                Utc::now().timestamp_millis(),
            ],
        )
        .map_err(StoreError::Write)?;

        for sample in forecast.iter().take(SNAPSHOT_FORECAST_LIMIT) {
            tx.execute(
                "INSERT INTO cached_forecast (place, temperature, icon, sample_time) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    current.place,
                    sample.temperature_c,
                    sample.icon_code,
                    sample.sample_time.timestamp_millis(),
                ],
            )
            .map_err(StoreError::Write)?;
        }

        tx.commit().map_err(StoreError::Write)
    }

    fn try_load(&self) -> Result<WeatherSnapshot, StoreError> {
        let conn = self.conn.lock();

        let current = conn
            .query_row(
                "SELECT place, temperature, condition, captured_at FROM cached_weather \
                 ORDER BY captured_at DESC LIMIT 1",
                [],
                |row| {
                    Ok(CachedCurrent {
                        place: row.get(0)?,
                        temperature_c: row.get(1)?,
                        condition: row.get(2)?,
                        captured_at: from_millis(row.get(3)?),
                    })
                },
            )
            .optional()
            .map_err(StoreError::Read)?;

        let mut stmt = conn
            .prepare(
                "SELECT place, temperature, icon, sample_time FROM cached_forecast \
                 ORDER BY sample_time ASC",
            )
            .map_err(StoreError::Read)?;
        let forecasts = stmt
            .query_map([], |row| {
                Ok(CachedForecast {
                    place: row.get(0)?,
                    temperature_c: row.get(1)?,
                    icon_code: row.get(2)?,
                    sample_time: from_millis(row.get(3)?),
                })
            })
            .map_err(StoreError::Read)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::Read)?;

        Ok(WeatherSnapshot { current, forecasts })
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn save(&self, current: &CurrentConditions, forecast: &[ForecastSample]) {
        match self.try_save(current, forecast) {
            Ok(()) => tracing::debug!(place = %current.place, "snapshot saved"),
            Err(e) => tracing::warn!(error = %e, "could not save weather snapshot"),
        }
    }

    fn load(&self) -> WeatherSnapshot {
        self.try_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not load weather snapshot");
            WeatherSnapshot::default()
        })
    }
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn current(place: &str, temp: f64) -> CurrentConditions {
        CurrentConditions {
            place: place.to_string(),
            temperature_c: temp,
            condition: "clear sky".to_string(),
            icon_code: "01d".to_string(),
            observed_at: Utc::now(),
        }
    }

    fn samples(n: i64, start_hour: u32) -> Vec<ForecastSample> {
        let start = Utc
            .with_ymd_and_hms(2025, 7, 20, start_hour, 0, 0)
            .single()
            .expect("valid date");
        (0..n)
            .map(|i| ForecastSample {
                sample_time: start + Duration::hours(3 * i),
                temperature_c: 10.0 + i as f64,
                condition: "rain".to_string(),
                icon_code: format!("{:02}d", i + 1),
            })
            .collect()
    }

    #[test]
    fn empty_store_loads_nothing() {
        let store = SqliteSnapshotStore::in_memory().expect("store");
        let snap = store.load();

        assert!(snap.current.is_none());
        assert!(snap.forecasts.is_empty());
        assert!(snap.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = SqliteSnapshotStore::in_memory().expect("store");
        let before = Utc::now() - Duration::seconds(1);
        store.save(&current("London", 18.4), &samples(3, 0));

        let snap = store.load();
        let cur = snap.current.expect("current row");
        assert_eq!(cur.place, "London");
        assert_eq!(cur.temperature_c, 18.4);
        assert_eq!(cur.condition, "clear sky");
        assert!(cur.captured_at >= before);

        assert_eq!(snap.forecasts.len(), 3);
        assert!(snap.forecasts.iter().all(|f| f.place == "London"));
        assert_eq!(snap.forecasts[0].icon_code, "01d");
        assert_eq!(snap.forecasts[2].temperature_c, 12.0);
    }

    #[test]
    fn keeps_only_first_five_samples() {
        let store = SqliteSnapshotStore::in_memory().expect("store");
        let input = samples(40, 0);
        store.save(&current("Paris", 20.0), &input);

        let snap = store.load();
        assert_eq!(snap.forecasts.len(), SNAPSHOT_FORECAST_LIMIT);
        let times: Vec<_> = snap.forecasts.iter().map(|f| f.sample_time).collect();
        let expected: Vec<_> = input.iter().take(5).map(|s| s.sample_time).collect();
        assert_eq!(times, expected);
    }

    #[test]
    fn forecasts_come_back_in_ascending_time() {
        let store = SqliteSnapshotStore::in_memory().expect("store");
        let mut input = samples(4, 6);
        input.reverse();
        store.save(&current("Rome", 25.0), &input);

        let snap = store.load();
        assert!(snap.forecasts.windows(2).all(|w| w[0].sample_time < w[1].sample_time));
    }

    #[test]
    fn second_save_replaces_first() {
        let store = SqliteSnapshotStore::in_memory().expect("store");
        store.save(&current("London", 18.4), &samples(5, 0));
        store.save(&current("Berlin", 9.0), &samples(2, 12));

        let snap = store.load();
        assert_eq!(snap.current.expect("current row").place, "Berlin");
        assert_eq!(snap.forecasts.len(), 2);
        assert!(snap.forecasts.iter().all(|f| f.place == "Berlin"));
    }

    #[test]
    fn reopening_a_file_sees_the_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data").join("snapshot.db");

        SqliteSnapshotStore::open(&path)
            .expect("store")
            .save(&current("Lisbon", 22.2), &samples(1, 12));

        let snap = SqliteSnapshotStore::open(&path).expect("store").load();
        assert_eq!(snap.current.expect("current row").place, "Lisbon");
        assert_eq!(snap.forecasts.len(), 1);
    }

    #[test]
    fn unopenable_path_falls_back_to_memory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"").expect("write");
        let path = blocker.join("sub").join("snapshot.db");

        assert!(SqliteSnapshotStore::open(&path).is_err());

        let store =
            SqliteSnapshotStore::open_or_in_memory(&path).expect("in-memory fallback");
        store.save(&current("Madrid", 30.1), &samples(2, 12));

        let snap = store.load();
        assert_eq!(snap.current.expect("current row").place, "Madrid");
        assert_eq!(snap.forecasts.len(), 2);
    }
}
