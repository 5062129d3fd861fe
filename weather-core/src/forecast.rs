//! Turns the raw 3-hourly forecast into one display entry per day.

use chrono::{Local, TimeZone, Timelike};
use std::fmt::Display;

use crate::{
    format::{self, IconCdn},
    model::{ForecastDisplayEntry, ForecastSample},
};

/// Hour of day (local) whose sample stands in for the whole day.
pub const MIDDAY_HOUR: u32 = 12;

/// Projects in the system time zone with the default icon CDN.
pub fn project(samples: &[ForecastSample]) -> Vec<ForecastDisplayEntry> {
    project_in(samples, &Local, &IconCdn::default())
}

/// Keeps the samples whose hour in `tz` is noon, in their original order.
pub fn project_in<Tz>(
    samples: &[ForecastSample],
    tz: &Tz,
    icons: &IconCdn,
) -> Vec<ForecastDisplayEntry>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    samples
        .iter()
        .filter_map(|sample| {
            let local = sample.sample_time.with_timezone(tz);
            (local.hour() == MIDDAY_HOUR).then(|| ForecastDisplayEntry {
                day_label: format::day_label(&local),
                temperature_text: format::temperature_text(sample.temperature_c),
                icon_url: icons.url_for(&sample.icon_code),
            })
        })
        .collect()
}
