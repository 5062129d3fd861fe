//! Text and URL formatting shared by the live and offline display paths.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use url::Url;

pub const DEFAULT_ICON_BASE_URL: &str = "https://openweathermap.org/img/wn/";

/// Long date shown under the city name, e.g. "Sunday, Jul 20".
pub const CURRENT_DATE_FORMAT: &str = "%A, %b %-d";

/// Abbreviated weekday used for forecast day labels.
pub const DAY_LABEL_FORMAT: &str = "%a";

/// Icon CDN template: `<base><icon>@2x.png`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconCdn {
    base: String,
}

impl IconCdn {
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        if !base.ends_with('/') {
            base.push('/');
        }
        Self { base }
    }

    /// Double-resolution icon URL, or `None` when there is no icon code or
    /// the result does not parse.
    pub fn url_for(&self, icon_code: &str) -> Option<Url> {
        if icon_code.is_empty() {
            return None;
        }

        match Url::parse(&format!("{}{icon_code}@2x.png", self.base)) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(icon_code, error = %e, "could not build icon URL");
                None
            }
        }
    }
}

impl Default for IconCdn {
    fn default() -> Self {
        Self::new(DEFAULT_ICON_BASE_URL)
    }
}

/// Rounds half away from zero, so 21.5 is "22°" and -0.5 is "-1°".
pub fn temperature_text(celsius: f64) -> String {
    degrees(celsius.round() as i64)
}

/// Drops the fractional part, the way cached readings are shown offline.
pub fn truncated_temperature_text(celsius: f64) -> String {
    degrees(celsius.trunc() as i64)
}

fn degrees(value: i64) -> String {
    format!("{value}°")
}

/// Upper-cases the first letter of every word and lower-cases the rest.
pub fn capitalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;

    for ch in text.chars() {
        if ch.is_whitespace() {
            at_word_start = true;
            out.push(ch);
        } else if at_word_start {
            at_word_start = false;
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
    }

    out
}

pub fn current_date_text<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format(CURRENT_DATE_FORMAT).to_string()
}

pub fn day_label<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format(DAY_LABEL_FORMAT).to_string()
}
