use std::collections::HashMap;
use std::time::Duration;

use crate::units::UnitPreference;

pub const DEFAULT_PLACE: &str = "Lahore";

pub const DEFAULT_PLACE_ENV: &str = "WEATHER_WIDGET_DEFAULT_PLACE";
pub const UNITS_ENV: &str = "WEATHER_WIDGET_UNITS";
pub const TIMEOUT_SECS_ENV: &str = "WEATHER_WIDGET_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub default_place: String,
    pub units: UnitPreference,
    /// `None` leaves requests without a deadline.
    pub request_timeout: Option<Duration>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_place: DEFAULT_PLACE.to_string(),
            units: UnitPreference::default(),
            request_timeout: None,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::from_pairs(std::env::vars())
    }

    pub(crate) fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            default_place: resolve_default_place(&map),
            units: resolve_units(&map),
            request_timeout: resolve_timeout(&map),
        }
    }
}

fn non_empty<'a>(env_map: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    env_map
        .get(key)
        .map(String::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn resolve_default_place(env_map: &HashMap<String, String>) -> String {
    non_empty(env_map, DEFAULT_PLACE_ENV)
        .unwrap_or(DEFAULT_PLACE)
        .to_string()
}

fn resolve_units(env_map: &HashMap<String, String>) -> UnitPreference {
    non_empty(env_map, UNITS_ENV)
        .and_then(UnitPreference::parse)
        .unwrap_or_default()
}

fn resolve_timeout(env_map: &HashMap<String, String>) -> Option<Duration> {
    non_empty(env_map, TIMEOUT_SECS_ENV)
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
}
