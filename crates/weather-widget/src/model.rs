use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin1: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// `country, admin1`, dropping whichever part is blank.
    pub fn meta_line(&self) -> String {
        [Some(self.country.as_str()), self.admin1.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub windspeed: f64,
    pub weather_code: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyPoint {
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub relative_humidity: f64,
    pub weather_code: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub weather_code: i32,
}

/// One forecast response. Hourly and daily series are index-aligned by
/// construction: each point carries every field for its instant.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPayload {
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyPoint>,
    pub daily: Vec<DailyPoint>,
}

pub fn normalize_query(raw: &str) -> Result<String, ValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::EmptyQuery);
    }
    Ok(value.to_string())
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("place name must not be empty")]
    EmptyQuery,
    #[error("unknown unit preference: {0} (expected metric or imperial)")]
    UnknownUnits(String),
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}
