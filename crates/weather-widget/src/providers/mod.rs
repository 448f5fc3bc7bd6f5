use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;

use crate::model::{ForecastPayload, Location};
use crate::units::UnitPreference;

pub mod open_meteo;

pub trait ProviderApi {
    fn geocode(&self, query: &str) -> Result<Location, ProviderError>;
    fn fetch_forecast(
        &self,
        lat: f64,
        lon: f64,
        units: UnitPreference,
    ) -> Result<ForecastPayload, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct HttpProviders {
    client: Client,
}

impl HttpProviders {
    /// Builds a client with the given request deadline; `None` disables the
    /// default reqwest timeout entirely.
    pub fn new(timeout: Option<Duration>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ProviderError::Transport(error.to_string()))?;

        Ok(Self { client })
    }
}

impl ProviderApi for HttpProviders {
    fn geocode(&self, query: &str) -> Result<Location, ProviderError> {
        open_meteo::fetch_geocode(&self.client, query)
    }

    fn fetch_forecast(
        &self,
        lat: f64,
        lon: f64,
        units: UnitPreference,
    ) -> Result<ForecastPayload, ProviderError> {
        open_meteo::fetch_forecast(&self.client, lat, lon, units)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Location not found")]
    NotFound { query: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("http error ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }

    pub fn code(&self) -> &'static str {
        match self {
            ProviderError::NotFound { .. } => "not_found",
            ProviderError::Transport(_) => "transport",
            ProviderError::Http { .. } => "http",
            ProviderError::InvalidResponse(_) => "invalid_response",
        }
    }
}
