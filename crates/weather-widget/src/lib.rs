//! Weather lookup widget over the Open-Meteo APIs.
//!
//! - `providers`: geocoding and forecast clients.
//! - `weather_code`: WMO code to description/icon table.
//! - `render`: pure region builders for a forecast.
//! - `display`: display-region trait plus in-memory and terminal surfaces.
//! - `controller`: search, unit toggle and initial-load sequences.

pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod model;
pub mod providers;
pub mod render;
pub mod units;
pub mod weather_code;
