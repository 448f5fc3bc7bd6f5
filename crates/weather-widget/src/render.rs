use chrono::Timelike;

use crate::display::{
    Attribution, CurrentView, DayItem, DisplaySurface, HourCard, PLACEHOLDER, StatusLine,
};
use crate::model::{ForecastPayload, Location};
use crate::providers::open_meteo::{ATTRIBUTION_LABEL, ATTRIBUTION_URL};
use crate::units::{UnitPreference, UnitSymbols};
use crate::weather_code;

pub const HOURLY_LIMIT: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedForecast {
    pub current: CurrentView,
    pub hourly: Vec<HourCard>,
    pub daily: Vec<DayItem>,
    pub attribution: Attribution,
}

pub fn render(
    payload: &ForecastPayload,
    location: &Location,
    units: UnitPreference,
) -> RenderedForecast {
    RenderedForecast {
        current: render_current(payload, location, units),
        hourly: render_hourly(payload, units),
        daily: render_daily(payload, units),
        attribution: attribution(),
    }
}

/// Clears the status line and replaces every region.
pub fn paint<S: DisplaySurface + ?Sized>(surface: &mut S, rendered: RenderedForecast) {
    surface.set_status(StatusLine::cleared());
    surface.set_current(rendered.current);
    surface.set_hourly(rendered.hourly);
    surface.set_daily(rendered.daily);
    surface.set_attribution(rendered.attribution);
}

pub fn render_current(
    payload: &ForecastPayload,
    location: &Location,
    units: UnitPreference,
) -> CurrentView {
    let symbols = units.symbols();
    let current = &payload.current;
    let entry = weather_code::describe(current.weather_code);
    let temperature = format_temperature(current.temperature, symbols);

    // The provider's free tier has no apparent temperature, pressure, UV or
    // visibility.
    CurrentView {
        location_name: location.name.clone(),
        location_meta: location.meta_line(),
        feels_like: temperature.clone(),
        temperature,
        description: entry.description.to_string(),
        icon: entry.icon.to_string(),
        humidity: payload
            .hourly
            .first()
            .map(|point| format!("{}%", point.relative_humidity))
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        wind: format!("{} {}", round_half_up(current.windspeed), symbols.wind),
        pressure: PLACEHOLDER.to_string(),
        uv: PLACEHOLDER.to_string(),
        visibility: PLACEHOLDER.to_string(),
    }
}

pub fn render_hourly(payload: &ForecastPayload, units: UnitPreference) -> Vec<HourCard> {
    let symbols = units.symbols();
    payload
        .hourly
        .iter()
        .take(HOURLY_LIMIT)
        .map(|point| HourCard {
            hour: format!("{}:00", point.time.hour()),
            icon: weather_code::describe(point.weather_code).icon.to_string(),
            temperature: format_temperature(point.temperature, symbols),
        })
        .collect()
}

pub fn render_daily(payload: &ForecastPayload, units: UnitPreference) -> Vec<DayItem> {
    let symbols = units.symbols();
    payload
        .daily
        .iter()
        .map(|point| DayItem {
            day: point.date.format("%a").to_string(),
            icon: weather_code::describe(point.weather_code).icon.to_string(),
            range: format!(
                "{} – {}",
                format_temperature(point.temperature_min, symbols),
                format_temperature(point.temperature_max, symbols)
            ),
        })
        .collect()
}

pub fn attribution() -> Attribution {
    Attribution {
        href: ATTRIBUTION_URL.to_string(),
        label: ATTRIBUTION_LABEL.to_string(),
    }
}

/// Rounds half-way values towards positive infinity, so `-2.5` becomes `-2`.
///
/// `value - value.floor()` is exact, unlike `value + 0.5`, so inputs just
/// below a half never round up.
pub fn round_half_up(value: f64) -> i64 {
    let floor = value.floor();
    let rounded = if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    };
    rounded as i64
}

fn format_temperature(value: f64, symbols: UnitSymbols) -> String {
    format!("{}{}", round_half_up(value), symbols.temperature)
}
