use chrono::{NaiveDate, NaiveDateTime};
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{CurrentConditions, DailyPoint, ForecastPayload, HourlyPoint, Location};
use crate::units::UnitPreference;

use super::ProviderError;

pub const ATTRIBUTION_URL: &str = "https://open-meteo.com/";
pub const ATTRIBUTION_LABEL: &str = "Open-Meteo";

const GEOCODE_ENDPOINT: &str = "https://geocoding-api.open-meteo.com/v1/search";
const FORECAST_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";
const FORECAST_HOURLY_FIELDS: &str = "temperature_2m,relative_humidity_2m,weathercode";
const FORECAST_DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,weathercode";
const HOURLY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
const DAILY_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Serialize)]
struct GeocodeQuery<'a> {
    name: &'a str,
    count: u8,
    language: &'a str,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country: String,
    admin1: Option<String>,
}

#[derive(Debug, Serialize)]
struct ForecastQuery<'a> {
    latitude: f64,
    longitude: f64,
    hourly: &'a str,
    daily: &'a str,
    current_weather: bool,
    timezone: &'a str,
    windspeed_unit: &'a str,
    temperature_unit: &'a str,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: Option<CurrentWeather>,
    hourly: Option<ForecastHourly>,
    daily: Option<ForecastDaily>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
    windspeed: f64,
    weathercode: i32,
}

#[derive(Debug, Deserialize)]
struct ForecastHourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    weathercode: Vec<Option<i32>>,
}

#[derive(Debug, Deserialize)]
struct ForecastDaily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    weathercode: Vec<Option<i32>>,
}

pub fn fetch_geocode(client: &Client, query: &str) -> Result<Location, ProviderError> {
    tracing::debug!(endpoint = GEOCODE_ENDPOINT, query, "geocoding place");
    let body = execute_request(geocode_request(client, query))?;
    parse_geocode_response(&body, query)
}

pub fn fetch_forecast(
    client: &Client,
    lat: f64,
    lon: f64,
    units: UnitPreference,
) -> Result<ForecastPayload, ProviderError> {
    tracing::debug!(
        endpoint = FORECAST_ENDPOINT,
        lat,
        lon,
        units = units.as_str(),
        "fetching forecast"
    );
    let body = execute_request(forecast_request(client, lat, lon, units))?;
    parse_forecast_response(&body)
}

fn geocode_request(client: &Client, query: &str) -> RequestBuilder {
    client.get(GEOCODE_ENDPOINT).query(&GeocodeQuery {
        name: query,
        count: 1,
        language: "en",
        format: "json",
    })
}

fn forecast_request(client: &Client, lat: f64, lon: f64, units: UnitPreference) -> RequestBuilder {
    client.get(FORECAST_ENDPOINT).query(&ForecastQuery {
        latitude: lat,
        longitude: lon,
        hourly: FORECAST_HOURLY_FIELDS,
        daily: FORECAST_DAILY_FIELDS,
        current_weather: true,
        timezone: "auto",
        windspeed_unit: units.windspeed_param(),
        temperature_unit: units.temperature_param(),
    })
}

fn execute_request(request: RequestBuilder) -> Result<String, ProviderError> {
    let response = request
        .send()
        .map_err(|error| ProviderError::Transport(error.to_string()))?;
    let status = response.status();
    let body = response
        .text()
        .map_err(|error| ProviderError::Transport(error.to_string()))?;
    tracing::debug!(status = status.as_u16(), bytes = body.len(), "provider responded");

    if status.is_success() {
        return Ok(body);
    }

    let message = extract_error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    Err(ProviderError::Http {
        status: status.as_u16(),
        message,
    })
}

fn parse_geocode_response(body: &str, query: &str) -> Result<Location, ProviderError> {
    let payload: GeocodeResponse = serde_json::from_str(body)
        .map_err(|error| ProviderError::InvalidResponse(format!("geocode payload: {error}")))?;

    let Some(result) = payload.results.into_iter().next() else {
        return Err(ProviderError::NotFound {
            query: query.to_string(),
        });
    };

    if result.name.trim().is_empty() {
        return Err(ProviderError::InvalidResponse(
            "geocode payload: empty location name".to_string(),
        ));
    }

    Ok(Location {
        name: result.name,
        country: result.country,
        admin1: result
            .admin1
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()),
        latitude: result.latitude,
        longitude: result.longitude,
    })
}

fn parse_forecast_response(body: &str) -> Result<ForecastPayload, ProviderError> {
    let payload: ForecastResponse = serde_json::from_str(body)
        .map_err(|error| ProviderError::InvalidResponse(format!("forecast payload: {error}")))?;

    let current = payload.current_weather.ok_or_else(|| {
        ProviderError::InvalidResponse("forecast payload: missing current_weather".into())
    })?;
    let hourly = payload
        .hourly
        .ok_or_else(|| ProviderError::InvalidResponse("forecast payload: missing hourly".into()))?;
    let daily = payload
        .daily
        .ok_or_else(|| ProviderError::InvalidResponse("forecast payload: missing daily".into()))?;

    Ok(ForecastPayload {
        current: CurrentConditions {
            temperature: current.temperature,
            windspeed: current.windspeed,
            weather_code: current.weathercode,
        },
        hourly: build_hourly_points(hourly)?,
        daily: build_daily_points(daily)?,
    })
}

fn build_hourly_points(hourly: ForecastHourly) -> Result<Vec<HourlyPoint>, ProviderError> {
    let length = hourly.time.len();

    if hourly.temperature_2m.len() != length
        || hourly.relative_humidity_2m.len() != length
        || hourly.weathercode.len() != length
    {
        return Err(ProviderError::InvalidResponse(
            "forecast payload: hourly arrays length mismatch".to_string(),
        ));
    }

    let mut points = Vec::with_capacity(length);
    for index in 0..length {
        let raw = hourly.time[index].trim();
        let time = NaiveDateTime::parse_from_str(raw, HOURLY_TIME_FORMAT).map_err(|error| {
            ProviderError::InvalidResponse(format!(
                "forecast payload: bad hourly.time '{raw}': {error}"
            ))
        })?;

        let (Some(temperature), Some(relative_humidity), Some(weather_code)) = (
            hourly.temperature_2m[index],
            hourly.relative_humidity_2m[index],
            hourly.weathercode[index],
        ) else {
            continue;
        };

        points.push(HourlyPoint {
            time,
            temperature,
            relative_humidity,
            weather_code,
        });
    }

    if points.len() < length {
        tracing::debug!(
            skipped = length - points.len(),
            "dropped hourly entries with missing values"
        );
    }

    Ok(points)
}

fn build_daily_points(daily: ForecastDaily) -> Result<Vec<DailyPoint>, ProviderError> {
    let length = daily.time.len();

    if daily.temperature_2m_max.len() != length
        || daily.temperature_2m_min.len() != length
        || daily.weathercode.len() != length
    {
        return Err(ProviderError::InvalidResponse(
            "forecast payload: daily arrays length mismatch".to_string(),
        ));
    }

    let mut points = Vec::with_capacity(length);
    for index in 0..length {
        let raw = daily.time[index].trim();
        let date = NaiveDate::parse_from_str(raw, DAILY_DATE_FORMAT).map_err(|error| {
            ProviderError::InvalidResponse(format!(
                "forecast payload: bad daily.time '{raw}': {error}"
            ))
        })?;

        let (Some(temperature_max), Some(temperature_min), Some(weather_code)) = (
            daily.temperature_2m_max[index],
            daily.temperature_2m_min[index],
            daily.weathercode[index],
        ) else {
            continue;
        };

        points.push(DailyPoint {
            date,
            temperature_max,
            temperature_min,
            weather_code,
        });
    }

    if points.len() < length {
        tracing::debug!(
            skipped = length - points.len(),
            "dropped daily entries with missing values"
        );
    }

    Ok(points)
}

fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let from_json = serde_json::from_str::<Value>(trimmed)
        .ok()
        .and_then(|json| {
            for key in ["reason", "message", "error", "detail"] {
                if let Some(value) = json.get(key).and_then(Value::as_str) {
                    let message = value.trim();
                    if !message.is_empty() {
                        return Some(message.to_string());
                    }
                }
            }
            None
        });

    from_json.or_else(|| Some(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::{SocketAddr, TcpListener};
    use std::thread;

    use chrono::Timelike;

    use super::*;

    /// Answers exactly one request on a loopback port with a canned response.
    fn serve_once(status_line: &'static str, body: &'static str) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut line = String::new();
            while reader.read_line(&mut line).expect("read request") > 0 {
                if line == "\r\n" {
                    break;
                }
                line.clear();
            }

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .expect("write response");
            stream.flush().expect("flush");
        });
        addr
    }

    fn local_client() -> Client {
        Client::builder().no_proxy().build().expect("client")
    }

    fn query_pairs(request: RequestBuilder) -> Vec<(String, String)> {
        let request = request.build().expect("request");
        request
            .url()
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    fn param<'a>(pairs: &'a [(String, String)], key: &str) -> Vec<&'a str> {
        pairs
            .iter()
            .filter(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    #[test]
    fn open_meteo_geocode_request_asks_for_single_english_match() {
        let client = Client::new();
        let pairs = query_pairs(geocode_request(&client, "São Paulo"));

        assert_eq!(param(&pairs, "name"), vec!["São Paulo"]);
        assert_eq!(param(&pairs, "count"), vec!["1"]);
        assert_eq!(param(&pairs, "language"), vec!["en"]);
        assert_eq!(param(&pairs, "format"), vec!["json"]);
    }

    #[test]
    fn open_meteo_forecast_request_uses_metric_pair() {
        let client = Client::new();
        let pairs = query_pairs(forecast_request(
            &client,
            31.558,
            74.35071,
            UnitPreference::Metric,
        ));

        assert_eq!(param(&pairs, "windspeed_unit"), vec!["kmh"]);
        assert_eq!(param(&pairs, "temperature_unit"), vec!["celsius"]);
        assert_eq!(param(&pairs, "latitude"), vec!["31.558"]);
        assert_eq!(param(&pairs, "longitude"), vec!["74.35071"]);
        assert_eq!(param(&pairs, "current_weather"), vec!["true"]);
        assert_eq!(param(&pairs, "timezone"), vec!["auto"]);
        assert_eq!(
            param(&pairs, "hourly"),
            vec!["temperature_2m,relative_humidity_2m,weathercode"]
        );
        assert_eq!(
            param(&pairs, "daily"),
            vec!["temperature_2m_max,temperature_2m_min,weathercode"]
        );
    }

    #[test]
    fn open_meteo_forecast_request_uses_imperial_pair() {
        let client = Client::new();
        let pairs = query_pairs(forecast_request(
            &client,
            48.85341,
            2.3488,
            UnitPreference::Imperial,
        ));

        assert_eq!(param(&pairs, "windspeed_unit"), vec!["mph"]);
        assert_eq!(param(&pairs, "temperature_unit"), vec!["fahrenheit"]);
    }

    #[test]
    fn open_meteo_geocode_parses_first_result() {
        let body = r#"{
            "results": [
                {
                    "name": "Lahore",
                    "latitude": 31.558,
                    "longitude": 74.35071,
                    "country": "Pakistan",
                    "admin1": "Punjab",
                    "timezone": "Asia/Karachi"
                },
                {
                    "name": "Lahore",
                    "latitude": 38.0,
                    "longitude": -77.9,
                    "country": "United States",
                    "admin1": "Virginia"
                }
            ],
            "generationtime_ms": 0.8
        }"#;

        let location = parse_geocode_response(body, "Lahore").expect("location");
        assert_eq!(location.name, "Lahore");
        assert_eq!(location.country, "Pakistan");
        assert_eq!(location.admin1.as_deref(), Some("Punjab"));
        assert_eq!(location.latitude, 31.558);
        assert_eq!(location.longitude, 74.35071);
    }

    #[test]
    fn open_meteo_geocode_returns_not_found_when_empty_or_missing() {
        for body in [r#"{"results":[]}"#, r#"{"generationtime_ms":0.5}"#] {
            let error = parse_geocode_response(body, "Zzzzznotaplace").expect_err("must fail");
            assert_eq!(
                error,
                ProviderError::NotFound {
                    query: "Zzzzznotaplace".to_string()
                }
            );
        }
    }

    #[test]
    fn open_meteo_geocode_rejects_unparsable_body() {
        let error = parse_geocode_response("<html>", "Paris").expect_err("must fail");
        assert!(matches!(error, ProviderError::InvalidResponse(_)));
    }

    #[test]
    fn open_meteo_forecast_zips_parallel_series() {
        let body = r#"{
            "timezone": "Asia/Karachi",
            "current_weather": {"temperature": 31.4, "windspeed": 9.7, "weathercode": 1, "time": "2025-06-01T14:00"},
            "hourly": {
                "time": ["2025-06-01T00:00", "2025-06-01T01:00"],
                "temperature_2m": [27.1, 26.5],
                "relative_humidity_2m": [48, 52],
                "weathercode": [0, 2]
            },
            "daily": {
                "time": ["2025-06-01", "2025-06-02"],
                "temperature_2m_max": [39.2, 40.1],
                "temperature_2m_min": [26.0, 27.3],
                "weathercode": [1, 95]
            }
        }"#;

        let payload = parse_forecast_response(body).expect("payload");
        assert_eq!(payload.current.temperature, 31.4);
        assert_eq!(payload.current.weather_code, 1);
        assert_eq!(payload.hourly.len(), 2);
        assert_eq!(payload.hourly[1].time.hour(), 1);
        assert_eq!(payload.hourly[1].relative_humidity, 52.0);
        assert_eq!(payload.hourly[1].weather_code, 2);
        assert_eq!(payload.daily[1].temperature_min, 27.3);
        assert_eq!(payload.daily[1].weather_code, 95);
    }

    #[test]
    fn open_meteo_forecast_rejects_mismatched_hourly_lengths() {
        let body = r#"{
            "current_weather": {"temperature": 20.0, "windspeed": 5.0, "weathercode": 3},
            "hourly": {
                "time": ["2025-06-01T00:00", "2025-06-01T01:00"],
                "temperature_2m": [20.0],
                "relative_humidity_2m": [60, 61],
                "weathercode": [3, 3]
            },
            "daily": {"time": [], "temperature_2m_max": [], "temperature_2m_min": [], "weathercode": []}
        }"#;

        let error = parse_forecast_response(body).expect_err("must fail");
        assert!(
            matches!(error, ProviderError::InvalidResponse(message) if message.contains("hourly arrays length mismatch"))
        );
    }

    #[test]
    fn open_meteo_forecast_rejects_mismatched_daily_lengths() {
        let body = r#"{
            "current_weather": {"temperature": 20.0, "windspeed": 5.0, "weathercode": 3},
            "hourly": {"time": [], "temperature_2m": [], "relative_humidity_2m": [], "weathercode": []},
            "daily": {
                "time": ["2025-06-01", "2025-06-02"],
                "temperature_2m_max": [25.0, 26.0],
                "temperature_2m_min": [15.0, 16.0],
                "weathercode": [3]
            }
        }"#;

        let error = parse_forecast_response(body).expect_err("must fail");
        assert!(
            matches!(error, ProviderError::InvalidResponse(message) if message.contains("daily arrays length mismatch"))
        );
    }

    #[test]
    fn open_meteo_forecast_requires_current_weather() {
        let body = r#"{
            "hourly": {"time": [], "temperature_2m": [], "relative_humidity_2m": [], "weathercode": []},
            "daily": {"time": [], "temperature_2m_max": [], "temperature_2m_min": [], "weathercode": []}
        }"#;

        let error = parse_forecast_response(body).expect_err("must fail");
        assert!(
            matches!(error, ProviderError::InvalidResponse(message) if message.contains("current_weather"))
        );
    }

    #[test]
    fn open_meteo_forecast_rejects_malformed_timestamps() {
        let body = r#"{
            "current_weather": {"temperature": 20.0, "windspeed": 5.0, "weathercode": 3},
            "hourly": {"time": ["yesterday"], "temperature_2m": [1.0], "relative_humidity_2m": [50], "weathercode": [0]},
            "daily": {"time": [], "temperature_2m_max": [], "temperature_2m_min": [], "weathercode": []}
        }"#;

        let error = parse_forecast_response(body).expect_err("must fail");
        assert!(
            matches!(error, ProviderError::InvalidResponse(message) if message.contains("yesterday"))
        );
    }

    #[test]
    fn open_meteo_forecast_skips_entries_with_null_values() {
        let body = r#"{
            "current_weather": {"temperature": 20.0, "windspeed": 5.0, "weathercode": 3},
            "hourly": {
                "time": ["2025-06-01T00:00", "2025-06-01T01:00", "2025-06-01T02:00"],
                "temperature_2m": [20.0, null, 19.0],
                "relative_humidity_2m": [60, 61, 62],
                "weathercode": [3, 3, null]
            },
            "daily": {
                "time": ["2025-06-01", "2025-06-02"],
                "temperature_2m_max": [25.0, 26.0],
                "temperature_2m_min": [null, 16.0],
                "weathercode": [3, 61]
            }
        }"#;

        let payload = parse_forecast_response(body).expect("payload");
        assert_eq!(payload.hourly.len(), 1);
        assert_eq!(payload.hourly[0].time.hour(), 0);
        assert_eq!(payload.hourly[0].relative_humidity, 60.0);
        assert_eq!(payload.daily.len(), 1);
        assert_eq!(payload.daily[0].temperature_min, 16.0);
        assert_eq!(payload.daily[0].weather_code, 61);
    }

    #[test]
    fn open_meteo_execute_request_maps_error_status_to_http_error() {
        let addr = serve_once("503 Service Unavailable", r#"{"error":true,"reason":"down"}"#);
        let error = execute_request(local_client().get(format!("http://{addr}/v1/forecast")))
            .expect_err("must fail");

        assert_eq!(
            error,
            ProviderError::Http {
                status: 503,
                message: "down".to_string()
            }
        );
    }

    #[test]
    fn open_meteo_execute_request_falls_back_to_status_reason() {
        let addr = serve_once("502 Bad Gateway", "");
        let error = execute_request(local_client().get(format!("http://{addr}/v1/search")))
            .expect_err("must fail");

        assert_eq!(
            error,
            ProviderError::Http {
                status: 502,
                message: "Bad Gateway".to_string()
            }
        );
    }

    #[test]
    fn open_meteo_execute_request_returns_body_on_success() {
        let addr = serve_once("200 OK", r#"{"results":[]}"#);
        let body = execute_request(local_client().get(format!("http://{addr}/v1/search")))
            .expect("body");
        assert_eq!(body, r#"{"results":[]}"#);
    }

    #[test]
    fn open_meteo_execute_request_maps_refused_connection_to_transport() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr")
        };
        let error = execute_request(local_client().get(format!("http://{addr}/v1/forecast")))
            .expect_err("must fail");

        assert!(matches!(error, ProviderError::Transport(_)), "{error}");
    }

    #[test]
    fn open_meteo_extract_error_message_prefers_reason() {
        let body = r#"{"error": true, "reason": "Latitude must be in range of -90 to 90°."}"#;
        assert_eq!(
            extract_error_message(body),
            Some("Latitude must be in range of -90 to 90°.".to_string())
        );
        assert_eq!(extract_error_message("   "), None);
    }
}
