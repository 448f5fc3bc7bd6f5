use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitPreference {
    #[default]
    Metric,
    Imperial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitSymbols {
    pub temperature: &'static str,
    pub wind: &'static str,
}

impl UnitPreference {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "metric" | "c" | "celsius" => Some(Self::Metric),
            "imperial" | "f" | "fahrenheit" => Some(Self::Imperial),
            _ => None,
        }
    }

    pub fn symbols(self) -> UnitSymbols {
        match self {
            Self::Metric => UnitSymbols {
                temperature: "°C",
                wind: "km/h",
            },
            Self::Imperial => UnitSymbols {
                temperature: "°F",
                wind: "mph",
            },
        }
    }

    /// Provider value for `windspeed_unit`.
    pub fn windspeed_param(self) -> &'static str {
        match self {
            Self::Metric => "kmh",
            Self::Imperial => "mph",
        }
    }

    /// Provider value for `temperature_unit`.
    pub fn temperature_param(self) -> &'static str {
        match self {
            Self::Metric => "celsius",
            Self::Imperial => "fahrenheit",
        }
    }
}
