use std::collections::BTreeMap;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherCodeEntry {
    pub description: &'static str,
    pub icon: &'static str,
}

pub const UNKNOWN_ENTRY: WeatherCodeEntry = WeatherCodeEntry {
    description: "Unknown",
    icon: "❓",
};

const STANDARD_ENTRIES: [(i32, WeatherCodeEntry); 10] = [
    (0, entry("Clear sky", "☀️")),
    (1, entry("Mainly clear", "🌤️")),
    (2, entry("Partly cloudy", "⛅")),
    (3, entry("Overcast", "☁️")),
    (45, entry("Fog", "🌫️")),
    (48, entry("Rime fog", "🌫️")),
    (51, entry("Light drizzle", "🌦️")),
    (61, entry("Rain", "🌧️")),
    (71, entry("Snow", "❄️")),
    (95, entry("Thunderstorm", "⛈️")),
];

const fn entry(description: &'static str, icon: &'static str) -> WeatherCodeEntry {
    WeatherCodeEntry { description, icon }
}

static STANDARD_TABLE: LazyLock<WeatherCodeTable> = LazyLock::new(WeatherCodeTable::standard);

/// Immutable WMO code lookup. Codes missing from the table resolve to
/// [`UNKNOWN_ENTRY`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherCodeTable {
    entries: BTreeMap<i32, WeatherCodeEntry>,
}

impl WeatherCodeTable {
    pub fn standard() -> Self {
        Self::from_entries(STANDARD_ENTRIES)
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (i32, WeatherCodeEntry)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn describe(&self, code: i32) -> WeatherCodeEntry {
        self.entries.get(&code).copied().unwrap_or(UNKNOWN_ENTRY)
    }

    pub fn codes(&self) -> impl Iterator<Item = i32> + '_ {
        self.entries.keys().copied()
    }
}

pub fn describe(code: i32) -> WeatherCodeEntry {
    STANDARD_TABLE.describe(code)
}
