use serde::{Deserialize, Serialize};

/// Current conditions for one city, as reported by the "today" feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub temperature: f64,
    pub humidity: i32,
    pub weather_description: String,
}

/// One day of a city's forecast.
///
/// `date` is kept as the label the feed sends (`YYYY-MM-DD`); ordering always
/// follows feed order. `temperature_min <= temperature_max` is not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: String,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub weather_description: String,
}

impl ForecastDay {
    /// Mid-point of the day's min and max temperature.
    pub fn average(&self) -> f64 {
        (self.temperature_min + self.temperature_max) / 2.0
    }
}

/// Case-folded city name used for every city comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CityKey(String);

impl CityKey {
    pub fn new(city: &str) -> Self {
        Self(city.to_lowercase())
    }
}
