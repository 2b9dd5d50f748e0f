use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Fixed location the display reports on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// `"lon,lat"`, the order the rainfall provider expects.
    pub fn lon_lat(&self) -> String {
        format!("{},{}", self.longitude, self.latitude)
    }
}

impl Default for Coordinate {
    fn default() -> Self {
        Self { latitude: 35.72748611, longitude: 140.05344722 }
    }
}

/// One hour of the temperature forecast.
///
/// The provider reports an hour it has no value for as `null`; that hour is
/// kept with the missing field as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    pub time: String,
    pub temperature: Option<f64>,
    pub weather_code: Option<i32>,
}

/// One interval of the precipitation forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainfallPoint {
    pub date: String,
    pub rainfall: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunTimes {
    pub sunrise: DateTime<FixedOffset>,
    pub sunset: DateTime<FixedOffset>,
}

/// Query accepted by `/rainfall` and forwarded to the rainfall provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RainfallQuery {
    #[serde(default)]
    pub coordinates: String,
    #[serde(default)]
    pub date: String,
}

/// Query accepted by `/weather` and forwarded to the forecast provider.
///
/// Values stay strings: the proxy relays whatever the caller sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherQuery {
    #[serde(default)]
    pub latitude: String,
    #[serde(default)]
    pub longitude: String,
}

impl From<Coordinate> for WeatherQuery {
    fn from(c: Coordinate) -> Self {
        Self { latitude: c.latitude.to_string(), longitude: c.longitude.to_string() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunQuery {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Coordinate> for SunQuery {
    fn from(c: Coordinate) -> Self {
        Self { latitude: c.latitude, longitude: c.longitude }
    }
}
