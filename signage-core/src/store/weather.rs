use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    FetchError,
    model::{Coordinate, ForecastPoint, WeatherQuery},
    provider::Upstream,
};

use super::{Store, StoreCell};

const SOURCE: &str = "weather forecast";

#[derive(Debug, Deserialize)]
struct HourlyResponse {
    hourly: Hourly,
}

#[derive(Debug, Deserialize)]
struct Hourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    weather_code: Vec<Option<i32>>,
}

/// Hourly temperature and weather code for the configured location.
#[derive(Debug)]
pub struct WeatherForecastStore {
    source: Arc<dyn Upstream<WeatherQuery>>,
    location: Coordinate,
    cell: StoreCell<Vec<ForecastPoint>>,
}

impl WeatherForecastStore {
    pub fn new(source: Arc<dyn Upstream<WeatherQuery>>, location: Coordinate) -> Self {
        Self { source, location, cell: StoreCell::default() }
    }

    /// One fetch-and-flatten without touching the held state.
    pub async fn fetch(&self) -> Result<Vec<ForecastPoint>, FetchError> {
        let raw = self.source.fetch_raw(&WeatherQuery::from(self.location)).await?;
        tracing::debug!(body = %raw, "weather forecast response");
        flatten_hourly(&raw)
    }
}

#[async_trait]
impl Store for WeatherForecastStore {
    type Data = Vec<ForecastPoint>;

    fn data(&self) -> Vec<ForecastPoint> {
        self.cell.get()
    }

    async fn refresh(&self) {
        self.cell.refresh_with("weather forecast data", self.fetch()).await;
    }
}

/// Zip `hourly.time`, `hourly.temperature_2m` and `hourly.weather_code` by index.
///
/// The three arrays must be the same length. A `null` temperature or code
/// keeps its hour with that field empty.
pub fn flatten_hourly(raw: &str) -> Result<Vec<ForecastPoint>, FetchError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| FetchError::upstream(SOURCE, format!("body is not JSON: {e}")))?;

    let HourlyResponse { hourly } =
        serde_json::from_value(value).map_err(|e| FetchError::shape(SOURCE, e.to_string()))?;

    let n = hourly.time.len();
    if hourly.temperature_2m.len() != n || hourly.weather_code.len() != n {
        return Err(FetchError::shape(
            SOURCE,
            format!(
                "hourly arrays differ in length (time={}, temperature_2m={}, weather_code={})",
                n,
                hourly.temperature_2m.len(),
                hourly.weather_code.len()
            ),
        ));
    }

    let gaps = hourly.temperature_2m.iter().filter(|t| t.is_none()).count()
        + hourly.weather_code.iter().filter(|c| c.is_none()).count();
    if gaps > 0 {
        tracing::warn!(gaps, hours = n, "weather forecast has hours without a value");
    }

    Ok(hourly
        .time
        .into_iter()
        .zip(hourly.temperature_2m)
        .zip(hourly.weather_code)
        .map(|((time, temperature), weather_code)| ForecastPoint { time, temperature, weather_code })
        .collect())
}
