use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use serde::Deserialize;

use crate::{
    FetchError,
    model::{Coordinate, RainfallPoint, RainfallQuery},
    provider::Upstream,
    time::format_rainfall_date,
};

use super::{Store, StoreCell};

const SOURCE: &str = "rainfall forecast";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PlaceResponse {
    feature: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Feature {
    property: Property,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Property {
    weather_list: WeatherList,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WeatherList {
    weather: Vec<WeatherEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WeatherEntry {
    date: String,
    rainfall: f64,
}

/// Short-term precipitation for the configured location.
#[derive(Debug)]
pub struct RainfallForecastStore {
    source: Arc<dyn Upstream<RainfallQuery>>,
    location: Coordinate,
    cell: StoreCell<Vec<RainfallPoint>>,
}

impl RainfallForecastStore {
    pub fn new(source: Arc<dyn Upstream<RainfallQuery>>, location: Coordinate) -> Self {
        Self { source, location, cell: StoreCell::default() }
    }

    pub fn query_at<Tz>(&self, now: &DateTime<Tz>) -> RainfallQuery
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        RainfallQuery { coordinates: self.location.lon_lat(), date: format_rainfall_date(now) }
    }

    /// Refresh as of `now`; [`Store::refresh`] uses the local clock.
    pub async fn refresh_at<Tz>(&self, now: &DateTime<Tz>)
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let query = self.query_at(now);
        self.cell.refresh_with("rainfall forecast data", self.fetch_query(query)).await;
    }

    async fn fetch_query(&self, query: RainfallQuery) -> Result<Vec<RainfallPoint>, FetchError> {
        let raw = self.source.fetch_raw(&query).await?;
        tracing::debug!(body = %raw, "rainfall forecast response");
        flatten_weather_list(&raw)
    }
}

#[async_trait]
impl Store for RainfallForecastStore {
    type Data = Vec<RainfallPoint>;

    fn data(&self) -> Vec<RainfallPoint> {
        self.cell.get()
    }

    async fn refresh(&self) {
        let now = Local::now();
        self.refresh_at(&now).await;
    }
}

/// Map `Feature[0].Property.WeatherList.Weather[]` to `{date, rainfall}`.
pub fn flatten_weather_list(raw: &str) -> Result<Vec<RainfallPoint>, FetchError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| FetchError::upstream(SOURCE, format!("body is not JSON: {e}")))?;

    let place: PlaceResponse =
        serde_json::from_value(value).map_err(|e| FetchError::shape(SOURCE, e.to_string()))?;

    let feature = place
        .feature
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::shape(SOURCE, "Feature is empty"))?;

    Ok(feature
        .property
        .weather_list
        .weather
        .into_iter()
        .map(|w| RainfallPoint { date: w.date, rainfall: w.rainfall })
        .collect())
}
