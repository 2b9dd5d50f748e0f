use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::{
    FetchError,
    model::{Coordinate, SunQuery, SunTimes},
    provider::Upstream,
    time::LocalTimeConversion,
};

use super::{Store, StoreCell};

const SOURCE: &str = "sun times";

#[derive(Debug, Deserialize)]
struct SunResponse {
    results: SunResults,
}

#[derive(Debug, Deserialize)]
struct SunResults {
    sunrise: DateTime<FixedOffset>,
    sunset: DateTime<FixedOffset>,
}

/// Today's sunrise and sunset, empty until the first successful fetch.
#[derive(Debug)]
pub struct SunTimesStore {
    source: Arc<dyn Upstream<SunQuery>>,
    location: Coordinate,
    conversion: LocalTimeConversion,
    cell: StoreCell<Option<SunTimes>>,
}

impl SunTimesStore {
    pub fn new(
        source: Arc<dyn Upstream<SunQuery>>,
        location: Coordinate,
        conversion: LocalTimeConversion,
    ) -> Self {
        Self { source, location, conversion, cell: StoreCell::default() }
    }

    pub async fn fetch(&self) -> Result<SunTimes, FetchError> {
        let raw = self.source.fetch_raw(&SunQuery::from(self.location)).await?;
        tracing::debug!(body = %raw, "sun times response");
        parse_sun_times(&raw, &self.conversion)
    }

    pub fn sunrise(&self) -> Option<DateTime<FixedOffset>> {
        self.data().map(|t| t.sunrise)
    }

    pub fn sunset(&self) -> Option<DateTime<FixedOffset>> {
        self.data().map(|t| t.sunset)
    }
}

#[async_trait]
impl Store for SunTimesStore {
    type Data = Option<SunTimes>;

    fn data(&self) -> Option<SunTimes> {
        self.cell.get()
    }

    async fn refresh(&self) {
        self.cell.refresh_with("sun times", async { self.fetch().await.map(Some) }).await;
    }
}

/// Accepts only `status == "OK"`; anything else is an upstream error.
pub fn parse_sun_times(raw: &str, conversion: &LocalTimeConversion) -> Result<SunTimes, FetchError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| FetchError::upstream(SOURCE, format!("body is not JSON: {e}")))?;

    let status = value
        .get("status")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| FetchError::shape(SOURCE, "missing status"))?;
    if status != "OK" {
        return Err(FetchError::upstream(SOURCE, format!("status {status}")));
    }

    let SunResponse { results } =
        serde_json::from_value(value).map_err(|e| FetchError::shape(SOURCE, e.to_string()))?;

    Ok(SunTimes {
        sunrise: conversion.apply(results.sunrise),
        sunset: conversion.apply(results.sunset),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[derive(Debug)]
    struct Canned(&'static str);

    #[async_trait]
    impl Upstream<SunQuery> for Canned {
        async fn fetch_raw(&self, _query: &SunQuery) -> Result<String, FetchError> {
            Ok(self.0.to_string())
        }
    }

    const OK: &str = r#"{
        "results": {
            "sunrise": "2024-01-01T06:47:12+09:00",
            "sunset": "2024-01-01T16:38:40+09:00",
            "solar_noon": "2024-01-01T11:42:56+09:00",
            "day_length": 35488
        },
        "status": "OK",
        "tzid": "Asia/Tokyo"
    }"#;

    fn store(body: &'static str) -> SunTimesStore {
        SunTimesStore::new(Arc::new(Canned(body)), Coordinate::default(), LocalTimeConversion::default())
    }

    #[test]
    fn parses_ok_response_unchanged_in_jst() {
        let times = parse_sun_times(OK, &LocalTimeConversion::default()).unwrap();
        assert_eq!(times.sunrise.to_rfc3339(), "2024-01-01T06:47:12+09:00");
        assert_eq!(times.sunset.to_rfc3339(), "2024-01-01T16:38:40+09:00");
    }

    #[test]
    fn configured_offset_is_applied() {
        let utc = LocalTimeConversion::parse("+00:00").unwrap();
        let times = parse_sun_times(OK, &utc).unwrap();
        assert_eq!(times.sunrise.to_rfc3339(), "2023-12-31T21:47:12+00:00");
    }

    #[test]
    fn non_ok_status_is_upstream_error() {
        let err = parse_sun_times(r#"{"results":"","status":"INVALID_REQUEST"}"#, &LocalTimeConversion::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamError);
        assert!(err.to_string().contains("INVALID_REQUEST"));
    }

    #[tokio::test]
    async fn non_ok_status_leaves_initial_empty_state() {
        let s = store(r#"{"results":"","status":"INVALID_TZID"}"#);
        s.refresh().await;
        assert!(s.data().is_none());
        assert!(s.sunrise().is_none());
    }

    #[tokio::test]
    async fn non_ok_status_leaves_prior_value() {
        let s = SunTimesStore {
            cell: StoreCell::new(Some(parse_sun_times(OK, &LocalTimeConversion::default()).unwrap())),
            ..store(r#"{"status":"UNKNOWN_ERROR"}"#)
        };
        let before = s.data();

        s.refresh().await;

        assert_eq!(s.data(), before);
        assert!(before.is_some());
    }

    #[tokio::test]
    async fn ok_status_replaces_value() {
        let s = store(OK);
        s.refresh().await;
        assert_eq!(s.sunset().unwrap().to_rfc3339(), "2024-01-01T16:38:40+09:00");
    }
}
