use async_trait::async_trait;
use reqwest::Client;

use crate::{Config, FetchError, model::WeatherQuery};

use super::{ProviderId, Upstream, get_json_text};

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

const HOURLY_FIELDS: &str = "temperature_2m,weather_code";
const TIMEZONE: &str = "Asia/Tokyo";
const FORECAST_DAYS: &str = "3";
const PAST_DAYS: &str = "1";

/// Open-Meteo hourly temperature and weather code: yesterday plus three forecast days.
#[derive(Debug, Clone)]
pub struct OpenMeteoForecast {
    base_url: String,
    http: Client,
}

impl OpenMeteoForecast {
    pub fn new(http: Client) -> Self {
        Self { base_url: FORECAST_URL.to_string(), http }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn from_config(config: &Config, http: Client) -> Self {
        let provider = Self::new(http);
        match config.provider_base_url(ProviderId::Forecast) {
            Some(url) => provider.with_base_url(url),
            None => provider,
        }
    }
}

#[async_trait]
impl Upstream<WeatherQuery> for OpenMeteoForecast {
    async fn fetch_raw(&self, query: &WeatherQuery) -> Result<String, FetchError> {
        get_json_text(
            &self.http,
            ProviderId::Forecast.label(),
            &self.base_url,
            &[
                ("latitude", query.latitude.as_str()),
                ("longitude", query.longitude.as_str()),
                ("hourly", HOURLY_FIELDS),
                ("timezone", TIMEZONE),
                ("forecast_days", FORECAST_DAYS),
                ("past_days", PAST_DAYS),
            ],
        )
        .await
    }
}
