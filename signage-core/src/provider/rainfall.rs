use async_trait::async_trait;
use reqwest::Client;

use crate::{Config, FetchError, model::RainfallQuery};

use super::{ProviderId, Upstream, get_json_text};

const PLACE_URL: &str = "https://map.yahooapis.jp/weather/V1/place";

/// Yahoo! JAPAN precipitation forecast for a coordinate.
#[derive(Debug, Clone)]
pub struct YahooRainfall {
    api_key: String,
    base_url: String,
    http: Client,
}

impl YahooRainfall {
    pub fn new(api_key: String, http: Client) -> Self {
        Self { api_key, base_url: PLACE_URL.to_string(), http }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn from_config(config: &Config, http: Client) -> anyhow::Result<Self> {
        let id = ProviderId::Rainfall;
        let api_key = config.provider_api_key(id).ok_or_else(|| {
            anyhow::anyhow!(
                "No API key configured for provider '{id}'.\n\
                 Hint: run `signage configure {id}` or set {}.",
                crate::config::RAINFALL_API_KEY_ENV
            )
        })?;

        let provider = Self::new(api_key.to_owned(), http);
        Ok(match config.provider_base_url(id) {
            Some(url) => provider.with_base_url(url),
            None => provider,
        })
    }
}

#[async_trait]
impl Upstream<RainfallQuery> for YahooRainfall {
    async fn fetch_raw(&self, query: &RainfallQuery) -> Result<String, FetchError> {
        get_json_text(
            &self.http,
            ProviderId::Rainfall.label(),
            &self.base_url,
            &[
                ("appid", self.api_key.as_str()),
                ("coordinates", query.coordinates.as_str()),
                ("output", "json"),
                ("date", query.date.as_str()),
            ],
        )
        .await
    }
}
