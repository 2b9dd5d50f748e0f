use async_trait::async_trait;
use reqwest::Client;

use crate::{Config, FetchError, model::SunQuery};

use super::{ProviderId, Upstream, get_json_text};

const SUN_URL: &str = "https://api.sunrise-sunset.org/json";
const TZID: &str = "Asia/Tokyo";

/// sunrise-sunset.org, queried for ISO 8601 (`formatted=0`) times.
#[derive(Debug, Clone)]
pub struct SunriseSunset {
    base_url: String,
    http: Client,
}

impl SunriseSunset {
    pub fn new(http: Client) -> Self {
        Self { base_url: SUN_URL.to_string(), http }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn from_config(config: &Config, http: Client) -> Self {
        let provider = Self::new(http);
        match config.provider_base_url(ProviderId::SunTimes) {
            Some(url) => provider.with_base_url(url),
            None => provider,
        }
    }
}

#[async_trait]
impl Upstream<SunQuery> for SunriseSunset {
    async fn fetch_raw(&self, query: &SunQuery) -> Result<String, FetchError> {
        let lat = query.latitude.to_string();
        let lng = query.longitude.to_string();

        get_json_text(
            &self.http,
            ProviderId::SunTimes.label(),
            &self.base_url,
            &[("lat", lat.as_str()), ("lng", lng.as_str()), ("formatted", "0"), ("tzid", TZID)],
        )
        .await
    }
}
