use crate::{Config, FetchError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::{fmt::Debug, sync::Arc};

pub mod forecast;
pub mod rainfall;
pub mod sun;

pub use forecast::OpenMeteoForecast;
pub use rainfall::YahooRainfall;
pub use sun::SunriseSunset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Rainfall,
    Forecast,
    SunTimes,
}

impl ProviderId {
    /// Key used in the config file and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Rainfall => "rainfall",
            ProviderId::Forecast => "forecast",
            ProviderId::SunTimes => "suntimes",
        }
    }

    /// Name of the external service, used in logs and errors.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderId::Rainfall => "Yahoo rainfall API",
            ProviderId::Forecast => "Open-Meteo forecast API",
            ProviderId::SunTimes => "sunrise-sunset API",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::Rainfall)
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::Rainfall, ProviderId::Forecast, ProviderId::SunTimes]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "rainfall" => Ok(ProviderId::Rainfall),
            "forecast" => Ok(ProviderId::Forecast),
            "suntimes" => Ok(ProviderId::SunTimes),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: rainfall, forecast, suntimes."
            )),
        }
    }
}

/// A source of raw JSON for query `Q`.
///
/// Implemented by the external providers and by the proxy client, so the
/// proxy handlers and the stores never care which one they talk to.
#[async_trait]
pub trait Upstream<Q: Sync>: Send + Sync + Debug {
    /// Returns the response body, already checked to be well-formed JSON.
    async fn fetch_raw(&self, query: &Q) -> Result<String, FetchError>;
}

/// The three external providers, built from config around one HTTP client.
#[derive(Debug, Clone)]
pub struct Providers {
    pub rainfall: Arc<YahooRainfall>,
    pub forecast: Arc<OpenMeteoForecast>,
    pub sun: Arc<SunriseSunset>,
}

impl Providers {
    pub fn from_config(config: &Config, http: Client) -> anyhow::Result<Self> {
        Ok(Self {
            rainfall: Arc::new(YahooRainfall::from_config(config, http.clone())?),
            forecast: Arc::new(OpenMeteoForecast::from_config(config, http.clone())),
            sun: Arc::new(SunriseSunset::from_config(config, http)),
        })
    }
}

/// GET `url` with `query` and return the body if the call succeeded and the body is JSON.
pub(crate) async fn get_json_text<T>(
    http: &Client,
    provider: &'static str,
    url: &str,
    query: &T,
) -> Result<String, FetchError>
where
    T: Serialize + ?Sized,
{
    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|source| FetchError::Network { provider, source })?;

    let status = res.status();
    let body = res.text().await.map_err(|source| FetchError::Network { provider, source })?;

    if !status.is_success() {
        return Err(FetchError::upstream(
            provider,
            format!("status {}: {}", status, truncate_body(&body)),
        ));
    }

    ensure_json(provider, &body)?;
    Ok(body)
}

pub(crate) fn ensure_json(provider: &'static str, body: &str) -> Result<(), FetchError> {
    serde_json::from_str::<serde::de::IgnoredAny>(body)
        .map(|_| ())
        .map_err(|e| FetchError::upstream(provider, format!("body is not JSON ({e}): {}", truncate_body(body))))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
