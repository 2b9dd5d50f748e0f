use async_trait::async_trait;
use reqwest::Client;

use crate::{
    Config, FetchError,
    model::{RainfallQuery, WeatherQuery},
    provider::{Upstream, get_json_text},
};

/// Dashboard-side access to the proxy's `/weather` and `/rainfall` endpoints.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    base_url: String,
    http: Client,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self { base_url: base_url.into(), http }
    }

    pub fn from_config(config: &Config, http: Client) -> Self {
        Self::new(config.proxy_base_url(), http)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl Upstream<WeatherQuery> for ProxyClient {
    async fn fetch_raw(&self, query: &WeatherQuery) -> Result<String, FetchError> {
        get_json_text(&self.http, "weather proxy", &self.endpoint("weather"), query).await
    }
}

#[async_trait]
impl Upstream<RainfallQuery> for ProxyClient {
    async fn fetch_raw(&self, query: &RainfallQuery) -> Result<String, FetchError> {
        get_json_text(&self.http, "rainfall proxy", &self.endpoint("rainfall"), query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = ProxyClient::new("https://example.test/site/region/api/", Client::new());
        assert_eq!(client.endpoint("weather"), "https://example.test/site/region/api/weather");
    }

    #[tokio::test]
    async fn weather_query_is_sent_to_proxy_path() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .and(query_param("latitude", "35.72748611"))
            .and(query_param("longitude", "140.05344722"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"hourly":{}}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ProxyClient::new(format!("{}/api", mock_server.uri()), Client::new());
        let query = WeatherQuery { latitude: "35.72748611".into(), longitude: "140.05344722".into() };

        let raw = Upstream::<WeatherQuery>::fetch_raw(&client, &query).await.unwrap();
        assert_eq!(raw, r#"{"hourly":{}}"#);
    }

    #[tokio::test]
    async fn proxy_500_text_is_upstream_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rainfall"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Error fetching weather data"))
            .mount(&mock_server)
            .await;

        let client = ProxyClient::new(mock_server.uri(), Client::new());
        let err = Upstream::<RainfallQuery>::fetch_raw(&client, &RainfallQuery::default()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UpstreamError);
        assert!(err.to_string().contains("500"));
    }
}
