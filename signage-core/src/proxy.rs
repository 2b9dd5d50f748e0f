//! HTTP proxy in front of the rainfall and forecast providers.
//!
//! Both endpoints relay the provider's JSON byte-for-byte. Any failure turns
//! into a 500 with a fixed text body; provider output never reaches the
//! caller on that path.

use std::{future::Future, sync::Arc};

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::{
    FetchError,
    model::{RainfallQuery, WeatherQuery},
    provider::{Providers, Upstream},
};

pub const ERROR_BODY: &str = "Error fetching weather data";

#[derive(Debug, Clone)]
pub struct ProxyState {
    pub rainfall: Arc<dyn Upstream<RainfallQuery>>,
    pub forecast: Arc<dyn Upstream<WeatherQuery>>,
}

impl ProxyState {
    pub fn new(
        rainfall: Arc<dyn Upstream<RainfallQuery>>,
        forecast: Arc<dyn Upstream<WeatherQuery>>,
    ) -> Self {
        Self { rainfall, forecast }
    }
}

impl From<&Providers> for ProxyState {
    fn from(p: &Providers) -> Self {
        Self::new(p.rainfall.clone(), p.forecast.clone())
    }
}

/// Provider JSON passed through untouched.
#[derive(Debug)]
pub struct RawJson(pub String);

impl IntoResponse for RawJson {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "application/json")], self.0).into_response()
    }
}

/// Everything that can fail while serving a proxy request.
///
/// All variants answer with the same 500 and [`ERROR_BODY`].
#[derive(Debug)]
pub enum ProxyError {
    Fetch(FetchError),
    /// The query string could not be read, e.g. a parameter given twice.
    Query(QueryRejection),
}

impl From<FetchError> for ProxyError {
    fn from(err: FetchError) -> Self {
        Self::Fetch(err)
    }
}

impl From<QueryRejection> for ProxyError {
    fn from(err: QueryRejection) -> Self {
        Self::Query(err)
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match &self {
            ProxyError::Fetch(err) => tracing::error!(
                error = %err,
                kind = ?err.kind(),
                provider = err.provider(),
                "Error fetching weather data"
            ),
            ProxyError::Query(err) => {
                tracing::error!(error = %err, "Error fetching weather data: unreadable query string")
            }
        }
        (StatusCode::INTERNAL_SERVER_ERROR, ERROR_BODY).into_response()
    }
}

pub type ProxyResult<T> = Result<T, ProxyError>;

pub(crate) async fn rainfall_handler(
    State(state): State<ProxyState>,
    query: Result<Query<RainfallQuery>, QueryRejection>,
) -> ProxyResult<RawJson> {
    let Query(query) = query?;
    tracing::info!(coordinates = %query.coordinates, date = %query.date, "Fetching rainfall data");
    let body = state.rainfall.fetch_raw(&query).await?;
    Ok(RawJson(body))
}

pub(crate) async fn weather_handler(
    State(state): State<ProxyState>,
    query: Result<Query<WeatherQuery>, QueryRejection>,
) -> ProxyResult<RawJson> {
    let Query(query) = query?;
    tracing::info!(latitude = %query.latitude, longitude = %query.longitude, "Fetching weather data");
    let body = state.forecast.fetch_raw(&query).await?;
    Ok(RawJson(body))
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub(crate) async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/rainfall", get(rainfall_handler))
        .route("/weather", get(weather_handler))
        .route("/healthz", get(healthz_handler))
        .with_state(state)
}

/// Serve the proxy on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: ProxyState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "weather proxy listening");
    }

    axum::serve(listener, router(state)).with_graceful_shutdown(shutdown).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use parking_lot::Mutex;
    use tower::ServiceExt;

    #[derive(Debug, Default)]
    struct Recorder {
        seen: Mutex<Vec<RainfallQuery>>,
        weather_seen: Mutex<Vec<WeatherQuery>>,
    }

    #[async_trait]
    impl Upstream<RainfallQuery> for Recorder {
        async fn fetch_raw(&self, query: &RainfallQuery) -> Result<String, FetchError> {
            self.seen.lock().push(query.clone());
            Ok(r#"{"Feature":[{"Name":"b"}],"ResultInfo":{"Count":1}}"#.to_string())
        }
    }

    #[async_trait]
    impl Upstream<WeatherQuery> for Recorder {
        async fn fetch_raw(&self, query: &WeatherQuery) -> Result<String, FetchError> {
            self.weather_seen.lock().push(query.clone());
            Ok(r#"{"hourly":{"time":[]}}"#.to_string())
        }
    }

    #[derive(Debug)]
    struct Failing;

    #[async_trait]
    impl Upstream<WeatherQuery> for Failing {
        async fn fetch_raw(&self, _query: &WeatherQuery) -> Result<String, FetchError> {
            Err(FetchError::upstream("test", r#"status 502: {"secret":"upstream detail"}"#))
        }
    }

    #[async_trait]
    impl Upstream<RainfallQuery> for Failing {
        async fn fetch_raw(&self, _query: &RainfallQuery) -> Result<String, FetchError> {
            Err(FetchError::shape("test", "unused"))
        }
    }

    async fn body_string(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn rainfall_relays_body_verbatim() {
        let recorder = Arc::new(Recorder::default());
        let app = router(ProxyState::new(recorder.clone(), Arc::new(Failing)));

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/rainfall?coordinates=140.0,35.7&date=202401010900")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body_string(resp).await, r#"{"Feature":[{"Name":"b"}],"ResultInfo":{"Count":1}}"#);

        let seen = recorder.seen.lock();
        assert_eq!(
            *seen,
            vec![RainfallQuery { coordinates: "140.0,35.7".into(), date: "202401010900".into() }]
        );
    }

    #[tokio::test]
    async fn missing_params_are_forwarded_empty() {
        let recorder = Arc::new(Recorder::default());
        let app = router(ProxyState::new(recorder.clone(), Arc::new(Failing)));

        let resp = app
            .oneshot(Request::builder().uri("/rainfall").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(recorder.seen.lock()[0], RainfallQuery::default());
    }

    #[tokio::test]
    async fn weather_failure_is_500_without_upstream_detail() {
        let app = router(ProxyState::new(Arc::new(Recorder::default()), Arc::new(Failing)));

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/weather?latitude=35.7&longitude=140.0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(resp).await;
        assert_eq!(body, ERROR_BODY);
        assert!(!body.contains("secret"));
    }

    #[tokio::test]
    async fn repeated_parameter_is_500_with_fixed_body() {
        let recorder = Arc::new(Recorder::default());
        let app = router(ProxyState::new(recorder.clone(), recorder.clone()));

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/weather?latitude=1&latitude=2&longitude=3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(resp).await;
        assert_eq!(body, ERROR_BODY);
        assert!(!body.contains("duplicate"));
        assert!(recorder.weather_seen.lock().is_empty());
    }

    #[tokio::test]
    async fn repeated_rainfall_parameter_never_reaches_provider() {
        let recorder = Arc::new(Recorder::default());
        let app = router(ProxyState::new(recorder.clone(), recorder.clone()));

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/rainfall?coordinates=140.0,35.7&date=1&date=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(resp).await, ERROR_BODY);
        assert!(recorder.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let app = router(ProxyState::new(Arc::new(Failing), Arc::new(Failing)));

        let resp = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_string(resp).await, r#"{"status":"ok"}"#);
    }
}
