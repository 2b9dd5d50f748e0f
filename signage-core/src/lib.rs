//! Core library for the signage weather display.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The upstream weather providers behind a single `Upstream` seam
//! - The HTTP proxy that relays rainfall and forecast JSON
//! - Dashboard stores that flatten provider JSON into display records
//!
//! It is used by `signage-cli`, but the proxy router can be mounted by any axum service.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod proxy;
pub mod store;
pub mod time;

pub use client::ProxyClient;
pub use config::{Config, ProviderConfig};
pub use error::{ErrorKind, FetchError};
pub use model::{Coordinate, ForecastPoint, RainfallPoint, RainfallQuery, SunQuery, SunTimes, WeatherQuery};
pub use provider::{ProviderId, Providers, Upstream};
pub use proxy::{ProxyState, router};
pub use store::{Dashboard, Store};
