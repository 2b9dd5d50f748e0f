//! Dashboard state containers.
//!
//! Each store holds the latest value for one panel and exposes it through
//! [`Store`]: `data()` to read, `refresh()` to refetch. A failed refresh is
//! logged and leaves the previous value in place.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;

use crate::{Config, FetchError, client::ProxyClient, provider::SunriseSunset};

pub mod rainfall;
pub mod sun;
pub mod weather;

pub use rainfall::RainfallForecastStore;
pub use sun::SunTimesStore;
pub use weather::WeatherForecastStore;

#[async_trait]
pub trait Store: Send + Sync {
    type Data: Clone + Send;

    /// Snapshot of the currently held value.
    fn data(&self) -> Self::Data;

    /// Refetch and replace the held value. Errors are logged, never returned.
    async fn refresh(&self);
}

/// Ordering token handed out when a refresh starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug)]
struct Slot<T> {
    value: T,
    committed: u64,
}

/// Value holder with a sequence-number guard.
///
/// A result is only committed if no later-issued ticket has committed yet,
/// so overlapping refreshes resolve in issue order, not completion order.
#[derive(Debug)]
pub struct StoreCell<T> {
    slot: RwLock<Slot<T>>,
    issued: AtomicU64,
}

impl<T: Clone> StoreCell<T> {
    pub fn new(initial: T) -> Self {
        Self { slot: RwLock::new(Slot { value: initial, committed: 0 }), issued: AtomicU64::new(0) }
    }

    pub fn get(&self) -> T {
        self.slot.read().value.clone()
    }

    pub fn ticket(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Returns `false` when the result was superseded and dropped.
    pub fn commit(&self, ticket: Ticket, value: T) -> bool {
        let mut slot = self.slot.write();
        if ticket.0 <= slot.committed {
            return false;
        }
        slot.value = value;
        slot.committed = ticket.0;
        true
    }

    /// Take a ticket, await `fetch`, and commit or log the outcome.
    pub(crate) async fn refresh_with<Fut>(&self, what: &'static str, fetch: Fut)
    where
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let ticket = self.ticket();
        match fetch.await {
            Ok(value) => {
                if !self.commit(ticket, value) {
                    tracing::debug!(?ticket, "Dropping superseded {what} result");
                }
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    kind = ?err.kind(),
                    provider = err.provider(),
                    "Error fetching {what}"
                );
            }
        }
    }
}

impl<T: Clone + Default> Default for StoreCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// The three dashboard panels, wired the way the display uses them:
/// forecast and rainfall through the proxy, sun times straight from the provider.
#[derive(Debug)]
pub struct Dashboard {
    pub weather: WeatherForecastStore,
    pub rainfall: RainfallForecastStore,
    pub sun: SunTimesStore,
}

impl Dashboard {
    pub fn from_config(config: &Config, http: Client) -> anyhow::Result<Self> {
        let proxy = Arc::new(ProxyClient::from_config(config, http.clone()));
        let sun = Arc::new(SunriseSunset::from_config(config, http));

        Ok(Self {
            weather: WeatherForecastStore::new(proxy.clone(), config.location),
            rainfall: RainfallForecastStore::new(proxy, config.location),
            sun: SunTimesStore::new(sun, config.location, config.sun_conversion()?),
        })
    }

    pub async fn refresh_all(&self) {
        tokio::join!(self.weather.refresh(), self.rainfall.refresh(), self.sun.refresh());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[test]
    fn later_ticket_wins_regardless_of_completion_order() {
        let cell = StoreCell::new(Vec::<u32>::new());
        let first = cell.ticket();
        let second = cell.ticket();

        assert!(cell.commit(second, vec![2]));
        assert!(!cell.commit(first, vec![1]));
        assert_eq!(cell.get(), vec![2]);
    }

    #[test]
    fn in_order_completion_replaces_wholesale() {
        let cell = StoreCell::new(vec![0]);
        let first = cell.ticket();
        let second = cell.ticket();

        assert!(cell.commit(first, vec![1, 1]));
        assert!(cell.commit(second, vec![2]));
        assert_eq!(cell.get(), vec![2]);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_value() {
        let cell = StoreCell::new(vec![7]);

        cell.refresh_with("test data", async { Err(FetchError::upstream("test", "boom")) }).await;
        assert_eq!(cell.get(), vec![7]);

        cell.refresh_with("test data", async { Ok(vec![8, 9]) }).await;
        assert_eq!(cell.get(), vec![8, 9]);
    }

    #[tokio::test]
    async fn overlapping_refreshes_keep_the_later_issued_result() {
        let cell = StoreCell::new(Vec::<u32>::new());
        let (older_tx, older_rx) = oneshot::channel::<Vec<u32>>();
        let (newer_tx, newer_rx) = oneshot::channel::<Vec<u32>>();

        let older = cell.refresh_with("test data", async move { Ok::<_, FetchError>(older_rx.await.unwrap()) });
        let newer = cell.refresh_with("test data", async move { Ok::<_, FetchError>(newer_rx.await.unwrap()) });
        tokio::pin!(older);
        tokio::pin!(newer);

        // Poll each once so they take their tickets in this order and park on their gates.
        tokio::select! {
            biased;
            _ = &mut older => panic!("older refresh finished before its gate opened"),
            _ = std::future::ready(()) => {}
        }
        tokio::select! {
            biased;
            _ = &mut newer => panic!("newer refresh finished before its gate opened"),
            _ = std::future::ready(()) => {}
        }

        newer_tx.send(vec![2]).unwrap();
        newer.await;
        assert_eq!(cell.get(), vec![2]);

        older_tx.send(vec![1]).unwrap();
        older.await;
        assert_eq!(cell.get(), vec![2]);
    }
}
