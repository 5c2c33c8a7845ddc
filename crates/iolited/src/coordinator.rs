//! Holder of the latest hub snapshot.
//!
//! Readers load the `Arc`, the writer stores a new one and then bumps the
//! generation on a watch channel. A subscriber woken by the watch channel
//! therefore always finds the new snapshot in place.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::watch;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::hub::HubClient;
use crate::hub::HubError;
use crate::hub::Snapshot;

/// Shortest polling interval `run` will use
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct Coordinator {
    snapshot: ArcSwap<Snapshot>,
    generation: watch::Sender<u64>,
}

impl Coordinator {
    pub fn new(initial: Snapshot) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            snapshot: ArcSwap::from_pointee(initial),
            generation,
        }
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    /// Number of snapshots published since creation.
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Subscribe to refresh notifications.
    ///
    /// Notifications coalesce: a slow subscriber wakes once and sees the
    /// latest generation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    /// Replace the snapshot and notify subscribers.
    pub fn publish(&self, snapshot: Snapshot) {
        self.snapshot.store(Arc::new(snapshot));
        self.generation.send_modify(|g| *g += 1);
        debug!("Published snapshot generation {}", self.generation());
    }

    /// Fetch a fresh snapshot and publish it.
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn refresh<C: HubClient + ?Sized>(&self, client: &C) -> Result<(), HubError> {
        let snapshot = client.fetch_snapshot().await?;
        debug!("Fetched snapshot with {} rooms", snapshot.len());
        self.publish(snapshot);
        Ok(())
    }

    /// Refresh on a fixed interval until `shutdown` flips to true.
    ///
    /// Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
    pub async fn run<C: HubClient + ?Sized>(
        &self,
        client: &C,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        if interval < MIN_POLL_INTERVAL {
            warn!(
                "Poll interval {:?} is too short, using {:?}",
                interval, MIN_POLL_INTERVAL
            );
        }
        let interval = interval.max(MIN_POLL_INTERVAL);
        info!("Coordinator polling every {:?}", interval);

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; the caller has already done
        // the initial refresh.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.refresh(client).await {
                        warn!("Failed to refresh hub snapshot: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Coordinator stopped");
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(Snapshot::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::MockHubClient;
    use crate::hub::Room;

    fn snapshot_with_room(id: &str, name: &str) -> Snapshot {
        let mut snapshot = Snapshot::new();
        snapshot.insert(
            id.to_string(),
            Room {
                identifier: id.to_string(),
                name: name.to_string(),
                devices: Default::default(),
            },
        );
        snapshot
    }

    #[test]
    fn test_publish_replaces_snapshot() {
        let coordinator = Coordinator::default();
        assert!(coordinator.snapshot().is_empty());
        assert_eq!(coordinator.generation(), 0);

        let before = coordinator.snapshot();
        coordinator.publish(snapshot_with_room("room1", "Kitchen"));

        assert_eq!(coordinator.generation(), 1);
        assert_eq!(coordinator.snapshot()["room1"].name, "Kitchen");
        // Earlier readers keep the snapshot they loaded.
        assert!(before.is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_new_snapshot() {
        let coordinator = Coordinator::default();
        let mut rx = coordinator.subscribe();

        coordinator.publish(snapshot_with_room("room1", "Kitchen"));

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 1);
        assert!(coordinator.snapshot().contains_key("room1"));
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_previous_snapshot() {
        let client = MockHubClient::new();
        client.push_snapshot(snapshot_with_room("room1", "Kitchen"));
        client.push_error("connection refused");

        let coordinator = Coordinator::default();
        coordinator.refresh(&client).await.unwrap();
        assert!(coordinator.refresh(&client).await.is_err());

        assert_eq!(coordinator.generation(), 1);
        assert_eq!(coordinator.snapshot()["room1"].name, "Kitchen");
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let client = MockHubClient::new();
        client.push_snapshot(snapshot_with_room("room1", "Kitchen"));

        let coordinator = Arc::new(Coordinator::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .run(&client, Duration::from_millis(10), shutdown_rx)
                    .await;
            })
        };

        let mut rx = coordinator.subscribe();
        rx.changed().await.unwrap();
        assert!(coordinator.snapshot().contains_key("room1"));

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_run_with_zero_interval_is_clamped() {
        let client = MockHubClient::new();
        let coordinator = Coordinator::default();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        shutdown_tx.send(true).unwrap();

        coordinator
            .run(&client, Duration::ZERO, shutdown_rx)
            .await;
        assert_eq!(coordinator.generation(), 0);
    }
}
