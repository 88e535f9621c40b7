//! Periodic staleness sweep.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use crate::hub::HubHandle;

/// Shortest accepted sweep period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Sweep stale vehicles every `interval` until the hub stops.
///
/// A zero interval is raised to 1 ms.
pub async fn run_sweeper(hub: HubHandle, interval: Duration) {
    let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; nothing can be stale yet.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match hub.sweep_stale().await {
            Ok(removed) if removed.is_empty() => trace!("Sweep found no stale vehicles"),
            Ok(removed) => debug!(count = removed.len(), ids = ?removed, "Sweep removed vehicles"),
            Err(e) => {
                debug!(error = %e, "Hub stopped, sweeper exiting");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HubConfig;
    use crate::hub::spawn_hub;
    use fleetcast_core::{now_ms, GeoPoint, VehiclePosition, VehicleType};

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_exits_when_hub_stops() {
        let (hub, join) = spawn_hub(HubConfig::default());
        let sweeper = tokio::spawn(run_sweeper(hub.clone(), Duration::from_secs(5)));

        hub.shutdown().await.unwrap();
        join.await.unwrap();
        tokio::time::timeout(Duration::from_secs(30), sweeper)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_still_sweeps() {
        let (hub, join) = spawn_hub(HubConfig::default());
        let stale = VehiclePosition::new(
            "ghost",
            VehicleType::Bus,
            GeoPoint::new(1.0, 1.0),
            10.0,
            0.0,
            now_ms() - 60_000,
        );
        hub.report_update(None, stale).await.unwrap();
        let sweeper = tokio::spawn(run_sweeper(hub.clone(), Duration::ZERO));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(hub.vehicle_count(), 0);

        hub.shutdown().await.unwrap();
        join.await.unwrap();
        // The task exits cleanly instead of panicking
        tokio::time::timeout(Duration::from_secs(1), sweeper)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_removes_stale_vehicle() {
        let (hub, _join) = spawn_hub(HubConfig::default());
        let stale = VehiclePosition::new(
            "ghost",
            VehicleType::Taxi,
            GeoPoint::new(1.0, 1.0),
            10.0,
            0.0,
            now_ms() - 60_000,
        );
        hub.report_update(None, stale).await.unwrap();
        tokio::spawn(run_sweeper(hub.clone(), Duration::from_secs(5)));

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(hub.vehicle_count(), 0);
    }
}
