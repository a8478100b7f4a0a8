use crate::{Client, Result, ViewCache};
use std::sync::Arc;
use std::time::Duration;
use tilescore_types::{Player, PlayerStats};
use tokio::time::MissedTickBehavior;
use tracing::warn;

/// Poll cadence of the standings view. There is no push channel; another
/// client's writes become visible at this interval at the latest.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// The derived read views: standings and statistics are computed by the
/// service and displayed verbatim — the client only schedules refetches.
pub struct Views {
    client: Arc<Client>,
    cache: Arc<ViewCache>,
}

impl Views {
    pub fn new(client: Arc<Client>, cache: Arc<ViewCache>) -> Self {
        Self { client, cache }
    }

    /// The player list with derived running scores, score-descending
    /// (service order), cached until the next invalidation or poll.
    pub async fn standings(&self) -> Result<Vec<Player>> {
        if let Some(standings) = self.cache.standings() {
            return Ok(standings);
        }
        let standings = self.client.standings().await?;
        self.cache.store_standings(standings.clone());
        Ok(standings)
    }

    /// Per-player aggregates, win-rate-descending (service order). Refreshes
    /// only on invalidation — statistics have no poller.
    pub async fn statistics(&self) -> Result<Vec<PlayerStats>> {
        if let Some(statistics) = self.cache.statistics() {
            return Ok(statistics);
        }
        let statistics = self.client.statistics().await?;
        self.cache.store_statistics(statistics.clone());
        Ok(statistics)
    }

    /// Refresh standings on a fixed interval, on top of invalidation-driven
    /// refetches. A failed poll keeps the previous value and is retried at
    /// the next tick.
    pub fn spawn_poller(&self, interval: Duration) -> Poller {
        let client = self.client.clone();
        let cache = self.cache.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; the caller has usually just
            // fetched, so skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match client.standings().await {
                    Ok(standings) => cache.store_standings(standings),
                    Err(err) => warn!(error = %err, "standings poll failed"),
                }
            }
        });
        Poller { _handle: handle }
    }
}

/// Background standings refresh; the task is aborted when this is dropped.
pub struct Poller {
    _handle: tokio::task::JoinHandle<()>,
}

impl Drop for Poller {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
