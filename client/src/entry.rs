use crate::{cache::ViewKey, Client, Error, RecorderLock, Result, ViewCache};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tilescore_types::{
    api::{CreateRound, ScoreDelta},
    Player, PlayerId, Round,
};
use tracing::{debug, info};

/// Validates and submits a round. Holds the in-progress delta buffer; every
/// edit requires the recorder lock, and nothing leaves this buffer except
/// through [`ScoreEntry::submit`].
pub struct ScoreEntry {
    client: Arc<Client>,
    cache: Arc<ViewCache>,
    recorder: Arc<RecorderLock>,
    deltas: Mutex<BTreeMap<PlayerId, i64>>,
}

impl ScoreEntry {
    pub fn new(client: Arc<Client>, cache: Arc<ViewCache>, recorder: Arc<RecorderLock>) -> Self {
        Self {
            client,
            cache,
            recorder,
            deltas: Mutex::new(BTreeMap::new()),
        }
    }

    /// Enter a delta for `player`. Refused while no recorder is locked.
    pub fn set_delta(&self, player: PlayerId, delta: i64) -> Result<()> {
        if !self.recorder.is_locked() {
            return Err(Error::NoRecorder);
        }
        self.deltas.lock().unwrap().insert(player, delta);
        Ok(())
    }

    /// Remove the entry for `player`, back to "unset" (distinct from zero for
    /// auto-balance eligibility, identical for submission).
    pub fn clear_delta(&self, player: PlayerId) -> Result<()> {
        if !self.recorder.is_locked() {
            return Err(Error::NoRecorder);
        }
        self.deltas.lock().unwrap().remove(&player);
        Ok(())
    }

    /// Discard every entered delta.
    pub fn clear(&self) {
        self.deltas.lock().unwrap().clear();
    }

    pub fn deltas(&self) -> BTreeMap<PlayerId, i64> {
        self.deltas.lock().unwrap().clone()
    }

    /// Running total of the entered deltas. A submittable buffer totals zero.
    pub fn total(&self) -> i64 {
        self.deltas.lock().unwrap().values().sum()
    }

    /// Assign the negative of the running total to the first player (in
    /// registry order) with no entry or a zero entry, making the total zero.
    /// A no-op when no non-zero delta has been entered yet or every player
    /// already has one. Returns the balanced player, if any. The value stays
    /// editable afterward; this is a convenience, not a correctness check.
    pub async fn auto_balance(&self) -> Result<Option<PlayerId>> {
        if !self.recorder.is_locked() {
            return Err(Error::NoRecorder);
        }
        let roster = self.roster().await?;

        let mut deltas = self.deltas.lock().unwrap();
        if !deltas.values().any(|delta| *delta != 0) {
            return Ok(None);
        }
        let total: i64 = deltas.values().sum();
        let Some(target) = roster
            .iter()
            .find(|p| deltas.get(&p.id).copied().unwrap_or(0) == 0)
        else {
            return Ok(None);
        };
        debug!(player = %target.id, delta = -total, "auto-balancing");
        deltas.insert(target.id, -total);
        Ok(Some(target.id))
    }

    /// Commit the entered round. Fails locally, without a request, unless a
    /// recorder is locked, the deltas sum to exactly zero, and at least one
    /// non-zero delta exists. Sends only the non-zero pairs plus the recorder
    /// identity; on success clears the buffer and invalidates the round
    /// views.
    pub async fn submit(&self) -> Result<Round> {
        let Some(recorder) = self.recorder.current() else {
            return Err(Error::NoRecorder);
        };
        let scores = {
            let deltas = self.deltas.lock().unwrap();
            let total: i64 = deltas.values().sum();
            if total != 0 {
                return Err(Error::UnbalancedRound { total });
            }
            let scores: Vec<ScoreDelta> = deltas
                .iter()
                .filter(|(_, delta)| **delta != 0)
                .map(|(player_id, delta)| ScoreDelta {
                    player_id: *player_id,
                    delta: *delta,
                })
                .collect();
            if scores.is_empty() {
                return Err(Error::EmptyRound);
            }
            scores
        };

        let request = CreateRound {
            scores,
            recorder_id: Some(recorder),
        };
        let round = self.client.create_round(&request).await?;
        info!(round = %round.id, %recorder, "round committed");

        self.deltas.lock().unwrap().clear();
        self.cache.invalidate(ViewKey::Rounds);
        Ok(round)
    }

    async fn roster(&self) -> Result<Vec<Player>> {
        if let Some(players) = self.cache.players() {
            return Ok(players);
        }
        let players = self.client.list_players().await?;
        self.cache.store_players(players.clone());
        Ok(players)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuthorizationGate, SettingsStore};
    use tempfile::TempDir;

    fn player(id: u64) -> Player {
        Player {
            id: PlayerId(id),
            name: format!("p{id}"),
            color: "#808080".into(),
            avatar_path: None,
            score: 0,
        }
    }

    struct Fixture {
        entry: ScoreEntry,
        recorder: Arc<RecorderLock>,
        cache: Arc<ViewCache>,
        _dir: TempDir,
    }

    /// An entry wired to an unreachable service: every assertion below must
    /// hold without a single request going out.
    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let client = Arc::new(Client::new("http://127.0.0.1:9").unwrap());
        let cache = Arc::new(ViewCache::new());
        let settings = Arc::new(SettingsStore::open(dir.path().join("settings.json")));
        let gate = Arc::new(AuthorizationGate::new(client.clone()));
        let recorder = Arc::new(RecorderLock::new(settings, gate));
        let entry = ScoreEntry::new(client, cache.clone(), recorder.clone());
        Fixture {
            entry,
            recorder,
            cache,
            _dir: dir,
        }
    }

    #[test]
    fn edits_require_a_recorder() {
        let fx = fixture();
        assert!(matches!(
            fx.entry.set_delta(PlayerId(1), 8000),
            Err(Error::NoRecorder)
        ));
        assert!(matches!(
            fx.entry.clear_delta(PlayerId(1)),
            Err(Error::NoRecorder)
        ));

        fx.recorder.lock(PlayerId(1)).unwrap();
        fx.entry.set_delta(PlayerId(1), 8000).unwrap();
        assert_eq!(fx.entry.total(), 8000);
    }

    #[tokio::test]
    async fn submit_requires_a_recorder() {
        let fx = fixture();
        assert!(matches!(fx.entry.submit().await, Err(Error::NoRecorder)));
    }

    #[tokio::test]
    async fn unbalanced_submit_is_rejected_locally() {
        let fx = fixture();
        fx.recorder.lock(PlayerId(1)).unwrap();
        fx.entry.set_delta(PlayerId(1), 5000).unwrap();
        fx.entry.set_delta(PlayerId(2), -4000).unwrap();

        // An unreachable service would surface as a transport error; the
        // validation error proves no request was attempted.
        match fx.entry.submit().await {
            Err(Error::UnbalancedRound { total }) => assert_eq!(total, 1000),
            other => panic!("expected UnbalancedRound, got {other:?}"),
        }
        // The buffer is left as entered.
        assert_eq!(fx.entry.total(), 1000);
    }

    #[tokio::test]
    async fn all_zero_submit_is_rejected_locally() {
        let fx = fixture();
        fx.recorder.lock(PlayerId(1)).unwrap();
        fx.entry.set_delta(PlayerId(1), 0).unwrap();
        fx.entry.set_delta(PlayerId(2), 0).unwrap();
        assert!(matches!(fx.entry.submit().await, Err(Error::EmptyRound)));
    }

    #[tokio::test]
    async fn auto_balance_assigns_first_open_slot() {
        let fx = fixture();
        fx.recorder.lock(PlayerId(1)).unwrap();
        fx.cache
            .store_players(vec![player(1), player(2), player(3), player(4)]);

        fx.entry.set_delta(PlayerId(1), 5000).unwrap();
        fx.entry.set_delta(PlayerId(2), -3000).unwrap();

        let balanced = fx.entry.auto_balance().await.unwrap();
        assert_eq!(balanced, Some(PlayerId(3)));
        assert_eq!(fx.entry.deltas()[&PlayerId(3)], -2000);
        assert_eq!(fx.entry.total(), 0);
    }

    #[tokio::test]
    async fn auto_balance_treats_zero_entries_as_open() {
        let fx = fixture();
        fx.recorder.lock(PlayerId(1)).unwrap();
        fx.cache
            .store_players(vec![player(1), player(2), player(3)]);

        fx.entry.set_delta(PlayerId(1), 0).unwrap();
        fx.entry.set_delta(PlayerId(2), 4000).unwrap();

        let balanced = fx.entry.auto_balance().await.unwrap();
        assert_eq!(balanced, Some(PlayerId(1)));
        assert_eq!(fx.entry.deltas()[&PlayerId(1)], -4000);
        assert_eq!(fx.entry.total(), 0);
    }

    #[tokio::test]
    async fn auto_balance_without_nonzero_entry_is_a_noop() {
        let fx = fixture();
        fx.recorder.lock(PlayerId(1)).unwrap();
        fx.cache.store_players(vec![player(1), player(2)]);

        assert_eq!(fx.entry.auto_balance().await.unwrap(), None);
        fx.entry.set_delta(PlayerId(1), 0).unwrap();
        assert_eq!(fx.entry.auto_balance().await.unwrap(), None);
        assert!(fx.entry.deltas().values().all(|d| *d == 0));
    }

    #[tokio::test]
    async fn auto_balance_with_every_slot_taken_is_a_noop() {
        let fx = fixture();
        fx.recorder.lock(PlayerId(1)).unwrap();
        fx.cache.store_players(vec![player(1), player(2)]);

        fx.entry.set_delta(PlayerId(1), 5000).unwrap();
        fx.entry.set_delta(PlayerId(2), -3000).unwrap();

        assert_eq!(fx.entry.auto_balance().await.unwrap(), None);
        assert_eq!(fx.entry.total(), 2000);
    }
}
