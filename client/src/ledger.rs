use crate::{auth::GatedAction, cache::ViewKey, AuthorizationGate, Client, Error, Result, ViewCache};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tilescore_types::{Player, PlayerId, Round, RoundId};
use tracing::info;

/// One row of the ledger matrix: a committed round projected onto the full
/// player roster.
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerRow {
    pub round: RoundId,
    pub recorder: Option<PlayerId>,
    pub created_at: DateTime<Utc>,
    /// One cell per column. `None` marks a player who sat the round out — a
    /// neutral placeholder, not a zero.
    pub cells: Vec<Option<i64>>,
}

/// The round history as a table: one column per currently known player in
/// stable id order, one row per round, newest first.
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerMatrix {
    pub columns: Vec<Player>,
    pub rows: Vec<LedgerRow>,
}

/// Read view over committed rounds, plus "undo last".
pub struct RoundLedger {
    client: Arc<Client>,
    cache: Arc<ViewCache>,
    gate: Arc<AuthorizationGate>,
}

impl RoundLedger {
    pub fn new(client: Arc<Client>, cache: Arc<ViewCache>, gate: Arc<AuthorizationGate>) -> Self {
        Self {
            client,
            cache,
            gate,
        }
    }

    /// The committed rounds, newest first (service order), cached until the
    /// next invalidation.
    pub async fn list(&self) -> Result<Vec<Round>> {
        if let Some(rounds) = self.cache.rounds() {
            return Ok(rounds);
        }
        let rounds = self.client.list_rounds().await?;
        self.cache.store_rounds(rounds.clone());
        Ok(rounds)
    }

    /// Project the round list onto the current roster. Column order is the
    /// registry's stable id order, independent of who participated in any
    /// given round.
    pub async fn matrix(&self) -> Result<LedgerMatrix> {
        let rounds = self.list().await?;
        let mut columns = self.roster().await?;
        columns.sort_by_key(|p| p.id);

        let rows = rounds
            .iter()
            .map(|round| LedgerRow {
                round: round.id,
                recorder: round.recorder_id,
                created_at: round.created_at,
                cells: columns.iter().map(|p| round.delta_for(p.id)).collect(),
            })
            .collect();
        Ok(LedgerMatrix { columns, rows })
    }

    /// Whether "undo last" is available at all.
    pub async fn can_undo(&self) -> Result<bool> {
        Ok(!self.list().await?.is_empty())
    }

    /// Open an authorization challenge to delete the most recent round — and
    /// only that one; rounds are otherwise immutable. Returns the round that
    /// will be deleted once the challenge verifies.
    pub async fn request_undo(&self) -> Result<RoundId> {
        let rounds = self.list().await?;
        let Some(latest) = rounds.first() else {
            return Err(Error::EmptyLedger);
        };
        self.gate.challenge(GatedAction::UndoRound(latest.id))?;
        Ok(latest.id)
    }

    /// Delete `round`. Called on a verified undo.
    pub(crate) async fn undo(&self, round: RoundId) -> Result<()> {
        self.client.delete_round(round).await?;
        info!(%round, "round undone");
        self.cache.invalidate(ViewKey::Rounds);
        Ok(())
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
    use tilescore_types::RoundScore;

    fn player(id: u64) -> Player {
        Player {
            id: PlayerId(id),
            name: format!("p{id}"),
            color: "#808080".into(),
            avatar_path: None,
            score: 0,
        }
    }

    fn round(id: u64, scores: &[(u64, i64)]) -> Round {
        Round {
            id: RoundId(id),
            recorder_id: None,
            recorder_ip: None,
            created_at: "2026-03-01T12:00:00Z".parse().unwrap(),
            scores: scores
                .iter()
                .map(|(player_id, delta)| RoundScore {
                    player_id: PlayerId(*player_id),
                    player_name: format!("p{player_id}"),
                    delta: *delta,
                })
                .collect(),
        }
    }

    fn fixture() -> (RoundLedger, Arc<ViewCache>) {
        let client = Arc::new(Client::new("http://127.0.0.1:9").unwrap());
        let cache = Arc::new(ViewCache::new());
        let gate = Arc::new(AuthorizationGate::new(client.clone()));
        (
            RoundLedger::new(client, cache.clone(), gate),
            cache,
        )
    }

    #[tokio::test]
    async fn matrix_places_non_participants_as_placeholders() {
        let (ledger, cache) = fixture();
        // Roster deliberately stored out of id order.
        cache.store_players(vec![player(3), player(1), player(2)]);
        cache.store_rounds(vec![
            round(11, &[(1, -2000), (3, 2000)]),
            round(10, &[(1, 8000), (2, -8000)]),
        ]);

        let matrix = ledger.matrix().await.unwrap();
        let ids: Vec<_> = matrix.columns.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        assert_eq!(matrix.rows.len(), 2);
        assert_eq!(matrix.rows[0].round, RoundId(11));
        assert_eq!(matrix.rows[0].cells, vec![Some(-2000), None, Some(2000)]);
        assert_eq!(matrix.rows[1].cells, vec![Some(8000), Some(-8000), None]);
    }

    #[tokio::test]
    async fn undo_is_unavailable_on_an_empty_ledger() {
        let (ledger, cache) = fixture();
        cache.store_rounds(vec![]);

        assert!(!ledger.can_undo().await.unwrap());
        assert!(matches!(
            ledger.request_undo().await,
            Err(Error::EmptyLedger)
        ));
    }

    #[tokio::test]
    async fn request_undo_targets_the_newest_round() {
        let (ledger, cache) = fixture();
        cache.store_rounds(vec![
            round(12, &[(1, 1000), (2, -1000)]),
            round(11, &[(1, 500), (2, -500)]),
        ]);

        // Newest-first service order: the first element is the undo target.
        assert_eq!(ledger.request_undo().await.unwrap(), RoundId(12));
    }
}
