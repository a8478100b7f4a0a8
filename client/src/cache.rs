//! Keyed cache of fetched collections with a declared invalidation-dependency
//! graph: a mutation invalidates the source key(s) it changed, and every view
//! derived from those keys is dropped along with them. No call site lists
//! derived keys by hand, so a new mutation cannot forget one.

use std::sync::Mutex;
use tilescore_types::{Player, PlayerStats, Round, Session};
use tracing::debug;

/// The cached collections.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewKey {
    Players,
    Rounds,
    Standings,
    Statistics,
    Sessions,
}

impl ViewKey {
    pub const ALL: [ViewKey; 5] = [
        ViewKey::Players,
        ViewKey::Rounds,
        ViewKey::Standings,
        ViewKey::Statistics,
        ViewKey::Sessions,
    ];

    /// Views that must drop their cached value whenever this key changes.
    /// Standings and statistics are derived from players and rounds; nothing
    /// is derived from the derived views or from the session list.
    pub const fn dependents(self) -> &'static [ViewKey] {
        match self {
            ViewKey::Players | ViewKey::Rounds => &[ViewKey::Standings, ViewKey::Statistics],
            ViewKey::Standings | ViewKey::Statistics | ViewKey::Sessions => &[],
        }
    }
}

#[derive(Default)]
struct Slots {
    players: Option<Vec<Player>>,
    rounds: Option<Vec<Round>>,
    standings: Option<Vec<Player>>,
    statistics: Option<Vec<PlayerStats>>,
    sessions: Option<Vec<Session>>,
}

impl Slots {
    fn clear(&mut self, key: ViewKey) {
        match key {
            ViewKey::Players => self.players = None,
            ViewKey::Rounds => self.rounds = None,
            ViewKey::Standings => self.standings = None,
            ViewKey::Statistics => self.statistics = None,
            ViewKey::Sessions => self.sessions = None,
        }
    }

    fn contains(&self, key: ViewKey) -> bool {
        match key {
            ViewKey::Players => self.players.is_some(),
            ViewKey::Rounds => self.rounds.is_some(),
            ViewKey::Standings => self.standings.is_some(),
            ViewKey::Statistics => self.statistics.is_some(),
            ViewKey::Sessions => self.sessions.is_some(),
        }
    }
}

/// The only shared mutable client-side state. Components read it and
/// invalidate it through [`ViewCache::invalidate`]; nothing writes a slot
/// outside the fetch that fills it.
#[derive(Default)]
pub struct ViewCache {
    slots: Mutex<Slots>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn players(&self) -> Option<Vec<Player>> {
        self.slots.lock().unwrap().players.clone()
    }

    pub fn store_players(&self, players: Vec<Player>) {
        self.slots.lock().unwrap().players = Some(players);
    }

    pub fn rounds(&self) -> Option<Vec<Round>> {
        self.slots.lock().unwrap().rounds.clone()
    }

    pub fn store_rounds(&self, rounds: Vec<Round>) {
        self.slots.lock().unwrap().rounds = Some(rounds);
    }

    pub fn standings(&self) -> Option<Vec<Player>> {
        self.slots.lock().unwrap().standings.clone()
    }

    pub fn store_standings(&self, standings: Vec<Player>) {
        self.slots.lock().unwrap().standings = Some(standings);
    }

    pub fn statistics(&self) -> Option<Vec<PlayerStats>> {
        self.slots.lock().unwrap().statistics.clone()
    }

    pub fn store_statistics(&self, statistics: Vec<PlayerStats>) {
        self.slots.lock().unwrap().statistics = Some(statistics);
    }

    pub fn sessions(&self) -> Option<Vec<Session>> {
        self.slots.lock().unwrap().sessions.clone()
    }

    pub fn store_sessions(&self, sessions: Vec<Session>) {
        self.slots.lock().unwrap().sessions = Some(sessions);
    }

    pub fn contains(&self, key: ViewKey) -> bool {
        self.slots.lock().unwrap().contains(key)
    }

    /// Drop `key` and, transitively, everything derived from it. The next
    /// read of a dropped key refetches from the service.
    pub fn invalidate(&self, key: ViewKey) {
        let mut slots = self.slots.lock().unwrap();
        let mut pending = vec![key];
        while let Some(key) = pending.pop() {
            debug!(?key, "invalidating cached view");
            slots.clear(key);
            pending.extend(key.dependents());
        }
    }

    /// Drop every cached view. Used when the active session changes: the
    /// entire ledger addressed by every key has changed identity.
    pub fn invalidate_all(&self) {
        debug!("invalidating all cached views");
        let mut slots = self.slots.lock().unwrap();
        for key in ViewKey::ALL {
            slots.clear(key);
        }
    }
}
