pub mod api;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum display-name length accepted by the service.
pub const MAX_NAME_LENGTH: usize = 100;

/// Palette assigned to players created without an explicit color, in creation
/// order (wrapping around once exhausted).
pub const DEFAULT_COLORS: [&str; 20] = [
    "#E6194B", "#3CB44B", "#FFE119", "#4363D8", "#F58231", "#911EB4", "#46F0F0", "#F032E6",
    "#BCF60C", "#FABEBE", "#008080", "#E6BEFF", "#9A6324", "#FFFAC8", "#800000", "#AAFFC3",
    "#808000", "#FFD8B1", "#000075", "#808080",
];

/// Palette color for the `index`-th created player.
pub fn default_color(index: usize) -> &'static str {
    DEFAULT_COLORS[index % DEFAULT_COLORS.len()]
}

/// Identifier of a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a committed round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(pub u64);

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a session (an isolated ledger).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered player. `score` is derived by the service: the sum of all
/// deltas attributed to the player across committed rounds in the active
/// session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    pub avatar_path: Option<String>,
    pub score: i64,
}

/// One (player, delta) line of a committed round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundScore {
    pub player_id: PlayerId,
    pub player_name: String,
    pub delta: i64,
}

/// A committed round. Immutable once created; only whole-round deletion of the
/// most recent round is permitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub recorder_id: Option<PlayerId>,
    /// Recorded by the service from the submitting connection; never sent by
    /// a client.
    pub recorder_ip: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Participating players only. Invariant: deltas sum to zero.
    pub scores: Vec<RoundScore>,
}

impl Round {
    /// Sum of this round's deltas. Zero for any round the service accepted.
    pub fn total(&self) -> i64 {
        self.scores.iter().map(|s| s.delta).sum()
    }

    /// Delta attributed to `player`, or `None` if the player sat this round
    /// out (a non-entry, not a zero).
    pub fn delta_for(&self, player: PlayerId) -> Option<i64> {
        self.scores
            .iter()
            .find(|s| s.player_id == player)
            .map(|s| s.delta)
    }
}

/// An independent ledger. Exactly one session is active at a time; all player
/// and round reads/writes address the active session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub round_count: u64,
}

/// Per-player aggregate computed by the service. Players without any recorded
/// round are omitted entirely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub name: String,
    pub color: String,
    pub rounds: u64,
    /// Share of rounds with a positive delta, in percent.
    pub win_rate: f64,
    pub avg: f64,
    pub best: i64,
    pub worst: i64,
}

/// Supported display locales.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    pub fn as_tag(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Zh => "zh",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "en" => Some(Locale::En),
            "zh" => Some(Locale::Zh),
            _ => None,
        }
    }

    /// The other supported locale.
    pub fn toggled(self) -> Self {
        match self {
            Locale::En => Locale::Zh,
            Locale::Zh => Locale::En,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_parses_service_shape() {
        let raw = r#"{
            "id": 7,
            "recorder_id": 2,
            "recorder_ip": "10.0.0.4",
            "created_at": "2026-03-01T18:22:05Z",
            "scores": [
                {"player_id": 1, "player_name": "East", "delta": 8000},
                {"player_id": 2, "player_name": "South", "delta": -8000}
            ]
        }"#;
        let round: Round = serde_json::from_str(raw).unwrap();
        assert_eq!(round.id, RoundId(7));
        assert_eq!(round.recorder_id, Some(PlayerId(2)));
        assert_eq!(round.total(), 0);
        assert_eq!(round.delta_for(PlayerId(1)), Some(8000));
        assert_eq!(round.delta_for(PlayerId(3)), None);
    }

    #[test]
    fn player_without_avatar_parses() {
        let raw =
            r##"{"id": 1, "name": "East", "color": "#E6194B", "avatar_path": null, "score": -1200}"##;
        let player: Player = serde_json::from_str(raw).unwrap();
        assert_eq!(player.avatar_path, None);
        assert_eq!(player.score, -1200);
    }

    #[test]
    fn locale_tags_round_trip() {
        for locale in [Locale::En, Locale::Zh] {
            assert_eq!(Locale::from_tag(locale.as_tag()), Some(locale));
        }
        assert_eq!(Locale::from_tag("fr"), None);
        assert_eq!(Locale::En.toggled(), Locale::Zh);
        assert_eq!(Locale::Zh.toggled(), Locale::En);
    }

    #[test]
    fn locale_serializes_as_tag() {
        assert_eq!(serde_json::to_string(&Locale::Zh).unwrap(), r#""zh""#);
        let parsed: Locale = serde_json::from_str(r#""en""#).unwrap();
        assert_eq!(parsed, Locale::En);
    }

    #[test]
    fn palette_wraps() {
        assert_eq!(default_color(0), DEFAULT_COLORS[0]);
        assert_eq!(default_color(DEFAULT_COLORS.len()), DEFAULT_COLORS[0]);
        assert_eq!(default_color(DEFAULT_COLORS.len() + 3), DEFAULT_COLORS[3]);
    }
}
