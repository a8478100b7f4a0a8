//! Request and response payloads of the scoreboard service.

use crate::PlayerId;
use serde::{Deserialize, Serialize};

/// Payload for `POST players`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreatePlayer {
    pub name: String,
    pub color: String,
}

/// Partial update for `PATCH players/{id}`. Fields left as `None` are not
/// touched by the service.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UpdatePlayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_path: Option<String>,
}

impl UpdatePlayer {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn color(color: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
            ..Self::default()
        }
    }
}

/// Response of `GET players/{id}/locked`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct LockStatus {
    pub locked: bool,
}

/// Response of `POST players/{id}/avatar`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AvatarUploaded {
    pub avatar_path: String,
}

/// One (player, delta) pair of a round submission. Only non-zero deltas are
/// sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDelta {
    pub player_id: PlayerId,
    pub delta: i64,
}

/// Payload for `POST rounds`. The service rejects any submission whose deltas
/// do not sum to exactly zero.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateRound {
    pub scores: Vec<ScoreDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorder_id: Option<PlayerId>,
}

impl CreateRound {
    pub fn total(&self) -> i64 {
        self.scores.iter().map(|s| s.delta).sum()
    }
}

/// Payload for `POST admin/verify`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdminVerify {
    pub code: String,
}

/// Payload for `PATCH admin/code`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdminCodeChange {
    pub old_code: String,
    pub new_code: String,
}

/// Payload for `POST sessions`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateSession {
    pub name: String,
}

/// Payload for `PATCH sessions/{id}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RenameSession {
    pub name: String,
}

/// Bare acknowledgement returned by destructive endpoints.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_update_omits_unset_fields() {
        let update = UpdatePlayer::name("West");
        let raw = serde_json::to_string(&update).unwrap();
        assert_eq!(raw, r#"{"name":"West"}"#);

        let update = UpdatePlayer {
            avatar_path: Some("west.png".into()),
            ..UpdatePlayer::default()
        };
        let raw = serde_json::to_string(&update).unwrap();
        assert_eq!(raw, r#"{"avatar_path":"west.png"}"#);
    }

    #[test]
    fn create_round_omits_missing_recorder() {
        let round = CreateRound {
            scores: vec![
                ScoreDelta {
                    player_id: PlayerId(1),
                    delta: 5000,
                },
                ScoreDelta {
                    player_id: PlayerId(3),
                    delta: -5000,
                },
            ],
            recorder_id: None,
        };
        assert_eq!(round.total(), 0);
        let raw = serde_json::to_string(&round).unwrap();
        assert!(!raw.contains("recorder_id"));

        let raw = serde_json::to_string(&CreateRound {
            recorder_id: Some(PlayerId(2)),
            ..round
        })
        .unwrap();
        assert!(raw.contains(r#""recorder_id":2"#));
    }
}
