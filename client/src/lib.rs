pub mod auth;
pub mod cache;
pub mod client;
pub mod entry;
pub mod ledger;
pub mod players;
pub mod recorder;
pub mod scoreboard;
pub mod sessions;
pub mod settings;
pub mod standings;


pub use auth::{AuthorizationGate, GateState, GatedAction, VerifyOutcome};
pub use cache::{ViewCache, ViewKey};
pub use client::{Client, RetryPolicy};
pub use entry::ScoreEntry;
pub use ledger::{LedgerMatrix, LedgerRow, RoundLedger};
pub use players::{DeleteOutcome, PlayerRegistry};
pub use recorder::RecorderLock;
pub use scoreboard::Scoreboard;
pub use sessions::Sessions;
pub use settings::SettingsStore;
pub use standings::{Poller, Views, DEFAULT_POLL_INTERVAL};

use thiserror::Error;

/// Error type for client operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("failed: {status}: {body}")]
    FailedWithBody {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid URL scheme: {0} (expected http or https)")]
    InvalidScheme(String),
    #[error("settings io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings encode error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no recorder is locked")]
    NoRecorder,
    #[error("a recorder is already locked")]
    RecorderAlreadyLocked,
    #[error("round deltas sum to {total}, expected 0")]
    UnbalancedRound { total: i64 },
    #[error("round has no non-zero delta")]
    EmptyRound,
    #[error("name is empty")]
    EmptyName,
    #[error("an authorization challenge is already pending")]
    GateBusy,
    #[error("no authorization challenge is pending")]
    GateIdle,
    #[error("admin code rejected")]
    CodeRejected,
    #[error("no round to undo")]
    EmptyLedger,
    #[error("refusing to delete the active session")]
    ActiveSession,
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
