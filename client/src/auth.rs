//! One-shot secret verification guarding destructive or privileged actions.
//!
//! Every gated action opens its own challenge; success never leaves a
//! session-wide "unlocked" state behind.

use crate::{Client, Error, Result};
use std::sync::{Arc, Mutex};
use tilescore_types::{PlayerId, RoundId};
use tracing::debug;

/// The privileged actions a challenge can guard. Carrying the action through
/// the gate (instead of an arbitrary callback) keeps the gate reusable and
/// lets the caller dispatch on what was actually authorized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatedAction {
    UnlockRecorder,
    DeletePlayer(PlayerId),
    UndoRound(RoundId),
    ResetGame,
    ChangeAdminCode { new_code: String },
}

/// Observable gate state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateState {
    Idle,
    /// A challenge is pending. `failed` is set after a rejected attempt and
    /// cleared by the next one; the challenge stays open for retry.
    Challenging { failed: bool },
}

/// Result of submitting a code for the pending challenge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The code checked out. The gate is idle again and `action` must now be
    /// dispatched by the caller; `code` is the secret that verified (the
    /// change-code action needs it as the old code).
    Verified { action: GatedAction, code: String },
    /// Wrong code. The challenge stays open for another attempt.
    Rejected,
}

#[derive(Default)]
struct Inner {
    pending: Option<GatedAction>,
    failed: bool,
}

/// At most one challenge exists at a time; a second `challenge` while one is
/// pending fails with [`Error::GateBusy`] instead of silently replacing it.
pub struct AuthorizationGate {
    client: Arc<Client>,
    inner: Mutex<Inner>,
}

impl AuthorizationGate {
    pub fn new(client: Arc<Client>) -> Self {
        Self {
            client,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn state(&self) -> GateState {
        let inner = self.inner.lock().unwrap();
        match inner.pending {
            Some(_) => GateState::Challenging {
                failed: inner.failed,
            },
            None => GateState::Idle,
        }
    }

    /// Open a challenge for `action`.
    pub fn challenge(&self, action: GatedAction) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.pending.is_some() {
            return Err(Error::GateBusy);
        }
        debug!(?action, "opening authorization challenge");
        inner.pending = Some(action);
        inner.failed = false;
        Ok(())
    }

    /// Abandon the pending challenge, returning the action it guarded.
    pub fn cancel(&self) -> Option<GatedAction> {
        let mut inner = self.inner.lock().unwrap();
        inner.failed = false;
        inner.pending.take()
    }

    /// Submit `code` for the pending challenge. On success the gate returns
    /// to idle and hands the authorized action back; on a wrong code the
    /// challenge stays open with the failed flag set; on a transport error
    /// the gate is left untouched.
    pub async fn verify(&self, code: &str) -> Result<VerifyOutcome> {
        let action = {
            let inner = self.inner.lock().unwrap();
            inner.pending.clone().ok_or(Error::GateIdle)?
        };

        if !self.client.verify_admin(code).await? {
            let mut inner = self.inner.lock().unwrap();
            inner.failed = true;
            return Ok(VerifyOutcome::Rejected);
        }

        let mut inner = self.inner.lock().unwrap();
        inner.pending = None;
        inner.failed = false;
        debug!(?action, "authorization challenge verified");
        Ok(VerifyOutcome::Verified {
            action,
            code: code.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> AuthorizationGate {
        // No request is sent by the paths under test.
        let client = Arc::new(Client::new("http://127.0.0.1:9").unwrap());
        AuthorizationGate::new(client)
    }

    #[test]
    fn second_challenge_is_refused() {
        let gate = gate();
        gate.challenge(GatedAction::ResetGame).unwrap();
        let err = gate.challenge(GatedAction::UnlockRecorder).unwrap_err();
        assert!(matches!(err, Error::GateBusy));
        // The original challenge is untouched.
        assert_eq!(gate.cancel(), Some(GatedAction::ResetGame));
    }

    #[test]
    fn cancel_returns_to_idle() {
        let gate = gate();
        assert_eq!(gate.state(), GateState::Idle);
        gate.challenge(GatedAction::DeletePlayer(PlayerId(4))).unwrap();
        assert_eq!(gate.state(), GateState::Challenging { failed: false });

        assert_eq!(gate.cancel(), Some(GatedAction::DeletePlayer(PlayerId(4))));
        assert_eq!(gate.state(), GateState::Idle);
        assert_eq!(gate.cancel(), None);
    }

    #[tokio::test]
    async fn verify_without_challenge_is_an_error() {
        let gate = gate();
        let err = gate.verify("8888").await.unwrap_err();
        assert!(matches!(err, Error::GateIdle));
    }

    #[tokio::test]
    async fn transport_error_leaves_challenge_pending() {
        let gate = gate();
        gate.challenge(GatedAction::ResetGame).unwrap();
        // Nothing listens on the client's address.
        gate.verify("8888").await.unwrap_err();
        assert_eq!(gate.state(), GateState::Challenging { failed: false });
    }
}
