use crate::{auth::GatedAction, AuthorizationGate, Error, Result, SettingsStore};
use std::sync::Arc;
use tilescore_types::PlayerId;
use tracing::debug;

/// Tracks the single player currently authorized to submit rounds. The lock
/// value lives in the settings store, so it survives a restart; it has no
/// expiry and is only released through the authorization gate.
pub struct RecorderLock {
    settings: Arc<SettingsStore>,
    gate: Arc<AuthorizationGate>,
}

impl RecorderLock {
    pub fn new(settings: Arc<SettingsStore>, gate: Arc<AuthorizationGate>) -> Self {
        Self { settings, gate }
    }

    pub fn current(&self) -> Option<PlayerId> {
        self.settings.recorder()
    }

    pub fn is_locked(&self) -> bool {
        self.current().is_some()
    }

    /// Take the lock for `player`. Only callable while unlocked; switching
    /// recorders goes through [`RecorderLock::request_unlock`] first.
    pub fn lock(&self, player: PlayerId) -> Result<()> {
        if self.is_locked() {
            return Err(Error::RecorderAlreadyLocked);
        }
        debug!(%player, "locking recorder");
        self.settings.set_recorder(Some(player))
    }

    /// Open an authorization challenge to release the lock. The lock itself
    /// is untouched until the challenge verifies.
    pub fn request_unlock(&self) -> Result<()> {
        if !self.is_locked() {
            return Err(Error::NoRecorder);
        }
        self.gate.challenge(GatedAction::UnlockRecorder)
    }

    /// Clear the lock and its persisted value. Called on a verified unlock.
    pub(crate) fn release(&self) -> Result<()> {
        debug!("releasing recorder lock");
        self.settings.set_recorder(None)
    }
}
