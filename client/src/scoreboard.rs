use crate::{
    auth::{GatedAction, VerifyOutcome},
    cache::ViewKey,
    AuthorizationGate, Client, Error, PlayerRegistry, RecorderLock, Result, RoundLedger,
    ScoreEntry, Sessions, SettingsStore, ViewCache, Views,
};
use std::path::PathBuf;
use std::sync::Arc;
use tilescore_types::Locale;
use tracing::info;

/// The assembled client: one gateway, one cache, one settings store, one
/// authorization gate, and the controllers wired to them. Also the place
/// where a verified gate challenge is dispatched to the component that
/// requested it.
pub struct Scoreboard {
    client: Arc<Client>,
    cache: Arc<ViewCache>,
    settings: Arc<SettingsStore>,
    gate: Arc<AuthorizationGate>,
    recorder: Arc<RecorderLock>,
    pub entry: ScoreEntry,
    pub players: PlayerRegistry,
    pub ledger: RoundLedger,
    pub sessions: Sessions,
    pub views: Views,
}

impl Scoreboard {
    pub fn new(base_url: &str, settings_path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::with_client(Client::new(base_url)?, settings_path))
    }

    pub fn with_client(client: Client, settings_path: impl Into<PathBuf>) -> Self {
        let client = Arc::new(client);
        let cache = Arc::new(ViewCache::new());
        let settings = Arc::new(SettingsStore::open(settings_path));
        let gate = Arc::new(AuthorizationGate::new(client.clone()));
        let recorder = Arc::new(RecorderLock::new(settings.clone(), gate.clone()));
        Self {
            entry: ScoreEntry::new(client.clone(), cache.clone(), recorder.clone()),
            players: PlayerRegistry::new(client.clone(), cache.clone(), gate.clone()),
            ledger: RoundLedger::new(client.clone(), cache.clone(), gate.clone()),
            sessions: Sessions::new(client.clone(), cache.clone()),
            views: Views::new(client.clone(), cache.clone()),
            client,
            cache,
            settings,
            gate,
            recorder,
        }
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    pub fn cache(&self) -> &Arc<ViewCache> {
        &self.cache
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    pub fn gate(&self) -> &Arc<AuthorizationGate> {
        &self.gate
    }

    pub fn recorder(&self) -> &Arc<RecorderLock> {
        &self.recorder
    }

    pub fn locale(&self) -> Locale {
        self.settings.locale()
    }

    pub fn set_locale(&self, locale: Locale) -> Result<()> {
        self.settings.set_locale(locale)
    }

    /// Open a challenge to clear the whole ledger of the active session.
    pub fn request_reset(&self) -> Result<()> {
        self.gate.challenge(GatedAction::ResetGame)
    }

    /// Open a challenge to rotate the admin secret. The code entered at the
    /// gate doubles as the old secret.
    pub fn request_change_code(&self, new_code: &str) -> Result<()> {
        self.gate.challenge(GatedAction::ChangeAdminCode {
            new_code: new_code.to_string(),
        })
    }

    /// Abandon the pending challenge, if any.
    pub fn cancel_admin(&self) -> Option<GatedAction> {
        self.gate.cancel()
    }

    /// Submit the entered admin code for the pending challenge and, on
    /// success, execute the action it guarded. `Ok(false)` means the code
    /// was rejected and the challenge is still open.
    pub async fn verify_admin(&self, code: &str) -> Result<bool> {
        match self.gate.verify(code).await? {
            VerifyOutcome::Rejected => Ok(false),
            VerifyOutcome::Verified { action, code } => {
                self.dispatch(action, &code).await?;
                Ok(true)
            }
        }
    }

    async fn dispatch(&self, action: GatedAction, code: &str) -> Result<()> {
        match action {
            GatedAction::UnlockRecorder => self.recorder.release(),
            GatedAction::DeletePlayer(id) => self.players.force_delete(id).await,
            GatedAction::UndoRound(id) => self.ledger.undo(id).await,
            GatedAction::ResetGame => {
                self.client.reset_game().await?;
                info!("game reset");
                self.cache.invalidate(ViewKey::Rounds);
                Ok(())
            }
            GatedAction::ChangeAdminCode { new_code } => {
                // The gate just verified `code`; a rejection here means the
                // secret rotated underneath us.
                if self.client.change_admin_code(code, &new_code).await? {
                    info!("admin code changed");
                    Ok(())
                } else {
                    Err(Error::CodeRejected)
                }
            }
        }
    }
}
