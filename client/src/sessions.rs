use crate::{cache::ViewKey, Client, Error, Result, ViewCache};
use std::sync::Arc;
use tilescore_types::{Session, SessionId};
use tracing::info;

/// Create, switch, rename, and delete sessions — independent ledgers, of
/// which exactly one is active at a time.
pub struct Sessions {
    client: Arc<Client>,
    cache: Arc<ViewCache>,
}

impl Sessions {
    pub fn new(client: Arc<Client>, cache: Arc<ViewCache>) -> Self {
        Self { client, cache }
    }

    pub async fn list(&self) -> Result<Vec<Session>> {
        if let Some(sessions) = self.cache.sessions() {
            return Ok(sessions);
        }
        let sessions = self.client.list_sessions().await?;
        self.cache.store_sessions(sessions.clone());
        Ok(sessions)
    }

    /// The currently active session, straight from the service.
    pub async fn active(&self) -> Result<Option<Session>> {
        self.client.active_session().await
    }

    /// Create a session. Creation and activation are independent: the new
    /// session is NOT made active — [`Sessions::load`] is the only
    /// activation path.
    pub async fn create(&self, name: &str) -> Result<Session> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        let session = self.client.create_session(name).await?;
        info!(session = %session.id, name = %session.name, "session created");
        self.cache.invalidate(ViewKey::Sessions);
        Ok(session)
    }

    /// Make `id` the active session. Every cached view is dropped: the whole
    /// ledger those views were read from has changed identity.
    pub async fn load(&self, id: SessionId) -> Result<Session> {
        let session = self.client.load_session(id).await?;
        info!(session = %session.id, name = %session.name, "session loaded");
        self.cache.invalidate_all();
        Ok(session)
    }

    /// Rename any session by id; the operation is identity-addressed and not
    /// restricted to the active one.
    pub async fn rename(&self, id: SessionId, name: &str) -> Result<Session> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        let session = self.client.rename_session(id, name).await?;
        self.cache.invalidate(ViewKey::Sessions);
        Ok(session)
    }

    /// Delete a session. Deleting the active session is refused before any
    /// request goes out: the live ledger must be switched away from first.
    pub async fn delete(&self, id: SessionId) -> Result<()> {
        if let Some(active) = self.active().await? {
            if active.id == id {
                return Err(Error::ActiveSession);
            }
        }
        self.client.delete_session(id).await?;
        info!(session = %id, "session deleted");
        self.cache.invalidate(ViewKey::Sessions);
        Ok(())
    }
}
