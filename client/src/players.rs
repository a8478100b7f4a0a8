use crate::{auth::GatedAction, cache::ViewKey, AuthorizationGate, Client, Error, Result, ViewCache};
use std::sync::Arc;
use tilescore_types::{
    api::{CreatePlayer, UpdatePlayer},
    default_color, Player, PlayerId,
};
use tracing::info;

/// How a delete request was resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The player had no recorder history; the delete was issued immediately.
    Deleted,
    /// The player is locked; the delete now waits on the authorization gate.
    Deferred,
}

/// Create, rename, and delete players.
pub struct PlayerRegistry {
    client: Arc<Client>,
    cache: Arc<ViewCache>,
    gate: Arc<AuthorizationGate>,
}

impl PlayerRegistry {
    pub fn new(client: Arc<Client>, cache: Arc<ViewCache>, gate: Arc<AuthorizationGate>) -> Self {
        Self {
            client,
            cache,
            gate,
        }
    }

    /// The known players in the service's stable order, cached until the
    /// next invalidation.
    pub async fn list(&self) -> Result<Vec<Player>> {
        if let Some(players) = self.cache.players() {
            return Ok(players);
        }
        let players = self.client.list_players().await?;
        self.cache.store_players(players.clone());
        Ok(players)
    }

    /// Register a player. Without an explicit color, the next palette color
    /// (by roster size) is assigned. Duplicate names are the service's call.
    pub async fn add(&self, name: &str, color: Option<&str>) -> Result<Player> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        let color = match color {
            Some(color) => color.to_string(),
            None => default_color(self.list().await?.len()).to_string(),
        };
        let player = self
            .client
            .create_player(&CreatePlayer {
                name: name.to_string(),
                color,
            })
            .await?;
        info!(player = %player.id, name = %player.name, "player added");
        self.cache.invalidate(ViewKey::Players);
        Ok(player)
    }

    pub async fn rename(&self, id: PlayerId, name: &str) -> Result<Player> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        let player = self.client.update_player(id, &UpdatePlayer::name(name)).await?;
        self.cache.invalidate(ViewKey::Players);
        Ok(player)
    }

    pub async fn recolor(&self, id: PlayerId, color: &str) -> Result<Player> {
        let player = self
            .client
            .update_player(id, &UpdatePlayer::color(color))
            .await?;
        self.cache.invalidate(ViewKey::Players);
        Ok(player)
    }

    /// Upload an avatar image and return the stored reference path.
    pub async fn set_avatar(&self, id: PlayerId, filename: &str, bytes: Vec<u8>) -> Result<String> {
        let uploaded = self.client.upload_avatar(id, filename, bytes).await?;
        self.cache.invalidate(ViewKey::Players);
        Ok(uploaded.avatar_path)
    }

    /// Delete a player. The service is asked first whether the player is
    /// locked (has recorder history) — never trusted from a cached value.
    /// A locked player's delete is deferred behind the authorization gate;
    /// an unlocked one is issued immediately.
    pub async fn delete(&self, id: PlayerId) -> Result<DeleteOutcome> {
        if self.client.player_locked(id).await? {
            self.gate.challenge(GatedAction::DeletePlayer(id))?;
            return Ok(DeleteOutcome::Deferred);
        }
        self.force_delete(id).await?;
        Ok(DeleteOutcome::Deleted)
    }

    /// Issue the delete unconditionally. Called directly for unlocked
    /// players and on a verified gate challenge for locked ones.
    pub(crate) async fn force_delete(&self, id: PlayerId) -> Result<()> {
        self.client.delete_player(id).await?;
        info!(player = %id, "player deleted");
        self.cache.invalidate(ViewKey::Players);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> PlayerRegistry {
        let client = Arc::new(Client::new("http://127.0.0.1:9").unwrap());
        let cache = Arc::new(ViewCache::new());
        let gate = Arc::new(AuthorizationGate::new(client.clone()));
        PlayerRegistry::new(client, cache, gate)
    }

    #[tokio::test]
    async fn blank_names_are_rejected_locally() {
        let registry = fixture();
        assert!(matches!(
            registry.add("", None).await,
            Err(Error::EmptyName)
        ));
        assert!(matches!(
            registry.add("   ", None).await,
            Err(Error::EmptyName)
        ));
        assert!(matches!(
            registry.rename(PlayerId(1), " \t").await,
            Err(Error::EmptyName)
        ));
    }
}
