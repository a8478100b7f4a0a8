use crate::{Error, Result};
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tilescore_types::{
    api::{
        AdminCodeChange, AdminVerify, AvatarUploaded, CreatePlayer, CreateRound, CreateSession,
        LockStatus, RenameSession, UpdatePlayer,
    },
    Player, PlayerId, PlayerStats, Round, RoundId, Session, SessionId,
};
use tokio::time::sleep;
use tracing::warn;
use url::Url;

/// Statuses worth retrying: the service (or a proxy in front of it) is
/// momentarily unavailable, not rejecting the request.
fn retryable(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 502 | 503 | 504)
}

/// Retry behavior for requests to the scoreboard service.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Also retry POST/PATCH/DELETE. Off by default: the service applies them
    /// without idempotency tokens, so a retried write can double-apply.
    pub retry_non_idempotent: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
            retry_non_idempotent: false,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

/// HTTP gateway to the scoreboard service. Shapes requests and responses for
/// players, rounds, sessions, standings, statistics, and admin verification;
/// holds no view state of its own.
pub struct Client {
    pub http_client: reqwest::Client,
    pub base_url: Url,
    retry: RetryPolicy,
}

impl Client {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        match base_url.scheme() {
            "http" | "https" => {}
            other => return Err(Error::InvalidScheme(other.to_string())),
        }
        // Url::join drops the last path segment unless the base ends with a
        // slash.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        Ok(Self {
            http_client: reqwest::Client::new(),
            base_url,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn fail(method: &Method, url: &Url, response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Error::FailedWithBody {
            status,
            body: format!("{method} {url}: {body}"),
        }
    }

    /// Send a request, retrying transient failures per the policy. `build`
    /// recreates the request for every attempt.
    pub(crate) async fn send_with_retry<F>(
        &self,
        method: Method,
        url: Url,
        build: F,
    ) -> Result<reqwest::Response>
    where
        F: Fn(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    {
        let idempotent = method == Method::GET || method == Method::HEAD;
        let attempts = if idempotent || self.retry.retry_non_idempotent {
            self.retry.max_attempts.max(1)
        } else {
            1
        };
        let mut backoff = self.retry.initial_backoff;
        let mut attempt = 0;
        loop {
            attempt += 1;
            let request = build(self.http_client.request(method.clone(), url.clone()));
            match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    if attempt >= attempts || !retryable(status) {
                        return Err(Self::fail(&method, &url, response).await);
                    }
                    warn!(%url, %status, attempt, "retrying request");
                }
                Err(err) => {
                    if attempt >= attempts || !(err.is_connect() || err.is_timeout()) {
                        return Err(err.into());
                    }
                    warn!(%url, error = %err, attempt, "retrying request");
                }
            }
            sleep(backoff).await;
            backoff = (backoff * 2).min(self.retry.max_backoff);
        }
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        let response = self.send_with_retry(Method::GET, url, |req| req).await?;
        Ok(response.json().await?)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.endpoint(path)?;
        let response = self
            .send_with_retry(Method::POST, url, |req| req.json(body))
            .await?;
        Ok(response.json().await?)
    }

    async fn patch_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        let response = self
            .send_with_retry(Method::PATCH, url, |req| req.json(body))
            .await?;
        Ok(response.json().await?)
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        let response = self.send_with_retry(Method::POST, url, |req| req).await?;
        Ok(response.json().await?)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let url = self.endpoint(path)?;
        self.send_with_retry(Method::DELETE, url, |req| req).await?;
        Ok(())
    }

    // Players

    pub async fn list_players(&self) -> Result<Vec<Player>> {
        self.get_json("players").await
    }

    pub async fn create_player(&self, request: &CreatePlayer) -> Result<Player> {
        self.post_json("players", request).await
    }

    pub async fn update_player(&self, id: PlayerId, update: &UpdatePlayer) -> Result<Player> {
        self.patch_json(&format!("players/{id}"), update).await
    }

    pub async fn delete_player(&self, id: PlayerId) -> Result<()> {
        self.delete(&format!("players/{id}")).await
    }

    /// Whether the player has recorder history and is therefore
    /// delete-protected. Checked by the service, never cached: the answer can
    /// change with every committed round.
    pub async fn player_locked(&self, id: PlayerId) -> Result<bool> {
        let status: LockStatus = self.get_json(&format!("players/{id}/locked")).await?;
        Ok(status.locked)
    }

    pub async fn upload_avatar(
        &self,
        id: PlayerId,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<AvatarUploaded> {
        let url = self.endpoint(&format!("players/{id}/avatar"))?;
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        // Multipart bodies are not rebuildable, so this request never retries.
        let response = self
            .http_client
            .post(url.clone())
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::fail(&Method::POST, &url, response).await);
        }
        Ok(response.json().await?)
    }

    // Rounds

    pub async fn list_rounds(&self) -> Result<Vec<Round>> {
        self.get_json("rounds").await
    }

    pub async fn create_round(&self, request: &CreateRound) -> Result<Round> {
        self.post_json("rounds", request).await
    }

    pub async fn delete_round(&self, id: RoundId) -> Result<()> {
        self.delete(&format!("rounds/{id}")).await
    }

    // Derived views

    pub async fn standings(&self) -> Result<Vec<Player>> {
        self.get_json("game/standings").await
    }

    pub async fn statistics(&self) -> Result<Vec<PlayerStats>> {
        self.get_json("game/statistics").await
    }

    pub async fn reset_game(&self) -> Result<()> {
        let url = self.endpoint("game/reset")?;
        self.send_with_retry(Method::POST, url, |req| req).await?;
        Ok(())
    }

    // Admin

    /// Check a code against the service's admin secret. A definitive "wrong
    /// code" answer is `Ok(false)`, not an error.
    pub async fn verify_admin(&self, code: &str) -> Result<bool> {
        let url = self.endpoint("admin/verify")?;
        let body = AdminVerify { code: code.into() };
        let response = self
            .http_client
            .post(url.clone())
            .json(&body)
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::UNAUTHORIZED => Ok(false),
            _ => Err(Self::fail(&Method::POST, &url, response).await),
        }
    }

    /// Rotate the admin secret. `Ok(false)` means the old code no longer
    /// matches (someone rotated it first).
    pub async fn change_admin_code(&self, old_code: &str, new_code: &str) -> Result<bool> {
        let url = self.endpoint("admin/code")?;
        let body = AdminCodeChange {
            old_code: old_code.into(),
            new_code: new_code.into(),
        };
        let response = self
            .http_client
            .patch(url.clone())
            .json(&body)
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::UNAUTHORIZED => Ok(false),
            _ => Err(Self::fail(&Method::PATCH, &url, response).await),
        }
    }

    // Sessions

    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.get_json("sessions").await
    }

    pub async fn active_session(&self) -> Result<Option<Session>> {
        self.get_json("sessions/active").await
    }

    pub async fn create_session(&self, name: &str) -> Result<Session> {
        let body = CreateSession { name: name.into() };
        self.post_json("sessions", &body).await
    }

    pub async fn load_session(&self, id: SessionId) -> Result<Session> {
        self.post_empty(&format!("sessions/{id}/load")).await
    }

    pub async fn rename_session(&self, id: SessionId, name: &str) -> Result<Session> {
        let body = RenameSession { name: name.into() };
        self.patch_json(&format!("sessions/{id}"), &body).await
    }

    pub async fn delete_session(&self, id: SessionId) -> Result<()> {
        self.delete(&format!("sessions/{id}")).await
    }
}
