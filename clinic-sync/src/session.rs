//! Remote store session
//!
//! Holds the access token for the remote store. Passed explicitly into every
//! remote call instead of living in process-wide state.

use crate::error::{SyncError, SyncResult};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

pub struct RemoteSession {
    id: Uuid,
    token: Option<SecretString>,
    expires_at: Option<DateTime<Utc>>,
}

impl RemoteSession {
    /// A session that has not been connected yet.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            token: None,
            expires_at: None,
        }
    }

    /// Create a session that is already connected with `token`.
    pub fn connected(token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        let mut session = Self::new();
        session.connect(token, expires_at);
        session
    }

    pub fn connect(&mut self, token: impl Into<String>, expires_at: Option<DateTime<Utc>>) {
        self.token = Some(SecretString::new(token.into()));
        self.expires_at = expires_at;
        tracing::info!(session_id = %self.id, expires_at = ?expires_at, "Remote session connected");
    }

    pub fn disconnect(&mut self) {
        if self.token.take().is_some() {
            tracing::info!(session_id = %self.id, "Remote session disconnected");
        }
        self.expires_at = None;
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected_at(Utc::now())
    }

    pub fn is_connected_at(&self, now: DateTime<Utc>) -> bool {
        match (&self.token, self.expires_at) {
            (None, _) => false,
            (Some(_), Some(expires_at)) => now < expires_at,
            (Some(_), None) => true,
        }
    }

    /// Session id for log correlation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Access token for a transport call. Fails when not connected or expired.
    pub fn access_token(&self) -> SyncResult<&str> {
        if !self.is_connected() {
            return Err(SyncError::NotConnected);
        }
        self.token
            .as_ref()
            .map(|token| token.expose_secret().as_str())
            .ok_or(SyncError::NotConnected)
    }

    /// Guard used by stores before touching the remote side.
    pub fn ensure_connected(&self) -> SyncResult<()> {
        self.access_token().map(|_| ())
    }
}

impl Default for RemoteSession {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RemoteSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSession")
            .field("id", &self.id)
            .field("connected", &self.token.is_some())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
