//! Session store
//!
//! Manages the credential lifecycle:
//! - Hydration from durable storage on startup
//! - Replacement on login/registration
//! - Access token rotation after a refresh
//! - Teardown on logout or refresh failure

use std::sync::Arc;

use rcm_domain::{CredentialPair, Identity, RcmError, Result, Session};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::memory::MemorySessionStorage;
use super::ports::SessionStorage;

/// Owner of the current credential pair and identity
///
/// Every outbound call reads from the store; only login/logout and the
/// transport's refresh path write to it. Writes are persisted before they
/// become visible in memory, so a failed save leaves the old session intact.
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Create an empty store over the given storage
    ///
    /// Call [`SessionStore::hydrate`] to pick up a persisted session.
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage, current: RwLock::new(None) }
    }

    /// Store that forgets everything when the process exits
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStorage::new()))
    }

    /// Load the persisted session into memory
    ///
    /// Should be called once on startup. Unreadable storage is treated like an
    /// empty one: the user simply has to log in again.
    ///
    /// # Returns
    ///
    /// `true` if a session was restored
    pub async fn hydrate(&self) -> bool {
        match self.storage.load().await {
            Ok(Some(session)) => {
                *self.current.write().await = Some(session);
                info!("Session restored from storage");
                true
            }
            Ok(None) => {
                debug!("No persisted session found");
                false
            }
            Err(err) => {
                warn!(error = %err, "Failed to read persisted session; starting logged out");
                false
            }
        }
    }

    /// Current credential pair, if logged in
    pub async fn get(&self) -> Option<CredentialPair> {
        self.current.read().await.as_ref().map(|s| s.tokens.clone())
    }

    /// Current session including identity
    pub async fn session(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    /// Identity of the logged-in user, if known
    pub async fn identity(&self) -> Option<Identity> {
        self.current.read().await.as_ref().and_then(|s| s.user.clone())
    }

    /// Current access token
    pub async fn access_token(&self) -> Option<String> {
        self.current.read().await.as_ref().map(|s| s.tokens.access.clone())
    }

    /// Current refresh token
    pub async fn refresh_token(&self) -> Option<String> {
        self.current.read().await.as_ref().map(|s| s.tokens.refresh.clone())
    }

    /// Whether a credential pair is held
    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Replace the session (login, registration)
    ///
    /// # Errors
    ///
    /// Returns `RcmError::Storage` if the session cannot be persisted; the
    /// previous session stays in place.
    pub async fn set(&self, tokens: CredentialPair, identity: Option<Identity>) -> Result<()> {
        let session = Session { tokens, user: identity };
        let mut current = self.current.write().await;

        self.storage.save(&session).await?;
        *current = Some(session);

        info!("Session stored");
        Ok(())
    }

    /// Swap in a refreshed access token, keeping refresh token and identity
    ///
    /// # Errors
    ///
    /// Returns `RcmError::Unauthorized` if there is no session to update, or
    /// `RcmError::Storage` if persisting fails.
    pub async fn update_access(&self, access: String) -> Result<()> {
        let mut current = self.current.write().await;
        let Some(existing) = current.as_ref() else {
            return Err(RcmError::Unauthorized("no session to refresh".to_string()));
        };

        let mut session = existing.clone();
        session.tokens.access = access;

        self.storage.save(&session).await?;
        *current = Some(session);

        debug!("Access token updated");
        Ok(())
    }

    /// Forget the session (logout, refresh failure)
    ///
    /// Memory is cleared even when storage deletion fails, so no further
    /// request carries the old credentials.
    ///
    /// # Errors
    ///
    /// Returns the storage error after clearing memory.
    pub async fn clear(&self) -> Result<()> {
        let had_session = self.current.write().await.take().is_some();

        if let Err(err) = self.storage.clear().await {
            warn!(error = %err, "Failed to remove persisted session");
            return Err(err);
        }

        if had_session {
            info!("Session cleared");
        }
        Ok(())
    }
}
