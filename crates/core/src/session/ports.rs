//! Port interfaces for session persistence and expiry notification

use async_trait::async_trait;
use rcm_domain::{Result, Session};

/// Durable storage for the session
///
/// Implementations must survive process restarts (keychain, file, ...).
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Load the persisted session, `None` if nothing is stored
    async fn load(&self) -> Result<Option<Session>>;

    /// Replace the persisted session
    async fn save(&self, session: &Session) -> Result<()>;

    /// Remove every persisted key; succeeds when nothing is stored
    async fn clear(&self) -> Result<()>;
}

/// Receives the "session expired" signal from the transport
///
/// The boundary reacts by sending the user to the login surface.
pub trait SessionListener: Send + Sync {
    fn on_session_expired(&self);
}

/// Listener that ignores expiry
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSessionListener;

impl SessionListener for NoopSessionListener {
    fn on_session_expired(&self) {}
}
