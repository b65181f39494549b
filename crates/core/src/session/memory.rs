//! Process-local session storage

use async_trait::async_trait;
use rcm_domain::{Result, Session};
use tokio::sync::Mutex;

use super::ports::SessionStorage;

/// Keeps the session in memory only; nothing survives a restart
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStorage {
    /// Empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a session already "persisted"
    pub fn with_session(session: Session) -> Self {
        Self { session: Mutex::new(Some(session)) }
    }

    /// Inspect what is currently stored
    pub async fn stored(&self) -> Option<Session> {
        self.session.lock().await.clone()
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn load(&self) -> Result<Option<Session>> {
        Ok(self.session.lock().await.clone())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        *self.session.lock().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.session.lock().await.take();
        Ok(())
    }
}
