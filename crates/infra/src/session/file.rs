//! JSON file session storage
//!
//! The document uses the same keys the web client kept in local storage:
//! `access_token`, `refresh_token` and `user`. Writes go to a temporary file
//! that is renamed over the target, so a crash never leaves half a session.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rcm_core::SessionStorage;
use rcm_domain::constants::DEFAULT_SESSION_FILE;
use rcm_domain::{CredentialPair, Identity, RcmError, Result, Session};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::InfraError;

#[derive(Serialize, Deserialize)]
struct StoredSession {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    user: Option<Identity>,
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            access_token: session.tokens.access.clone(),
            refresh_token: session.tokens.refresh.clone(),
            user: session.user.clone(),
        }
    }
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Self {
            tokens: CredentialPair::new(stored.access_token, stored.refresh_token),
            user: stored.user,
        }
    }
}

/// Session persisted as a JSON document on disk
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    /// Storage at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the session file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Per-user location of the session file
///
/// `$XDG_CONFIG_HOME/rcm/session.json`, then `$HOME/.config/rcm/session.json`
/// (`%APPDATA%\rcm\session.json` on Windows), falling back to the working
/// directory.
pub fn default_session_path() -> PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("APPDATA").map(PathBuf::from))
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")));

    match base {
        Some(dir) => dir.join("rcm").join(DEFAULT_SESSION_FILE),
        None => PathBuf::from(DEFAULT_SESSION_FILE),
    }
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn load(&self) -> Result<Option<Session>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(InfraError::from(err).into()),
        };

        let stored: StoredSession = serde_json::from_slice(&raw).map_err(|err| {
            RcmError::Storage(format!("unreadable session file {}: {err}", self.path.display()))
        })?;

        debug!(path = %self.path.display(), "Loaded session file");
        Ok(Some(stored.into()))
    }

    async fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(InfraError::from)?;
        }

        let document = serde_json::to_vec_pretty(&StoredSession::from(session))
            .map_err(|err| RcmError::Internal(format!("failed to encode session: {err}")))?;

        let temp = self.temp_path();
        write_private(&temp, &document).await?;
        tokio::fs::rename(&temp, &self.path).await.map_err(InfraError::from)?;

        debug!(path = %self.path.display(), "Saved session file");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Removed session file");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(InfraError::from(err).into()),
        }
    }
}

/// Write a file readable by the current user only
async fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await.map_err(InfraError::from)?;
    tokio::io::AsyncWriteExt::write_all(&mut file, contents).await.map_err(InfraError::from)?;
    file.sync_all().await.map_err(InfraError::from)?;
    Ok(())
}
