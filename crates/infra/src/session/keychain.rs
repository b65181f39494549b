//! Platform keychain session storage
//!
//! Each persisted key (`access_token`, `refresh_token`, `user`) is a separate
//! keychain entry under one service name. Keyring calls block, so they run on
//! the blocking thread pool.

use async_trait::async_trait;
use keyring::Entry;
use rcm_core::SessionStorage;
use rcm_domain::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY};
use rcm_domain::{CredentialPair, Identity, RcmError, Result, Session};
use tracing::{debug, warn};

use crate::errors::InfraError;

/// Session persisted in the OS keychain
#[derive(Debug, Clone)]
pub struct KeychainSessionStorage {
    service: String,
}

impl KeychainSessionStorage {
    /// Storage under the given keychain service name
    pub fn new(service: impl Into<String>) -> Self {
        Self { service: service.into() }
    }

    fn entry(service: &str, key: &str) -> Result<Entry> {
        Entry::new(service, key).map_err(|err| InfraError::from(err).into())
    }

    fn read(service: &str, key: &str) -> Result<Option<String>> {
        match Self::entry(service, key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(InfraError::from(err).into()),
        }
    }

    fn write(service: &str, key: &str, value: &str) -> Result<()> {
        Self::entry(service, key)?.set_password(value).map_err(|err| InfraError::from(err).into())
    }

    fn remove(service: &str, key: &str) -> Result<()> {
        match Self::entry(service, key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(InfraError::from(err).into()),
        }
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&str) -> Result<T> + Send + 'static,
    {
        let service = self.service.clone();
        tokio::task::spawn_blocking(move || op(&service))
            .await
            .map_err(|err| RcmError::Internal(format!("keychain task failed: {err}")))?
    }
}

#[async_trait]
impl SessionStorage for KeychainSessionStorage {
    async fn load(&self) -> Result<Option<Session>> {
        self.blocking(|service| {
            let (Some(access), Some(refresh)) =
                (Self::read(service, ACCESS_TOKEN_KEY)?, Self::read(service, REFRESH_TOKEN_KEY)?)
            else {
                return Ok(None);
            };

            let user = match Self::read(service, USER_KEY)? {
                Some(raw) => match serde_json::from_str::<Identity>(&raw) {
                    Ok(identity) => Some(identity),
                    Err(err) => {
                        warn!(error = %err, "Ignoring unreadable identity in keychain");
                        None
                    }
                },
                None => None,
            };

            debug!(service, "Loaded session from keychain");
            Ok(Some(Session { tokens: CredentialPair::new(access, refresh), user }))
        })
        .await
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let session = session.clone();
        self.blocking(move |service| {
            Self::write(service, ACCESS_TOKEN_KEY, &session.tokens.access)?;
            Self::write(service, REFRESH_TOKEN_KEY, &session.tokens.refresh)?;
            match &session.user {
                Some(user) => {
                    let raw = serde_json::to_string(user).map_err(|err| {
                        RcmError::Internal(format!("failed to encode identity: {err}"))
                    })?;
                    Self::write(service, USER_KEY, &raw)?;
                }
                None => Self::remove(service, USER_KEY)?,
            }
            debug!(service, "Saved session to keychain");
            Ok(())
        })
        .await
    }

    async fn clear(&self) -> Result<()> {
        self.blocking(|service| {
            for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY] {
                Self::remove(service, key)?;
            }
            debug!(service, "Cleared keychain session");
            Ok(())
        })
        .await
    }
}
