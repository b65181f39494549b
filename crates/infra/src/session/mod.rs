//! Durable session storage adapters

pub mod file;
#[cfg(feature = "keychain")]
pub mod keychain;

use std::sync::Arc;

use rcm_core::{SessionStorage, SessionStore};
use rcm_domain::{Result, SessionBackend, SessionConfig};

pub use file::{default_session_path, FileSessionStorage};
#[cfg(feature = "keychain")]
pub use keychain::KeychainSessionStorage;

/// Storage selected by the session configuration
///
/// # Errors
///
/// Returns `RcmError::Config` when the keychain backend is requested but the
/// crate was built without the `keychain` feature.
pub fn storage_from_config(config: &SessionConfig) -> Result<Arc<dyn SessionStorage>> {
    match config.backend {
        SessionBackend::File => {
            let path = config.path.clone().unwrap_or_else(default_session_path);
            Ok(Arc::new(FileSessionStorage::new(path)))
        }
        #[cfg(feature = "keychain")]
        SessionBackend::Keychain => {
            Ok(Arc::new(KeychainSessionStorage::new(config.keychain_service.clone())))
        }
        #[cfg(not(feature = "keychain"))]
        SessionBackend::Keychain => Err(rcm_domain::RcmError::Config(
            "keychain session storage requires the `keychain` feature".to_string(),
        )),
    }
}

/// Build a session store and load any persisted session into it
///
/// # Errors
///
/// See [`storage_from_config`].
pub async fn open_session_store(config: &SessionConfig) -> Result<SessionStore> {
    let store = SessionStore::new(storage_from_config(config)?);
    store.hydrate().await;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use rcm_domain::CredentialPair;

    use super::*;

    #[tokio::test]
    async fn file_backend_round_trips_through_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig {
            path: Some(dir.path().join("session.json")),
            ..SessionConfig::default()
        };

        let store = open_session_store(&config).await.unwrap();
        assert!(!store.is_authenticated().await);
        store.set(CredentialPair::new("A1", "R1"), None).await.unwrap();

        let reopened = open_session_store(&config).await.unwrap();
        assert_eq!(reopened.get().await, Some(CredentialPair::new("A1", "R1")));
    }

    #[cfg(not(feature = "keychain"))]
    #[test]
    fn keychain_backend_needs_feature() {
        use rcm_domain::RcmError;

        let config = SessionConfig { backend: SessionBackend::Keychain, ..SessionConfig::default() };
        assert!(matches!(storage_from_config(&config), Err(RcmError::Config(_))));
    }
}
