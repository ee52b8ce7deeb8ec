//! Persistence of the signed-in identity.
//!
//! The identity is kept as four scalar entries. A record is only ever
//! returned whole: a missing entry, an empty token or an unknown role makes
//! the whole record count as absent.

use std::sync::Arc;

use grocer_store::{KeyValueStore, MemoryStore};

use crate::user::{Identity, Profile, Role};
use crate::AuthError;

/// Storage keys of the persisted identity.
pub mod keys {
    /// Bearer token.
    pub const TOKEN: &str = "grocer.token";
    /// Role wire string.
    pub const ROLE: &str = "grocer.role";
    /// Login name.
    pub const USERNAME: &str = "grocer.username";
    /// Profile as JSON text.
    pub const PROFILE: &str = "grocer.profile";

    /// All four keys, in write order.
    pub const ALL: [&str; 4] = [PROFILE, USERNAME, ROLE, TOKEN];
}

/// Mirrors the current identity into a key-value store.
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    /// Create a token store on top of a key-value store.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Create a token store that only lives in memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Underlying key-value store.
    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Persist an identity, replacing any previous record.
    ///
    /// The old record is removed first and the token is written last, so a
    /// failure part way through leaves a record that `load` treats as absent.
    pub fn save(&self, identity: &Identity) -> Result<(), AuthError> {
        let profile = serde_json::to_string(&identity.profile)?;
        self.clear()?;

        let entries = [
            (keys::PROFILE, profile.as_str()),
            (keys::USERNAME, identity.username.as_str()),
            (keys::ROLE, identity.role.as_str()),
            (keys::TOKEN, identity.token.as_str()),
        ];
        for (key, value) in entries {
            if let Err(e) = self.store.set(key, value) {
                tracing::warn!(key, error = %e, "failed to persist session entry");
                if let Err(cleanup) = self.clear() {
                    tracing::warn!(error = %cleanup, "failed to clean up partial session");
                }
                return Err(e.into());
            }
        }

        tracing::debug!(username = %identity.username, role = %identity.role, "session persisted");
        Ok(())
    }

    /// Load the persisted identity.
    ///
    /// Returns `None` unless all four entries are present and the role is
    /// known. A profile that is present but undecodable is replaced with
    /// [`Profile::placeholder`].
    pub fn load(&self) -> Option<Identity> {
        let token = self.read(keys::TOKEN)?;
        let role = self.read(keys::ROLE)?;
        let username = self.read(keys::USERNAME)?;
        let profile = self.read(keys::PROFILE)?;

        if token.is_empty() {
            tracing::warn!("persisted session has an empty token, ignoring it");
            return None;
        }

        let role: Role = match role.parse() {
            Ok(role) => role,
            Err(e) => {
                tracing::warn!(error = %e, "persisted session has an invalid role, ignoring it");
                return None;
            }
        };

        let profile = serde_json::from_str::<Profile>(&profile).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "persisted profile is unreadable, using placeholder");
            Profile::placeholder()
        });

        Some(Identity {
            token,
            role,
            username,
            profile,
        })
    }

    /// Remove every entry of the persisted identity.
    ///
    /// Attempts all four removals even when one fails and reports the first
    /// failure. Clearing an empty store succeeds.
    pub fn clear(&self) -> Result<(), AuthError> {
        let mut first_error = None;
        for key in keys::ALL {
            if let Err(e) = self.store.delete(key) {
                tracing::warn!(key, error = %e, "failed to remove session entry");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(Some(value)) => Some(value),
            Ok(None) => {
                tracing::trace!(key, "session entry missing");
                None
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read session entry");
                None
            }
        }
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::ProfileStatus;
    use grocer_store::{FileStore, StoreError};

    fn admin() -> Identity {
        let mut profile = Profile::placeholder();
        profile.name = Some("Asha Rao".to_string());
        profile.email = Some("asha@grocer.example".to_string());
        profile.status = ProfileStatus::Active;
        profile
            .extra
            .insert("warehouse".to_string(), serde_json::json!("north-7"));
        Identity::new("jwt-admin-1", Role::Admin, "asha", profile)
    }

    fn sub_admin() -> Identity {
        Identity::new("jwt-sub-1", Role::SubAdmin, "dispatch", Profile::placeholder())
    }

    /// Refuses to write the token; once it has, optionally refuses deletes too.
    struct TokenWriteFails {
        inner: MemoryStore,
        break_deletes: bool,
        deletes_broken: std::sync::atomic::AtomicBool,
    }

    impl TokenWriteFails {
        fn new(break_deletes: bool) -> Self {
            Self {
                inner: MemoryStore::new(),
                break_deletes,
                deletes_broken: std::sync::atomic::AtomicBool::new(false),
            }
        }
    }

    impl KeyValueStore for TokenWriteFails {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if key == keys::TOKEN {
                self.deletes_broken
                    .store(self.break_deletes, std::sync::atomic::Ordering::SeqCst);
                return Err(StoreError::StoreError("disk full".to_string()));
            }
            self.inner.set(key, value)
        }

        fn delete(&self, key: &str) -> Result<(), StoreError> {
            if self.deletes_broken.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(StoreError::StoreError("read-only".to_string()));
            }
            self.inner.delete(key)
        }

        fn keys(&self) -> Result<Vec<String>, StoreError> {
            self.inner.keys()
        }
    }

    #[test]
    fn test_failed_save_removes_partial_record() {
        let store = TokenStore::new(Arc::new(TokenWriteFails::new(false)));
        let err = store.save(&admin()).unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert!(store.backend().keys().unwrap().is_empty());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_failed_cleanup_keeps_the_write_error() {
        let store = TokenStore::new(Arc::new(TokenWriteFails::new(true)));
        let err = store.save(&admin()).unwrap_err();
        assert!(err.to_string().contains("disk full"));
        // Token never landed, so the leftovers still read as absent.
        assert!(!store.backend().keys().unwrap().is_empty());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let store = TokenStore::in_memory();
        for identity in [admin(), sub_admin()] {
            store.save(&identity).unwrap();
            assert_eq!(store.load(), Some(identity));
        }
    }

    #[test]
    fn test_load_empty_is_absent() {
        assert_eq!(TokenStore::in_memory().load(), None);
    }

    #[test]
    fn test_missing_entry_is_absent() {
        for missing in keys::ALL {
            let store = TokenStore::in_memory();
            store.save(&admin()).unwrap();
            store.backend().delete(missing).unwrap();
            assert_eq!(store.load(), None, "record without {} must be absent", missing);
        }
    }

    #[test]
    fn test_unknown_role_is_absent() {
        let store = TokenStore::in_memory();
        store.save(&admin()).unwrap();
        store.backend().set(keys::ROLE, "SUPER_ADMIN").unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_empty_token_is_absent() {
        let store = TokenStore::in_memory();
        store.save(&admin()).unwrap();
        store.backend().set(keys::TOKEN, "").unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_unreadable_profile_uses_placeholder() {
        let store = TokenStore::in_memory();
        store.save(&admin()).unwrap();
        store.backend().set(keys::PROFILE, "{broken").unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.token, "jwt-admin-1");
        assert_eq!(loaded.role, Role::Admin);
        assert!(loaded.profile.is_placeholder());
        assert_eq!(loaded.profile.status, ProfileStatus::Unknown);
    }

    #[test]
    fn test_clear_removes_everything_and_is_idempotent() {
        let store = TokenStore::in_memory();
        store.save(&admin()).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load(), None);
        assert!(store.backend().keys().unwrap().is_empty());
    }

    #[test]
    fn test_save_replaces_previous_identity() {
        let store = TokenStore::in_memory();
        store.save(&admin()).unwrap();
        store.save(&sub_admin()).unwrap();
        assert_eq!(store.load(), Some(sub_admin()));
    }

    #[test]
    fn test_file_backed_store_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = TokenStore::new(Arc::new(FileStore::open(&path).unwrap()));
        store.save(&admin()).unwrap();
        drop(store);

        let store = TokenStore::new(Arc::new(FileStore::open(&path).unwrap()));
        assert_eq!(store.load(), Some(admin()));
    }

    #[test]
    fn test_corrupted_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "garbage").unwrap();

        let store = TokenStore::new(Arc::new(FileStore::open(&path).unwrap()));
        assert_eq!(store.load(), None);
    }
}
