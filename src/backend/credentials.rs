// Saved login
//
// The credential is written to session.json in the config directory after
// every successful login, read back at startup, and deleted on logout.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::models::Credential;
use crate::error::BackendResult;

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(config_dir: &Path) -> Self {
        CredentialStore {
            path: config_dir.join("session.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // A missing file means "never logged in". An unreadable one is logged
    // and treated the same, so a corrupt file never blocks startup.
    pub fn load(&self) -> Option<Credential> {
        if !self.path.exists() {
            return None;
        }

        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to read saved session: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&data) {
            Ok(credential) => Some(credential),
            Err(e) => {
                warn!("Failed to parse saved session: {}", e);
                None
            }
        }
    }

    pub fn save(&self, credential: &Credential) -> BackendResult<()> {
        let json = serde_json::to_string_pretty(credential)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn clear(&self) -> BackendResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn credential() -> Credential {
        Credential {
            user_id: "u1".into(),
            email: Some("a@b.com".into()),
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[test]
    fn save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        let saved = credential();

        assert!(store.load().is_none());
        store.save(&saved).unwrap();
        assert_eq!(store.load(), Some(saved));

        store.clear().unwrap();
        assert!(!store.path().exists());
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_none());
    }
}
