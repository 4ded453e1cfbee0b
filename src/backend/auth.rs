// Auth state shared by every backend implementation
//
// Holds the current credential and broadcasts the matching Session to
// anyone subscribed (SessionState, the shell). When a CredentialStore is
// attached, every credential change (login, token refresh, logout) is
// written through to disk. Also parses the auth API's token responses and
// error bodies.

use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::RwLock;
use tokio::sync::watch;
use tracing::{info, warn};

use super::credentials::CredentialStore;
use super::models::{Credential, Session};
use crate::error::{BackendError, BackendResult};

pub struct AuthState {
    credential: RwLock<Option<Credential>>,
    changes: watch::Sender<Option<Session>>,
    store: RwLock<Option<CredentialStore>>,
}

impl AuthState {
    pub fn new() -> Self {
        let (changes, _rx) = watch::channel(None);
        AuthState {
            credential: RwLock::new(None),
            changes,
            store: RwLock::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.changes.subscribe()
    }

    pub fn credential(&self) -> Option<Credential> {
        self.credential
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.changes.borrow().clone()
    }

    // Write every future credential change to `store`. An existing
    // credential is saved right away; having none leaves the file alone so
    // a login saved by an earlier run survives until it is restored.
    pub fn persist_to(&self, store: CredentialStore) {
        if let Some(credential) = self.credential() {
            if let Err(e) = store.save(&credential) {
                warn!("Failed to save session: {}", e);
            }
        }
        *self.store.write().unwrap_or_else(|e| e.into_inner()) = Some(store);
    }

    fn persist(&self, credential: Option<&Credential>) {
        let store = self.store.read().unwrap_or_else(|e| e.into_inner());
        let Some(store) = store.as_ref() else {
            return;
        };
        let result = match credential {
            Some(credential) => store.save(credential),
            None => store.clear(),
        };
        if let Err(e) = result {
            warn!("Failed to update saved session: {}", e);
        }
    }

    // Replace the credential and notify observers.
    // A token refresh for the same user changes nothing observers care
    // about, so they are only woken when the identity actually changes.
    // The saved copy is always rewritten: a refresh rotates the token.
    pub fn set(&self, credential: Option<Credential>) {
        let session = credential.as_ref().map(Credential::session);
        self.persist(credential.as_ref());
        *self.credential.write().unwrap_or_else(|e| e.into_inner()) = credential;

        self.changes.send_if_modified(|current| {
            if *current == session {
                return false;
            }
            match &session {
                Some(s) => info!(user_id = %s.user_id, "signed in"),
                None => info!("signed out"),
            }
            *current = session;
            true
        });
    }

    pub fn clear(&self) {
        self.set(None);
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// AUTH API RESPONSES
// ==========================================

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    user: Option<AuthUser>,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
}

// Sign-up answers without tokens when the project requires email
// confirmation. That's not a failure on the server side, but there is no
// session to establish yet.
pub(crate) fn credential_from_token_response(body: &str) -> BackendResult<Credential> {
    let response: TokenResponse = serde_json::from_str(body)?;

    let (access_token, refresh_token, user) =
        match (response.access_token, response.refresh_token, response.user) {
            (Some(access), Some(refresh), Some(user)) => (access, refresh, user),
            _ => {
                return Err(BackendError::Auth(
                    "Check your email to confirm your account, then log in".to_string(),
                ))
            }
        };

    Ok(Credential {
        user_id: user.id,
        email: user.email,
        access_token,
        refresh_token,
        expires_at: Utc::now() + Duration::seconds(response.expires_in.unwrap_or(3600)),
    })
}

// The auth API has used several error shapes over time:
//   {"error": "invalid_grant", "error_description": "Invalid login credentials"}
//   {"code": 400, "error_code": "...", "msg": "..."}
//   {"message": "..."}
pub(crate) fn auth_error_message(body: &str) -> String {
    let fallback = || {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            "Authentication failed".to_string()
        } else {
            trimmed.to_string()
        }
    };

    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return fallback();
    };

    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
        .unwrap_or_else(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(user_id: &str, token: &str) -> Credential {
        Credential {
            user_id: user_id.to_string(),
            email: Some(format!("{user_id}@example.com")),
            access_token: token.to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[test]
    fn parses_session_response() {
        let body = r#"{
            "access_token": "jwt", "token_type": "bearer", "expires_in": 3600,
            "refresh_token": "r1",
            "user": { "id": "u1", "email": "a@b.com", "aud": "authenticated" }
        }"#;
        let credential = credential_from_token_response(body).unwrap();
        assert_eq!(credential.user_id, "u1");
        assert_eq!(credential.email.as_deref(), Some("a@b.com"));
        assert_eq!(credential.access_token, "jwt");
        assert!(!credential.is_expired());
    }

    #[test]
    fn sign_up_awaiting_confirmation_is_an_auth_message() {
        let body = r#"{ "id": "u1", "email": "a@b.com", "confirmation_sent_at": "2024-01-01T00:00:00Z" }"#;
        let err = credential_from_token_response(body).unwrap_err();
        assert!(matches!(err, BackendError::Auth(msg) if msg.contains("confirm")));
    }

    #[test]
    fn reads_every_error_shape() {
        assert_eq!(
            auth_error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(
            auth_error_message(r#"{"code":422,"msg":"User already registered"}"#),
            "User already registered"
        );
        assert_eq!(auth_error_message("  "), "Authentication failed");
        assert_eq!(auth_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn observers_wake_only_when_identity_changes() {
        let auth = AuthState::new();
        let mut rx = auth.subscribe();

        auth.set(Some(credential("u1", "t1")));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().user_id, "u1");

        // refreshed token, same user
        auth.set(Some(credential("u1", "t2")));
        assert!(!rx.has_changed().unwrap());
        assert_eq!(auth.credential().unwrap().access_token, "t2");

        auth.clear();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
        assert!(auth.credential().is_none());
    }

    #[test]
    fn every_credential_change_is_written_to_the_attached_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        let auth = AuthState::new();

        auth.set(Some(credential("u1", "t1")));
        auth.persist_to(CredentialStore::new(dir.path()));
        assert_eq!(store.load().unwrap().access_token, "t1");

        // a refresh for the same user still rewrites the file
        auth.set(Some(credential("u1", "t2")));
        assert_eq!(store.load().unwrap().access_token, "t2");

        auth.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn attaching_a_store_while_signed_out_keeps_the_saved_login() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        store.save(&credential("u1", "saved")).unwrap();

        AuthState::new().persist_to(CredentialStore::new(dir.path()));
        assert_eq!(store.load().unwrap().access_token, "saved");
    }
}
