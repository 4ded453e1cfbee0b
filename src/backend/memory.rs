// In-process backend
//
// Same contract as RemoteBackend with everything kept in memory. Used when
// no backend URL is configured (offline mode) and by the tests.
//
// It mirrors the hosted database's rules that the app relies on:
// - one account per email, passwords of at least 6 characters
// - one profile per user id (inserts of an existing id are ignored)
// - users only see and change their own rows
// - deleting a playlist deletes its songs

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;
use uuid::Uuid;

use super::auth::AuthState;
use super::credentials::CredentialStore;
use super::models::*;
use super::Backend;
use crate::error::{BackendError, BackendResult};

const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    user_id: String,
    email: String,
    password: String,
}

#[derive(Default)]
struct Tables {
    accounts: HashMap<String, Account>,
    // refresh token -> user id
    refresh_tokens: HashMap<String, String>,
    profiles: HashMap<String, Profile>,
    playlists: Vec<Playlist>,
    liked_songs: Vec<LikedSong>,
    playlist_songs: Vec<PlaylistSong>,
}

pub struct MemoryBackend {
    tables: Mutex<Tables>,
    auth: AuthState,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn forbidden() -> BackendError {
    BackendError::Api {
        status: 403,
        code: Some("42501".to_string()),
        message: "new row violates row-level security policy".to_string(),
    }
}

// Newest first; rows created in the same instant keep reverse insertion order
fn newest_first<T, K: Ord>(
    rows: impl DoubleEndedIterator<Item = T>,
    key: impl Fn(&T) -> K,
) -> Vec<T> {
    let mut rows: Vec<T> = rows.rev().collect();
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend {
            tables: Mutex::new(Tables::default()),
            auth: AuthState::new(),
        }
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    // One live refresh token per user: issuing a new one retires the old
    fn issue_credential(tables: &mut Tables, user_id: String, email: String) -> Credential {
        tables.refresh_tokens.retain(|_, owner| *owner != user_id);
        let refresh_token = new_id();
        tables
            .refresh_tokens
            .insert(refresh_token.clone(), user_id.clone());
        Credential {
            user_id,
            email: Some(email),
            access_token: new_id(),
            refresh_token,
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    // Signed-in user id, the stand-in for auth.uid() in row policies
    fn current_user(&self) -> BackendResult<String> {
        self.auth
            .session()
            .map(|s| s.user_id)
            .ok_or(BackendError::NotSignedIn)
    }

    fn require_user(&self, user_id: &str) -> BackendResult<()> {
        if self.current_user()? == user_id {
            Ok(())
        } else {
            Err(forbidden())
        }
    }

    fn require_playlist_owner(&self, tables: &Tables, playlist_id: &str) -> BackendResult<()> {
        let user_id = self.current_user()?;
        let owned = tables
            .playlists
            .iter()
            .any(|p| p.id == playlist_id && p.user_id == user_id);
        if owned {
            Ok(())
        } else {
            Err(forbidden())
        }
    }

    // Accounts are keyed by lowercase email
    fn email_key(email: &str) -> String {
        email.trim().to_lowercase()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn auth_changes(&self) -> watch::Receiver<Option<Session>> {
        self.auth.subscribe()
    }

    fn credential(&self) -> Option<Credential> {
        self.auth.credential()
    }

    fn persist_credentials(&self, store: CredentialStore) {
        self.auth.persist_to(store);
    }

    async fn sign_up(&self, email: &str, password: &str) -> BackendResult<Session> {
        let key = Self::email_key(email);
        if key.is_empty() || !key.contains('@') {
            return Err(BackendError::Auth(
                "Unable to validate email address: invalid format".to_string(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(BackendError::Auth(format!(
                "Password should be at least {MIN_PASSWORD_LEN} characters."
            )));
        }

        let credential = {
            let mut tables = self.tables();
            if tables.accounts.contains_key(&key) {
                return Err(BackendError::Auth("User already registered".to_string()));
            }
            let account = Account {
                user_id: new_id(),
                email: key.clone(),
                password: password.to_string(),
            };
            let credential =
                Self::issue_credential(&mut tables, account.user_id.clone(), key.clone());
            tables.accounts.insert(key, account);
            credential
        };

        let session = credential.session();
        self.auth.set(Some(credential));
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session> {
        let credential = {
            let mut tables = self.tables();
            let key = Self::email_key(email);
            let (user_id, email) = match tables.accounts.get(&key) {
                Some(account) if account.password == password => {
                    (account.user_id.clone(), account.email.clone())
                }
                _ => return Err(BackendError::Auth("Invalid login credentials".to_string())),
            };
            Self::issue_credential(&mut tables, user_id, email)
        };

        let session = credential.session();
        self.auth.set(Some(credential));
        Ok(session)
    }

    async fn sign_out(&self) -> BackendResult<()> {
        if let Some(credential) = self.auth.credential() {
            self.tables().refresh_tokens.remove(&credential.refresh_token);
        }
        self.auth.clear();
        Ok(())
    }

    // Refresh tokens are single use, like the hosted service
    async fn restore(&self, credential: Credential) -> BackendResult<Session> {
        let fresh = {
            let mut tables = self.tables();
            let user_id = tables
                .refresh_tokens
                .remove(&credential.refresh_token)
                .ok_or_else(|| {
                    BackendError::Auth("Invalid Refresh Token: Refresh Token Not Found".to_string())
                })?;
            let email = tables
                .accounts
                .values()
                .find(|a| a.user_id == user_id)
                .map(|a| a.email.clone())
                .ok_or_else(|| BackendError::Auth("User not found".to_string()))?;
            Self::issue_credential(&mut tables, user_id, email)
        };

        let session = fresh.session();
        self.auth.set(Some(fresh));
        Ok(session)
    }

    async fn get_profile(&self, user_id: &str) -> BackendResult<Option<Profile>> {
        Ok(self.tables().profiles.get(user_id).cloned())
    }

    async fn insert_profile_if_absent(&self, profile: &NewProfile) -> BackendResult<Profile> {
        self.require_user(&profile.id)?;
        let mut tables = self.tables();
        let row = tables
            .profiles
            .entry(profile.id.clone())
            .or_insert_with(|| Profile {
                id: profile.id.clone(),
                username: profile.username.clone(),
                avatar_url: profile.avatar_url.clone(),
                updated_at: Utc::now(),
            });
        Ok(row.clone())
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> BackendResult<Profile> {
        self.require_user(user_id)?;
        let mut tables = self.tables();
        let row = tables
            .profiles
            .get_mut(user_id)
            .ok_or_else(|| BackendError::NotFound("profile".to_string()))?;
        row.username = Some(update.username.clone());
        row.avatar_url = Some(update.avatar_url.clone());
        row.updated_at = update.updated_at;
        Ok(row.clone())
    }

    async fn list_playlists(&self, user_id: &str) -> BackendResult<Vec<Playlist>> {
        self.require_user(user_id)?;
        let tables = self.tables();
        Ok(newest_first(
            tables.playlists.iter().filter(|p| p.user_id == user_id).cloned(),
            |p| p.created_at,
        ))
    }

    async fn create_playlist(&self, playlist: &NewPlaylist) -> BackendResult<Playlist> {
        self.require_user(&playlist.user_id)?;
        let now = Utc::now();
        let row = Playlist {
            id: new_id(),
            user_id: playlist.user_id.clone(),
            name: playlist.name.clone(),
            description: playlist.description.clone(),
            created_at: now,
            updated_at: now,
        };
        self.tables().playlists.push(row.clone());
        Ok(row)
    }

    async fn delete_playlist(&self, playlist_id: &str) -> BackendResult<()> {
        let mut tables = self.tables();
        self.require_playlist_owner(&tables, playlist_id)?;
        tables.playlists.retain(|p| p.id != playlist_id);
        tables.playlist_songs.retain(|s| s.playlist_id != playlist_id);
        Ok(())
    }

    async fn list_liked_songs(&self, user_id: &str) -> BackendResult<Vec<LikedSong>> {
        self.require_user(user_id)?;
        let tables = self.tables();
        Ok(newest_first(
            tables.liked_songs.iter().filter(|s| s.user_id == user_id).cloned(),
            |s| s.liked_at,
        ))
    }

    async fn find_liked_song(
        &self,
        user_id: &str,
        video_id: &str,
    ) -> BackendResult<Option<LikedSong>> {
        self.require_user(user_id)?;
        Ok(self
            .tables()
            .liked_songs
            .iter()
            .find(|s| s.user_id == user_id && s.video_id == video_id)
            .cloned())
    }

    async fn insert_liked_song(&self, song: &NewLikedSong) -> BackendResult<LikedSong> {
        self.require_user(&song.user_id)?;
        let row = LikedSong {
            id: new_id(),
            user_id: song.user_id.clone(),
            video_id: song.video_id.clone(),
            title: song.title.clone(),
            thumbnail: song.thumbnail.clone(),
            channel_title: song.channel_title.clone(),
            liked_at: Utc::now(),
        };
        self.tables().liked_songs.push(row.clone());
        Ok(row)
    }

    async fn delete_liked_song(&self, user_id: &str, video_id: &str) -> BackendResult<()> {
        self.require_user(user_id)?;
        self.tables()
            .liked_songs
            .retain(|s| !(s.user_id == user_id && s.video_id == video_id));
        Ok(())
    }

    async fn list_playlist_songs(&self, playlist_id: &str) -> BackendResult<Vec<PlaylistSong>> {
        let tables = self.tables();
        self.require_playlist_owner(&tables, playlist_id)?;
        let mut rows: Vec<PlaylistSong> = tables
            .playlist_songs
            .iter()
            .filter(|s| s.playlist_id == playlist_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.added_at);
        Ok(rows)
    }

    async fn insert_playlist_song(&self, song: &NewPlaylistSong) -> BackendResult<PlaylistSong> {
        let mut tables = self.tables();
        self.require_playlist_owner(&tables, &song.playlist_id)?;
        let row = PlaylistSong {
            id: new_id(),
            playlist_id: song.playlist_id.clone(),
            video_id: song.video_id.clone(),
            title: song.title.clone(),
            thumbnail: song.thumbnail.clone(),
            channel_title: song.channel_title.clone(),
            added_at: Utc::now(),
        };
        tables.playlist_songs.push(row.clone());
        Ok(row)
    }

    async fn delete_playlist_song(&self, playlist_id: &str, video_id: &str) -> BackendResult<()> {
        let mut tables = self.tables();
        self.require_playlist_owner(&tables, playlist_id)?;
        tables
            .playlist_songs
            .retain(|s| !(s.playlist_id == playlist_id && s.video_id == video_id));
        Ok(())
    }
}
