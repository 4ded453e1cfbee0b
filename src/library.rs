// ==========================================
// LIBRARY
// ==========================================
// Everything a user does with their account: sign up / in / out, profile,
// liked songs and playlists. Each method is a short sequence of Backend
// calls; the backend holds all the state.
//
// Every method except the auth ones needs a signed-in session and returns
// BackendError::NotSignedIn otherwise.

use chrono::Utc;
use reqwest::Url;
use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::{
    Backend, CredentialStore, NewLikedSong, NewPlaylist, NewPlaylistSong, NewProfile, Playlist,
    Profile, ProfileUpdate, Session,
};
use crate::error::{BackendError, BackendResult};
use crate::player::Track;
use crate::session::SessionState;

const AVATAR_BASE_URL: &str = "https://api.dicebear.com/7.x/avatars/svg";
const DEFAULT_USERNAME: &str = "User";

// Generated avatar, stable for a given seed
pub fn avatar_url(seed: &str) -> String {
    match Url::parse_with_params(AVATAR_BASE_URL, &[("seed", seed)]) {
        Ok(url) => url.to_string(),
        Err(_) => AVATAR_BASE_URL.to_string(),
    }
}

pub struct Library {
    backend: Arc<dyn Backend>,
    session: SessionState,
    credentials: Option<CredentialStore>,
}

impl Library {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let session = SessionState::new(backend.as_ref());
        Library {
            backend,
            session,
            credentials: None,
        }
    }

    // Remember logins across restarts. The backend keeps the file current
    // from here on, refreshed tokens included.
    pub fn with_credentials(mut self, store: CredentialStore) -> Self {
        self.backend.persist_credentials(store.clone());
        self.credentials = Some(store);
        self
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    // ==========================================
    // AUTH
    // ==========================================

    // Creates the account and its profile. The profile step is an upsert,
    // so retrying a half-finished sign-up never duplicates the row.
    // Once the account exists the user is signed in: a failed profile write
    // is only logged, and profile() creates the row on next access.
    pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> BackendResult<Session> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BackendError::InvalidInput("Please enter your name".to_string()));
        }

        let session = self.backend.sign_up(email.trim(), password).await?;
        info!(user_id = %session.user_id, "account created");

        let profile = NewProfile {
            id: session.user_id.clone(),
            username: Some(name.to_string()),
            avatar_url: Some(avatar_url(name)),
        };
        if let Err(e) = self.backend.insert_profile_if_absent(&profile).await {
            warn!(user_id = %session.user_id, "Failed to create profile: {}", e);
        }

        Ok(session)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session> {
        self.backend.sign_in(email.trim(), password).await
    }

    pub async fn sign_out(&self) -> BackendResult<()> {
        self.backend.sign_out().await
    }

    // Log back in with the credential saved by the previous run.
    // A stale or rejected credential is discarded.
    pub async fn restore_saved_session(&self) -> Option<Session> {
        let store = self.credentials.as_ref()?;
        let credential = store.load()?;

        match self.backend.restore(credential).await {
            Ok(session) => {
                info!(user_id = %session.user_id, "restored saved session");
                Some(session)
            }
            Err(e) => {
                warn!("Saved session is no longer valid: {}", e);
                if let Err(e) = store.clear() {
                    warn!("Failed to remove saved session: {}", e);
                }
                None
            }
        }
    }

    // ==========================================
    // PROFILE
    // ==========================================

    // The profile row, created on first access. The default name is the
    // part of the email before the '@'.
    pub async fn profile(&self) -> BackendResult<Profile> {
        let session = self.session.require()?;
        if let Some(profile) = self.backend.get_profile(&session.user_id).await? {
            return Ok(profile);
        }

        let username = session.email_name().unwrap_or(DEFAULT_USERNAME).to_string();
        let profile = NewProfile {
            id: session.user_id.clone(),
            username: Some(username),
            avatar_url: Some(avatar_url(&session.user_id)),
        };
        self.backend.insert_profile_if_absent(&profile).await
    }

    pub async fn rename(&self, name: &str) -> BackendResult<Profile> {
        let session = self.session.require()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(BackendError::InvalidInput("Name can't be empty".to_string()));
        }

        // make sure there is a row to update
        self.profile().await?;

        let update = ProfileUpdate {
            username: name.to_string(),
            avatar_url: avatar_url(name),
            updated_at: Utc::now(),
        };
        self.backend.update_profile(&session.user_id, &update).await
    }

    // ==========================================
    // LIKED SONGS
    // ==========================================
    // The row is the like. There is no flag to flip: liking inserts,
    // unliking deletes.

    pub async fn is_liked(&self, track: &Track) -> BackendResult<bool> {
        let session = self.session.require()?;
        Ok(self
            .backend
            .find_liked_song(&session.user_id, &track.id)
            .await?
            .is_some())
    }

    // Returns the new state: true if the track is now liked
    pub async fn toggle_like(&self, track: &Track) -> BackendResult<bool> {
        let session = self.session.require()?;
        let liked = self
            .backend
            .find_liked_song(&session.user_id, &track.id)
            .await?
            .is_some();

        if liked {
            self.backend
                .delete_liked_song(&session.user_id, &track.id)
                .await?;
        } else {
            self.backend
                .insert_liked_song(&NewLikedSong::from_track(&session.user_id, track))
                .await?;
        }
        Ok(!liked)
    }

    // Newest first
    pub async fn liked_songs(&self) -> BackendResult<Vec<Track>> {
        let session = self.session.require()?;
        let rows = self.backend.list_liked_songs(&session.user_id).await?;
        Ok(rows.iter().map(|row| row.to_track()).collect())
    }

    // ==========================================
    // PLAYLISTS
    // ==========================================

    pub async fn playlists(&self) -> BackendResult<Vec<Playlist>> {
        let session = self.session.require()?;
        self.backend.list_playlists(&session.user_id).await
    }

    pub async fn create_playlist(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> BackendResult<Playlist> {
        let session = self.session.require()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(BackendError::InvalidInput("Give your playlist a name".to_string()));
        }

        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        let playlist = NewPlaylist {
            user_id: session.user_id,
            name: name.to_string(),
            description,
        };
        self.backend.create_playlist(&playlist).await
    }

    pub async fn delete_playlist(&self, playlist_id: &str) -> BackendResult<()> {
        self.session.require()?;
        self.backend.delete_playlist(playlist_id).await
    }

    pub async fn add_to_playlist(&self, playlist_id: &str, track: &Track) -> BackendResult<()> {
        self.session.require()?;
        self.backend
            .insert_playlist_song(&NewPlaylistSong::from_track(playlist_id, track))
            .await?;
        Ok(())
    }

    pub async fn remove_from_playlist(&self, playlist_id: &str, video_id: &str) -> BackendResult<()> {
        self.session.require()?;
        self.backend.delete_playlist_song(playlist_id, video_id).await
    }

    // In the order they were added
    pub async fn playlist_tracks(&self, playlist_id: &str) -> BackendResult<Vec<Track>> {
        self.session.require()?;
        let rows = self.backend.list_playlist_songs(playlist_id).await?;
        Ok(rows.iter().map(|row| row.to_track()).collect())
    }
}
