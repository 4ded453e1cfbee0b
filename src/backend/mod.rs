// Hosted backend access: auth plus the four library tables
//
// Backend is the seam between the app and the database. RemoteBackend
// talks to the hosted REST/auth API, MemoryBackend keeps everything in
// process for offline use and tests. Both behave the same way: every call
// is a direct pass-through, errors are returned as-is, last write wins.

pub mod auth;
pub mod credentials;
pub mod memory;
pub mod models;
pub mod remote;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::BackendResult;

pub use auth::AuthState;
pub use credentials::CredentialStore;
pub use memory::MemoryBackend;
pub use models::{
    Credential, LikedSong, NewLikedSong, NewPlaylist, NewPlaylistSong, NewProfile, Playlist,
    PlaylistSong, Profile, ProfileUpdate, Session,
};
pub use remote::RemoteBackend;

#[async_trait]
pub trait Backend: Send + Sync {
    // ---- auth ----

    // Receives the new Session (or None) every time the identity changes
    fn auth_changes(&self) -> watch::Receiver<Option<Session>>;

    // Current tokens
    fn credential(&self) -> Option<Credential>;

    // From now on, keep `store` in step with the credential: saved on
    // login and on every token refresh, removed on logout
    fn persist_credentials(&self, store: CredentialStore);

    async fn sign_up(&self, email: &str, password: &str) -> BackendResult<Session>;
    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session>;
    async fn sign_out(&self) -> BackendResult<()>;

    // Re-establish a saved login, refreshing the tokens if they expired
    async fn restore(&self, credential: Credential) -> BackendResult<Session>;

    // ---- profiles ----

    async fn get_profile(&self, user_id: &str) -> BackendResult<Option<Profile>>;

    // Insert unless a row with this id already exists, then return the
    // stored row. Safe to call any number of times.
    async fn insert_profile_if_absent(&self, profile: &NewProfile) -> BackendResult<Profile>;

    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate)
        -> BackendResult<Profile>;

    // ---- playlists ----

    // Newest first
    async fn list_playlists(&self, user_id: &str) -> BackendResult<Vec<Playlist>>;
    async fn create_playlist(&self, playlist: &NewPlaylist) -> BackendResult<Playlist>;
    async fn delete_playlist(&self, playlist_id: &str) -> BackendResult<()>;

    // ---- liked songs ----

    // Newest first
    async fn list_liked_songs(&self, user_id: &str) -> BackendResult<Vec<LikedSong>>;
    async fn find_liked_song(&self, user_id: &str, video_id: &str)
        -> BackendResult<Option<LikedSong>>;
    async fn insert_liked_song(&self, song: &NewLikedSong) -> BackendResult<LikedSong>;
    async fn delete_liked_song(&self, user_id: &str, video_id: &str) -> BackendResult<()>;

    // ---- playlist songs ----

    // In the order they were added
    async fn list_playlist_songs(&self, playlist_id: &str) -> BackendResult<Vec<PlaylistSong>>;
    async fn insert_playlist_song(&self, song: &NewPlaylistSong) -> BackendResult<PlaylistSong>;
    async fn delete_playlist_song(&self, playlist_id: &str, video_id: &str) -> BackendResult<()>;
}
