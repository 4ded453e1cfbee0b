// HTTP client for the hosted backend
//
// Two APIs behind one base URL:
// - {url}/auth/v1/...  sign-up, password and refresh-token grants, logout
// - {url}/rest/v1/...  one resource per table, filters as query params
//   (?user_id=eq.abc&order=liked_at.desc)
//
// Every request carries the project's anon key as "apikey". The bearer token
// is the signed-in user's access token, or the anon key when logged out.
// Row access rules are enforced server-side.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::auth::{auth_error_message, credential_from_token_response, AuthState};
use super::credentials::CredentialStore;
use super::models::*;
use super::Backend;
use crate::config::BackendConfig;
use crate::error::{BackendError, BackendResult};

const RETURN_ROWS: &str = "return=representation";
const IGNORE_DUPLICATES: &str = "resolution=ignore-duplicates,return=representation";

pub struct RemoteBackend {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    auth: AuthState,
}

#[derive(Debug, Deserialize)]
struct RestErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

pub(crate) fn rest_error(status: StatusCode, body: &str) -> BackendError {
    let (code, message) = match serde_json::from_str::<RestErrorBody>(body) {
        Ok(err) => {
            let message = match (err.message, err.details) {
                (Some(m), Some(d)) => format!("{m} ({d})"),
                (Some(m), None) => m,
                (None, Some(d)) => d,
                (None, None) => body.trim().to_string(),
            };
            (err.code, message)
        }
        Err(_) => (None, body.trim().to_string()),
    };

    BackendError::Api {
        status: status.as_u16(),
        code,
        message,
    }
}

fn first_row<T>(rows: Vec<T>, what: &str) -> BackendResult<T> {
    rows.into_iter()
        .next()
        .ok_or_else(|| BackendError::NotFound(what.to_string()))
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

impl RemoteBackend {
    pub fn new(url: &str, config: &BackendConfig) -> Self {
        RemoteBackend {
            http: reqwest::Client::new(),
            base_url: url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            auth: AuthState::new(),
        }
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    // ==========================================
    // AUTH REQUESTS
    // ==========================================

    async fn token_request(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> BackendResult<Credential> {
        let response = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&body)
            .send()
            .await?;
        Self::read_credential(response).await
    }

    async fn read_credential(response: reqwest::Response) -> BackendResult<Credential> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BackendError::Auth(auth_error_message(&body)));
        }
        credential_from_token_response(&body)
    }

    async fn refresh(&self, refresh_token: &str) -> BackendResult<Credential> {
        debug!("refreshing access token");
        self.token_request("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    // Token for the next REST call. Expired tokens are refreshed first; if
    // that fails the user is signed out and the call goes out as anon.
    async fn bearer(&self) -> String {
        let Some(credential) = self.auth.credential() else {
            return self.anon_key.clone();
        };
        if !credential.is_expired() {
            return credential.access_token;
        }

        match self.refresh(&credential.refresh_token).await {
            Ok(fresh) => {
                let token = fresh.access_token.clone();
                self.auth.set(Some(fresh));
                token
            }
            Err(e) => {
                warn!("Session expired and could not be refreshed: {}", e);
                self.auth.clear();
                self.anon_key.clone()
            }
        }
    }

    // ==========================================
    // TABLE REQUESTS
    // ==========================================

    async fn rest(&self, method: Method, table: &str) -> RequestBuilder {
        let bearer = self.bearer().await;
        self.http
            .request(method, self.rest_url(table))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    async fn fetch_rows<T: DeserializeOwned>(request: RequestBuilder) -> BackendResult<Vec<T>> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(rest_error(status, &body));
        }
        // ignore-duplicates with nothing inserted answers with an empty body
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn execute(request: RequestBuilder) -> BackendResult<()> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(rest_error(status, &body));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for RemoteBackend {
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
        let response = self
            .http
            .post(self.auth_url("signup"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let credential = Self::read_credential(response).await?;
        let session = credential.session();
        self.auth.set(Some(credential));
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session> {
        let credential = self
            .token_request("password", json!({ "email": email, "password": password }))
            .await?;
        let session = credential.session();
        self.auth.set(Some(credential));
        Ok(session)
    }

    // Local state is cleared whether or not the server call succeeds
    async fn sign_out(&self) -> BackendResult<()> {
        let Some(credential) = self.auth.credential() else {
            return Ok(());
        };
        self.auth.clear();

        let response = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&credential.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() && status != StatusCode::UNAUTHORIZED {
            let body = response.text().await?;
            return Err(BackendError::Auth(auth_error_message(&body)));
        }
        Ok(())
    }

    async fn restore(&self, credential: Credential) -> BackendResult<Session> {
        let credential = if credential.is_expired() {
            self.refresh(&credential.refresh_token).await?
        } else {
            credential
        };
        let session = credential.session();
        self.auth.set(Some(credential));
        Ok(session)
    }

    async fn get_profile(&self, user_id: &str) -> BackendResult<Option<Profile>> {
        let request = self
            .rest(Method::GET, "profiles")
            .await
            .query(&[("id", eq(user_id)), ("select", "*".to_string())]);
        let rows: Vec<Profile> = Self::fetch_rows(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_profile_if_absent(&self, profile: &NewProfile) -> BackendResult<Profile> {
        let request = self
            .rest(Method::POST, "profiles")
            .await
            .query(&[("on_conflict", "id")])
            .header("Prefer", IGNORE_DUPLICATES)
            .json(profile);
        let inserted: Vec<Profile> = Self::fetch_rows(request).await?;

        if let Some(row) = inserted.into_iter().next() {
            return Ok(row);
        }
        // Row already existed, read it back
        self.get_profile(&profile.id)
            .await?
            .ok_or_else(|| BackendError::NotFound("profile".to_string()))
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> BackendResult<Profile> {
        let request = self
            .rest(Method::PATCH, "profiles")
            .await
            .query(&[("id", eq(user_id))])
            .header("Prefer", RETURN_ROWS)
            .json(update);
        first_row(Self::fetch_rows(request).await?, "profile")
    }

    async fn list_playlists(&self, user_id: &str) -> BackendResult<Vec<Playlist>> {
        let request = self.rest(Method::GET, "playlists").await.query(&[
            ("user_id", eq(user_id)),
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ]);
        Self::fetch_rows(request).await
    }

    async fn create_playlist(&self, playlist: &NewPlaylist) -> BackendResult<Playlist> {
        let request = self
            .rest(Method::POST, "playlists")
            .await
            .header("Prefer", RETURN_ROWS)
            .json(playlist);
        first_row(Self::fetch_rows(request).await?, "playlist")
    }

    async fn delete_playlist(&self, playlist_id: &str) -> BackendResult<()> {
        let request = self
            .rest(Method::DELETE, "playlists")
            .await
            .query(&[("id", eq(playlist_id))]);
        Self::execute(request).await
    }

    async fn list_liked_songs(&self, user_id: &str) -> BackendResult<Vec<LikedSong>> {
        let request = self.rest(Method::GET, "liked_songs").await.query(&[
            ("user_id", eq(user_id)),
            ("select", "*".to_string()),
            ("order", "liked_at.desc".to_string()),
        ]);
        Self::fetch_rows(request).await
    }

    async fn find_liked_song(
        &self,
        user_id: &str,
        video_id: &str,
    ) -> BackendResult<Option<LikedSong>> {
        let request = self.rest(Method::GET, "liked_songs").await.query(&[
            ("user_id", eq(user_id)),
            ("video_id", eq(video_id)),
            ("select", "*".to_string()),
            ("limit", "1".to_string()),
        ]);
        let rows: Vec<LikedSong> = Self::fetch_rows(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_liked_song(&self, song: &NewLikedSong) -> BackendResult<LikedSong> {
        let request = self
            .rest(Method::POST, "liked_songs")
            .await
            .header("Prefer", RETURN_ROWS)
            .json(song);
        first_row(Self::fetch_rows(request).await?, "liked song")
    }

    async fn delete_liked_song(&self, user_id: &str, video_id: &str) -> BackendResult<()> {
        let request = self
            .rest(Method::DELETE, "liked_songs")
            .await
            .query(&[("user_id", eq(user_id)), ("video_id", eq(video_id))]);
        Self::execute(request).await
    }

    async fn list_playlist_songs(&self, playlist_id: &str) -> BackendResult<Vec<PlaylistSong>> {
        let request = self.rest(Method::GET, "playlist_songs").await.query(&[
            ("playlist_id", eq(playlist_id)),
            ("select", "*".to_string()),
            ("order", "added_at.asc".to_string()),
        ]);
        Self::fetch_rows(request).await
    }

    async fn insert_playlist_song(&self, song: &NewPlaylistSong) -> BackendResult<PlaylistSong> {
        let request = self
            .rest(Method::POST, "playlist_songs")
            .await
            .header("Prefer", RETURN_ROWS)
            .json(song);
        first_row(Self::fetch_rows(request).await?, "playlist song")
    }

    async fn delete_playlist_song(&self, playlist_id: &str, video_id: &str) -> BackendResult<()> {
        let request = self
            .rest(Method::DELETE, "playlist_songs")
            .await
            .query(&[("playlist_id", eq(playlist_id)), ("video_id", eq(video_id))]);
        Self::execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_error_reads_postgrest_body() {
        let err = rest_error(
            StatusCode::CONFLICT,
            r#"{"code":"23505","details":"Key (id)=(u1) already exists.","hint":null,"message":"duplicate key value violates unique constraint \"profiles_pkey\""}"#,
        );
        match err {
            BackendError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 409);
                assert_eq!(code.as_deref(), Some("23505"));
                assert!(message.starts_with("duplicate key value"));
                assert!(message.contains("already exists"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rest_error_keeps_plain_text_bodies() {
        let err = rest_error(StatusCode::BAD_GATEWAY, "upstream timeout\n");
        assert!(matches!(
            err,
            BackendError::Api { status: 502, code: None, ref message } if message == "upstream timeout"
        ));
    }

    #[test]
    fn urls_are_built_from_trimmed_base() {
        let backend = RemoteBackend::new("https://project.example.co/", &BackendConfig::default());
        assert_eq!(
            backend.rest_url("liked_songs"),
            "https://project.example.co/rest/v1/liked_songs"
        );
        assert_eq!(backend.auth_url("token"), "https://project.example.co/auth/v1/token");
    }

    #[test]
    fn first_row_reports_missing_rows() {
        let rows: Vec<u8> = Vec::new();
        assert!(matches!(first_row(rows, "playlist"), Err(BackendError::NotFound(w)) if w == "playlist"));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let backend = RemoteBackend::new("http://127.0.0.1:9", &BackendConfig::default());
        let err = backend.sign_in("a@b.com", "secret1").await.unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
        assert!(backend.auth_changes().borrow().is_none());
    }
}
