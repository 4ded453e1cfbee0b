// Rows of the four backend tables, plus the signed-in identity
//
// Column names match the hosted database exactly (snake_case), so these
// structs go straight through serde in both directions. The New* structs
// are insert payloads: ids and timestamps are filled in by the database.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::player::Track;

// Who is logged in. This is what screens observe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
}

impl Session {
    // "ann" for "ann@example.com", used as the default profile name
    pub fn email_name(&self) -> Option<&str> {
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|name| !name.is_empty())
    }
}

// Session plus the tokens needed to act as that user.
// Persisted to session.json so the next launch can restore it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub user_id: String,
    pub email: Option<String>,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn session(&self) -> Session {
        Session {
            user_id: self.user_id.clone(),
            email: self.email.clone(),
        }
    }

    // Treat tokens as expired a minute early so a request never races the expiry
    pub fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(60) >= self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProfile {
    pub id: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub username: String,
    pub avatar_url: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPlaylist {
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikedSong {
    pub id: String,
    pub user_id: String,
    pub video_id: String,
    pub title: String,
    pub thumbnail: String,
    pub channel_title: String,
    pub liked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewLikedSong {
    pub user_id: String,
    pub video_id: String,
    pub title: String,
    pub thumbnail: String,
    pub channel_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSong {
    pub id: String,
    pub playlist_id: String,
    pub video_id: String,
    pub title: String,
    pub thumbnail: String,
    pub channel_title: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPlaylistSong {
    pub playlist_id: String,
    pub video_id: String,
    pub title: String,
    pub thumbnail: String,
    pub channel_title: String,
}

impl LikedSong {
    pub fn to_track(&self) -> Track {
        Track::new(
            self.video_id.clone(),
            self.title.clone(),
            self.thumbnail.clone(),
            self.channel_title.clone(),
        )
    }
}

impl PlaylistSong {
    pub fn to_track(&self) -> Track {
        Track::new(
            self.video_id.clone(),
            self.title.clone(),
            self.thumbnail.clone(),
            self.channel_title.clone(),
        )
    }
}

impl NewLikedSong {
    pub fn from_track(user_id: &str, track: &Track) -> Self {
        NewLikedSong {
            user_id: user_id.to_string(),
            video_id: track.id.clone(),
            title: track.title.clone(),
            thumbnail: track.thumbnail.clone(),
            channel_title: track.channel_title.clone(),
        }
    }
}

impl NewPlaylistSong {
    pub fn from_track(playlist_id: &str, track: &Track) -> Self {
        NewPlaylistSong {
            playlist_id: playlist_id.to_string(),
            video_id: track.id.clone(),
            title: track.title.clone(),
            thumbnail: track.thumbnail.clone(),
            channel_title: track.channel_title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_name_is_local_part() {
        let session = Session {
            user_id: "u1".into(),
            email: Some("ann@example.com".into()),
        };
        assert_eq!(session.email_name(), Some("ann"));

        let session = Session {
            user_id: "u1".into(),
            email: Some("@example.com".into()),
        };
        assert_eq!(session.email_name(), None);
    }

    #[test]
    fn parses_postgrest_timestamps() {
        let row: LikedSong = serde_json::from_str(
            r#"{
                "id": "1", "user_id": "u1", "video_id": "xyz",
                "title": "Song", "thumbnail": "http://img", "channel_title": "Artist",
                "liked_at": "2024-03-01T12:30:00.123456+00:00"
            }"#,
        )
        .unwrap();
        assert_eq!(row.to_track(), Track::new("xyz", "Song", "http://img", "Artist"));
    }

    #[test]
    fn credential_expiry_has_a_margin() {
        let mut credential = Credential {
            user_id: "u1".into(),
            email: None,
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: Utc::now() + Duration::seconds(30),
        };
        assert!(credential.is_expired());
        credential.expires_at = Utc::now() + Duration::hours(1);
        assert!(!credential.is_expired());
    }
}
