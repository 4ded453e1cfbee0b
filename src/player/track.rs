// ==========================================
// TRACK STRUCT
// ==========================================
// A single playable item from the YouTube catalog.
//
// Fields:
// - id: the YouTube video id ("dQw4w9WgXcQ")
// - title: the video title as shown in lists
// - thumbnail: high resolution thumbnail URL (may be empty)
// - channel_title: uploader channel, displayed as the artist
//
// Tracks are transient. They are built fresh from every catalog response,
// or rebuilt from the denormalized columns of liked/playlist rows.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    #[serde(rename = "channelTitle")]
    pub channel_title: String,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        thumbnail: impl Into<String>,
        channel_title: impl Into<String>,
    ) -> Self {
        Track {
            id: id.into(),
            title: title.into(),
            thumbnail: thumbnail.into(),
            channel_title: channel_title.into(),
        }
    }

    // Page the player opens when the user asks to watch the track
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }

    // "Title - Channel", the format every list and the player bar use
    pub fn display_line(&self) -> String {
        format!("{} - {}", self.title, self.channel_title)
    }
}
