// YouTube catalog client
// Fetches trending music and keyword search results from the YouTube Data API
//
// Both calls degrade silently: any network, status or JSON failure is logged
// and the caller gets an empty list. No retries, no caching.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::YouTubeConfig;
use crate::error::CatalogError;
use crate::player::Track;

// Anything that can hand out tracks. The shell only talks to this trait,
// which lets tests swap in a canned catalog.
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    async fn trending(&self) -> Vec<Track>;
    async fn search(&self, keyword: &str) -> Vec<Track>;
}

pub struct YouTubeCatalog {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    category_id: String,
    max_results: u32,
}

// ==========================================
// RESPONSE SHAPES
// ==========================================
// Only the fields we read. "videos" returns the id as a plain string,
// "search" wraps it in an object with a videoId (absent for channels).

#[derive(Debug, Deserialize)]
struct ListResponse<I> {
    #[serde(default = "Vec::new")]
    items: Vec<I>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct SearchId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(rename = "channelTitle", default)]
    channel_title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl Snippet {
    fn into_track(self, id: String) -> Track {
        let thumbnail = self
            .thumbnails
            .high
            .or(self.thumbnails.medium)
            .or(self.thumbnails.default)
            .map(|t| t.url)
            .unwrap_or_default();
        Track::new(id, self.title, thumbnail, self.channel_title)
    }
}

pub(crate) fn parse_trending(body: &str) -> Result<Vec<Track>, CatalogError> {
    let response: ListResponse<VideoItem> = serde_json::from_str(body)?;
    Ok(response
        .items
        .into_iter()
        .map(|item| item.snippet.into_track(item.id))
        .collect())
}

pub(crate) fn parse_search(body: &str) -> Result<Vec<Track>, CatalogError> {
    let response: ListResponse<SearchItem> = serde_json::from_str(body)?;
    Ok(response
        .items
        .into_iter()
        .filter_map(|item| {
            let id = item.id.video_id?;
            Some(item.snippet.into_track(id))
        })
        .collect())
}

impl YouTubeCatalog {
    pub fn new(config: &YouTubeConfig) -> Self {
        if config.api_key.is_empty() {
            warn!("No YouTube API key configured, catalog requests will fail");
        }
        YouTubeCatalog {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            category_id: config.category_id.clone(),
            max_results: config.max_results,
        }
    }

    async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, CatalogError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let max_results = self.max_results.to_string();

        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[
                ("part", "snippet"),
                ("videoCategoryId", self.category_id.as_str()),
                ("maxResults", max_results.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    pub async fn try_trending(&self) -> Result<Vec<Track>, CatalogError> {
        let body = self.get("videos", &[("chart", "mostPopular")]).await?;
        parse_trending(&body)
    }

    pub async fn try_search(&self, keyword: &str) -> Result<Vec<Track>, CatalogError> {
        let body = self
            .get("search", &[("q", keyword), ("type", "video")])
            .await?;
        parse_search(&body)
    }
}

#[async_trait]
impl MediaCatalog for YouTubeCatalog {
    async fn trending(&self) -> Vec<Track> {
        match self.try_trending().await {
            Ok(tracks) => {
                debug!(count = tracks.len(), "fetched trending music");
                tracks
            }
            Err(e) => {
                warn!("Error fetching trending music: {}", e);
                Vec::new()
            }
        }
    }

    async fn search(&self, keyword: &str) -> Vec<Track> {
        match self.try_search(keyword).await {
            Ok(tracks) => {
                debug!(keyword, count = tracks.len(), "search finished");
                tracks
            }
            Err(e) => {
                warn!("Error searching music: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRENDING: &str = r#"{
        "kind": "youtube#videoListResponse",
        "items": [
            {
                "id": "abc123",
                "snippet": {
                    "title": "Hit Song",
                    "channelTitle": "Big Artist",
                    "thumbnails": {
                        "default": { "url": "http://img/abc-default.jpg" },
                        "high": { "url": "http://img/abc-high.jpg" }
                    }
                }
            },
            {
                "id": "def456",
                "snippet": {
                    "title": "Indie Tune",
                    "channelTitle": "Small Band",
                    "thumbnails": {
                        "medium": { "url": "http://img/def-medium.jpg" }
                    }
                }
            }
        ]
    }"#;

    const SEARCH: &str = r#"{
        "items": [
            {
                "id": { "kind": "youtube#video", "videoId": "xyz" },
                "snippet": {
                    "title": "Song",
                    "channelTitle": "Artist",
                    "thumbnails": { "high": { "url": "http://img/xyz.jpg" } }
                }
            },
            {
                "id": { "kind": "youtube#channel", "channelId": "UC1" },
                "snippet": { "title": "Artist channel", "channelTitle": "Artist" }
            }
        ]
    }"#;

    #[test]
    fn trending_prefers_high_thumbnail_then_falls_back() {
        let tracks = parse_trending(TRENDING).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(
            tracks[0],
            Track::new("abc123", "Hit Song", "http://img/abc-high.jpg", "Big Artist")
        );
        assert_eq!(tracks[1].thumbnail, "http://img/def-medium.jpg");
    }

    #[test]
    fn search_uses_nested_video_id_and_skips_non_videos() {
        let tracks = parse_search(SEARCH).unwrap();
        assert_eq!(
            tracks,
            vec![Track::new("xyz", "Song", "http://img/xyz.jpg", "Artist")]
        );
    }

    #[test]
    fn missing_items_is_an_empty_list() {
        assert!(parse_trending("{}").unwrap().is_empty());
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            parse_search("<html>quota exceeded</html>"),
            Err(CatalogError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_api_degrades_to_empty_results() {
        let config = YouTubeConfig {
            api_key: "test".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            ..YouTubeConfig::default()
        };
        let catalog = YouTubeCatalog::new(&config);

        assert!(catalog.try_trending().await.is_err());
        assert!(catalog.trending().await.is_empty());
        assert!(catalog.search("daft punk").await.is_empty());
    }
}
