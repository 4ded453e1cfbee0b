// Shared fixtures for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tunestream::backend::MemoryBackend;
use tunestream::{Library, MediaCatalog, Track};

pub fn song() -> Track {
    Track::new("xyz", "Song", "http://img/xyz.jpg", "Artist")
}

pub fn other_song() -> Track {
    Track::new("abc", "Other Song", "http://img/abc.jpg", "Band")
}

// Canned catalog that counts how often it is asked
#[derive(Default)]
pub struct StubCatalog {
    pub trending_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
}

impl StubCatalog {
    pub fn searches(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaCatalog for StubCatalog {
    async fn trending(&self) -> Vec<Track> {
        self.trending_calls.fetch_add(1, Ordering::SeqCst);
        vec![other_song(), song()]
    }

    async fn search(&self, keyword: &str) -> Vec<Track> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if keyword.eq_ignore_ascii_case("song") {
            vec![song()]
        } else {
            Vec::new()
        }
    }
}

pub fn offline_library() -> (Arc<MemoryBackend>, Library) {
    let backend = Arc::new(MemoryBackend::new());
    let library = Library::new(backend.clone());
    (backend, library)
}
