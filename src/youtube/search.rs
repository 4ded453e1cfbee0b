// ==========================================
// SEARCH SESSION
// ==========================================
// Wraps a MediaCatalog with the rules the search screen needs:
//
// 1. Short keywords are ignored
//    - Fewer than min_query_len characters (after trimming) issues no request
//    - The previous results stay as they are
//
// 2. Late responses never overwrite newer ones
//    - Every request takes the next sequence number
//    - When a response comes back, it is only published if its number is
//      still the latest one issued, checked and written as one step
//    - So typing "daf" then "daft" can't end with the "daf" results on screen,
//      even if that request is the slower one
//
// Results are published through a watch channel, same as the coordinator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use super::catalog::MediaCatalog;
use crate::player::Track;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    // Keyword too short, nothing was sent
    Skipped,
    // A newer search was issued while this one was in flight
    Superseded,
    // These results are now the current ones
    Applied(Vec<Track>),
}

pub struct SearchSession {
    catalog: Arc<dyn MediaCatalog>,
    min_query_len: usize,
    issued: AtomicU64,
    results: watch::Sender<Vec<Track>>,
}

impl SearchSession {
    pub fn new(catalog: Arc<dyn MediaCatalog>, min_query_len: usize) -> Self {
        let (results, _rx) = watch::channel(Vec::new());
        SearchSession {
            catalog,
            min_query_len,
            issued: AtomicU64::new(0),
            results,
        }
    }

    pub fn accepts(&self, keyword: &str) -> bool {
        keyword.trim().chars().count() >= self.min_query_len
    }

    pub async fn search(&self, keyword: &str) -> SearchOutcome {
        if !self.accepts(keyword) {
            debug!(keyword, "keyword too short, not searching");
            return SearchOutcome::Skipped;
        }

        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let tracks = self.catalog.search(keyword.trim()).await;

        // Checked under the channel's write lock, so a newer search can't
        // publish between the check and the write
        let published = self.results.send_if_modified(|current| {
            if self.issued.load(Ordering::SeqCst) != seq {
                return false;
            }
            *current = tracks.clone();
            true
        });

        if !published {
            debug!(keyword, seq, "discarding stale search response");
            return SearchOutcome::Superseded;
        }
        SearchOutcome::Applied(tracks)
    }

    pub fn results(&self) -> Vec<Track> {
        self.results.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Track>> {
        self.results.subscribe()
    }
}
