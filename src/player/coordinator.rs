// ==========================================
// PLAYBACK COORDINATOR
// ==========================================
// The one shared record of "what is selected and is it playing".
//
// Every screen gets a clone of the coordinator. Clones share the same
// state, so selecting a track in the search list is immediately visible to
// the player bar, the liked list and anyone else holding a clone.
//
// Key Concept: tokio::sync::watch
// - A single-value channel: writers replace the value, readers see the latest
// - borrow() is a cheap synchronous read, no await needed
// - Every write wakes all receivers, which is how the player bar re-renders
// - Old values are dropped, never queued (there is no play queue here)
//
// Rules enforced on every write:
// - Selecting a track always starts playback
// - Clearing the track always stops playback
// - "playing" can never be true while nothing is selected

use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use super::track::Track;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackSelection {
    pub track: Option<Track>,
    pub playing: bool,
}

#[derive(Clone)]
pub struct PlaybackCoordinator {
    state: Arc<watch::Sender<PlaybackSelection>>,
}

impl PlaybackCoordinator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(PlaybackSelection::default());
        PlaybackCoordinator {
            state: Arc::new(tx),
        }
    }

    pub fn current_track(&self) -> Option<Track> {
        self.state.borrow().track.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    pub fn snapshot(&self) -> PlaybackSelection {
        self.state.borrow().clone()
    }

    // Replace the selection. Some(track) starts playing it, None stops.
    // send_replace works even when nobody is subscribed yet.
    pub fn set_current_track(&self, track: Option<Track>) {
        match &track {
            Some(t) => debug!(video_id = %t.id, title = %t.title, "track selected"),
            None => debug!("selection cleared"),
        }
        let playing = track.is_some();
        self.state.send_replace(PlaybackSelection { track, playing });
    }

    pub fn select(&self, track: Track) {
        self.set_current_track(Some(track));
    }

    pub fn clear(&self) {
        self.set_current_track(None);
    }

    // Returns the flag actually stored. Asking to play with nothing selected
    // leaves playback stopped and does not notify anyone.
    pub fn set_playing(&self, playing: bool) -> bool {
        let mut stored = false;
        self.state.send_if_modified(|selection| {
            let wanted = playing && selection.track.is_some();
            stored = wanted;
            if selection.playing == wanted {
                return false;
            }
            selection.playing = wanted;
            true
        });
        stored
    }

    pub fn toggle_playing(&self) -> bool {
        let playing = self.is_playing();
        self.set_playing(!playing)
    }

    // Each receiver starts with the current value marked as seen.
    // Call changed().await to wait for the next write.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSelection> {
        self.state.subscribe()
    }
}

impl Default for PlaybackCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song() -> Track {
        Track::new("xyz", "Song", "http://img/xyz.jpg", "Artist")
    }

    #[test]
    fn starts_empty_and_stopped() {
        let coordinator = PlaybackCoordinator::new();
        assert_eq!(coordinator.current_track(), None);
        assert!(!coordinator.is_playing());
    }

    #[test]
    fn selecting_reports_exact_track_and_plays() {
        let coordinator = PlaybackCoordinator::new();
        coordinator.select(song());
        assert_eq!(coordinator.current_track(), Some(song()));
        assert!(coordinator.is_playing());
    }

    #[test]
    fn new_selection_replaces_previous_one() {
        let coordinator = PlaybackCoordinator::new();
        coordinator.select(song());
        coordinator.set_playing(false);

        let other = Track::new("abc", "Other", "", "Band");
        coordinator.set_current_track(Some(other.clone()));

        assert_eq!(coordinator.current_track(), Some(other));
        assert!(coordinator.is_playing());
    }

    #[test]
    fn cannot_play_without_a_track() {
        let coordinator = PlaybackCoordinator::new();
        assert!(!coordinator.set_playing(true));
        assert!(!coordinator.is_playing());

        coordinator.select(song());
        coordinator.clear();
        assert!(!coordinator.is_playing());
        assert_eq!(coordinator.current_track(), None);
    }

    #[test]
    fn toggle_flips_flag() {
        let coordinator = PlaybackCoordinator::new();
        coordinator.select(song());
        assert!(!coordinator.toggle_playing());
        assert!(coordinator.toggle_playing());
    }

    #[test]
    fn clones_share_state() {
        let coordinator = PlaybackCoordinator::new();
        let screen = coordinator.clone();
        screen.select(song());
        assert_eq!(coordinator.current_track(), Some(song()));
    }

    #[tokio::test]
    async fn subscribers_are_notified_on_every_write() {
        let coordinator = PlaybackCoordinator::new();
        let mut rx = coordinator.subscribe();

        coordinator.select(song());
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().track, Some(song()));

        coordinator.set_playing(false);
        rx.changed().await.unwrap();
        assert!(!rx.borrow_and_update().playing);
    }

    #[tokio::test]
    async fn redundant_play_flag_does_not_notify() {
        let coordinator = PlaybackCoordinator::new();
        coordinator.select(song());
        let rx = coordinator.subscribe();

        coordinator.set_playing(true);
        assert!(!rx.has_changed().unwrap());
    }
}
