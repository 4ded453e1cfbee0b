// Music streaming client library
//
// - youtube: trending list and keyword search against the YouTube Data API
// - backend: hosted auth + library tables (or an in-memory stand-in)
// - session: who is logged in
// - player: the shared "now playing" state
// - library: account actions (likes, playlists, profile)
// - ui: the terminal shell that ties it together

pub mod backend;
pub mod config;
pub mod error;
pub mod library;
pub mod logging;
pub mod player;
pub mod session;
pub mod ui;
pub mod youtube;

pub use error::{BackendError, BackendResult, CatalogError};
pub use library::Library;
pub use player::{PlaybackCoordinator, PlaybackSelection, Track};
pub use session::SessionState;
pub use youtube::{MediaCatalog, SearchOutcome, SearchSession, YouTubeCatalog};
