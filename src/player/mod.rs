// Playback state shared between screens

pub mod coordinator;
pub mod track;

pub use coordinator::{PlaybackCoordinator, PlaybackSelection};
pub use track::Track;
