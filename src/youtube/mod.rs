// YouTube Data API access: trending list, keyword search

pub mod catalog;
pub mod search;

pub use catalog::{MediaCatalog, YouTubeCatalog};
pub use search::{SearchOutcome, SearchSession};
