// Main entry point for the tunestream terminal client
// Loads config, wires the catalog, backend and player together, runs the shell

use anyhow::Result;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, warn};

use tunestream::backend::{Backend, CredentialStore, MemoryBackend, RemoteBackend};
use tunestream::config::AppConfig;
use tunestream::ui::{player_bar, SharedOutput, Shell};
use tunestream::{logging, Library, MediaCatalog, PlaybackCoordinator, YouTubeCatalog};

#[tokio::main]
async fn main() -> Result<()> {
    let config_dir = AppConfig::config_dir()?;
    let config = AppConfig::load(&config_dir)?;
    logging::init(&config.log_level)?;

    let catalog: Arc<dyn MediaCatalog> = Arc::new(YouTubeCatalog::new(&config.youtube));

    let backend: Arc<dyn Backend> = match &config.backend.url {
        Some(url) => {
            info!(url = %url, "using hosted backend");
            Arc::new(RemoteBackend::new(url, &config.backend))
        }
        None => {
            warn!("No backend URL configured, running offline: accounts and likes last until exit");
            Arc::new(MemoryBackend::new())
        }
    };

    // Offline accounts don't survive a restart, so there is nothing to save
    let mut library = Library::new(backend);
    if config.backend.url.is_some() {
        library = library.with_credentials(CredentialStore::new(&config_dir));
        library.restore_saved_session().await;
    }

    // One coordinator and one stdout for the whole app; the bar and the
    // shell share both
    let player = PlaybackCoordinator::new();
    let stdout = SharedOutput::new(tokio::io::stdout());
    let bar = player_bar::spawn(&player, stdout.clone());

    let mut shell = Shell::new(
        catalog,
        library,
        player,
        config.search.min_query_len,
        stdout,
    );
    shell.run(BufReader::new(tokio::io::stdin())).await?;

    bar.abort();
    Ok(())
}
