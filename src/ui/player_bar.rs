// The persistent "now playing" bar
//
// Started once at launch. It subscribes to the playback coordinator and
// prints a line every time the selection or the play/pause flag changes,
// whichever screen caused it.

use tokio::io::AsyncWrite;
use tokio::task::JoinHandle;
use tracing::debug;

use super::output::SharedOutput;
use crate::player::{PlaybackCoordinator, PlaybackSelection};

pub fn render(selection: &PlaybackSelection) -> String {
    match (&selection.track, selection.playing) {
        (None, _) => "⏹ Nothing playing".to_string(),
        (Some(track), true) => format!(
            "▶ Now playing: {}  [{}]",
            track.display_line(),
            track.watch_url()
        ),
        (Some(track), false) => format!("⏸ Paused: {}", track.display_line()),
    }
}

pub fn spawn<W>(player: &PlaybackCoordinator, out: SharedOutput<W>) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut updates = player.subscribe();

    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let line = render(&updates.borrow_and_update());
            if let Err(e) = out.write_line(&line).await {
                debug!("player bar can't write: {}", e);
                break;
            }
        }
        debug!("player bar stopped");
    })
}
