// Terminal output shared by the shell and the player bar
//
// Both print whole lines through one lock, so a playback update can't land
// in the middle of a listing.

use std::io;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

pub struct SharedOutput<W> {
    inner: Arc<Mutex<W>>,
}

impl<W> Clone for SharedOutput<W> {
    fn clone(&self) -> Self {
        SharedOutput {
            inner: self.inner.clone(),
        }
    }
}

impl<W: AsyncWrite + Unpin> SharedOutput<W> {
    pub fn new(out: W) -> Self {
        SharedOutput {
            inner: Arc::new(Mutex::new(out)),
        }
    }

    pub async fn write_line(&self, line: &str) -> io::Result<()> {
        let mut out = self.inner.lock().await;
        out.write_all(format!("{line}\n").as_bytes()).await?;
        out.flush().await
    }

    // The writer itself, once no other handle is left
    pub fn into_inner(self) -> Option<W> {
        Arc::try_unwrap(self.inner).ok().map(Mutex::into_inner)
    }
}
