// Who is logged in, as seen by the screens
//
// A subscription to the backend's auth-change channel. Nothing is cached
// here: current() always reads the latest value the backend published, so
// it is up to date as soon as sign_in/sign_out return.

use tokio::sync::watch;

use crate::backend::{Backend, Session};
use crate::error::{BackendError, BackendResult};

#[derive(Clone)]
pub struct SessionState {
    changes: watch::Receiver<Option<Session>>,
}

impl SessionState {
    pub fn new(backend: &dyn Backend) -> Self {
        SessionState {
            changes: backend.auth_changes(),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.changes.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.changes.borrow().is_some()
    }

    // For actions that only make sense with an account
    pub fn require(&self) -> BackendResult<Session> {
        self.current().ok_or(BackendError::NotSignedIn)
    }

    // Waits for the next login/logout. Returns None once the backend is gone.
    pub async fn changed(&mut self) -> Option<Option<Session>> {
        self.changes.changed().await.ok()?;
        Some(self.changes.borrow_and_update().clone())
    }
}
