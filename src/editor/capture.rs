//! Scoped pointer capture for edit mode.

use crate::session::SessionId;

/// Held while a session is live; pointer events are only routed while it
/// exists. Dropping it releases the capture.
#[derive(Debug)]
pub struct InputCapture {
    session: SessionId,
}

impl InputCapture {
    pub(crate) fn acquire(session: SessionId) -> Self {
        log::debug!("Input capture acquired for session {}", session);
        Self { session }
    }

    pub fn session_id(&self) -> SessionId {
        self.session
    }
}

impl Drop for InputCapture {
    fn drop(&mut self) {
        log::debug!("Input capture released for session {}", self.session);
    }
}
