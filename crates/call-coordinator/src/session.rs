//! The call session collaborator
//!
//! The coordinator never touches transport, signaling or media. It sees the
//! live call only through this trait: one event stream and two
//! fire-and-forget commands.

use std::sync::Arc;

use crate::events::SessionEventStream;

/// External call session observed by the coordinator
///
/// Implementations must not block in any of these methods; the coordinator
/// calls them from its event loop and never waits for acknowledgements.
#[cfg_attr(test, mockall::automock)]
pub trait CallSession: Send + Sync {
    /// Start delivering session events
    ///
    /// Called once, when the coordinator starts observing. Dropping the
    /// returned stream unsubscribes.
    fn events(&self) -> SessionEventStream;

    /// Ask the session to hang up (best effort)
    fn terminate(&self);

    /// Transmit a chat message to the remote party (best effort)
    fn send_message(&self, text: &str);
}

impl<T: CallSession + ?Sized> CallSession for Arc<T> {
    fn events(&self) -> SessionEventStream {
        (**self).events()
    }

    fn terminate(&self) {
        (**self).terminate()
    }

    fn send_message(&self, text: &str) {
        (**self).send_message(text)
    }
}
