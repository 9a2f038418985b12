//! Presentation-layer callbacks
//!
//! # Usage Example
//!
//! ```rust
//! use rvoip_call_coordinator::{ChatMessage, CoordinatorObserver, CoordinatorState, ErrorInfo};
//! use async_trait::async_trait;
//!
//! struct CallScreen;
//!
//! #[async_trait]
//! impl CoordinatorObserver for CallScreen {
//!     async fn on_state_changed(&self, state: CoordinatorState) {
//!         if let Some(timer) = state.display_timer() {
//!             println!("{}", timer);
//!         }
//!     }
//!
//!     async fn on_message_appended(&self, message: ChatMessage, index: usize) {
//!         println!("#{} {}", index, message);
//!     }
//!
//!     async fn on_terminated(&self, error: Option<ErrorInfo>) {
//!         println!("call ended: {:?}", error);
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::ErrorInfo;
use crate::types::{ChatMessage, CoordinatorState};

/// Receives coordinator notifications
///
/// All callbacks run on the coordinator's event loop task, one at a time and
/// in transition order. Hand work off to the UI context instead of blocking
/// here; a slow observer delays every later transition.
#[async_trait]
pub trait CoordinatorObserver: Send + Sync {
    /// State changed, including every timer tick while connected
    async fn on_state_changed(&self, state: CoordinatorState);

    /// A message was appended at `index`
    async fn on_message_appended(&self, message: ChatMessage, index: usize);

    /// The session ended. Called exactly once per coordinator.
    async fn on_terminated(&self, error: Option<ErrorInfo>);
}

/// Observer that ignores every notification
///
/// Useful when the owner only consumes [`subscribe`](crate::SessionCoordinator::subscribe).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

#[async_trait]
impl CoordinatorObserver for NoopObserver {
    async fn on_state_changed(&self, _state: CoordinatorState) {}
    async fn on_message_appended(&self, _message: ChatMessage, _index: usize) {}
    async fn on_terminated(&self, _error: Option<ErrorInfo>) {}
}
