//! # Call Coordinator - Live Call Session Coordination
//!
//! This crate drives the state behind a live-call screen. It observes the
//! event stream of an external call session and maintains:
//!
//! - **Call state**: awaiting connection, connected with an elapsed-time
//!   timer, or terminated
//! - **Chat log**: append-only record of local, remote and system messages
//! - **Teardown**: every subscription and timer released exactly once,
//!   whichever termination trigger fires first
//!
//! Transport, signaling and media are out of scope: the session is reached
//! only through the [`CallSession`] trait.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rvoip_call_coordinator::{
//!     events::session_event_channel, CallSession, SessionCoordinator, SessionEventStream,
//! };
//! use parking_lot::Mutex;
//!
//! struct LoopbackSession {
//!     stream: Mutex<Option<SessionEventStream>>,
//! }
//!
//! impl CallSession for LoopbackSession {
//!     fn events(&self) -> SessionEventStream {
//!         self.stream.lock().take().expect("events() is called once")
//!     }
//!     fn terminate(&self) {}
//!     fn send_message(&self, _text: &str) {}
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (events, stream) = session_event_channel();
//!     let coordinator = SessionCoordinator::builder()
//!         .session(LoopbackSession { stream: Mutex::new(Some(stream)) })
//!         .start()?;
//!
//!     events.connected();
//!     coordinator.send_message("hello");
//!     coordinator.stop().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!   CallSession ──events()──▶ ┌──────────────────────────┐ ──▶ CoordinatorObserver
//!        ▲                    │  SessionCoordinator loop │ ──▶ subscribe() stream
//!        └─terminate/send──── │  MessageLog · Ticker     │
//!                             │  ResourceRegistry        │
//!                             └──────────────────────────┘
//! ```

pub mod builder;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod logging;
pub mod message_log;
pub mod observer;
pub mod session;
pub mod ticker;
pub mod types;

// Re-export main types
pub use builder::SessionCoordinatorBuilder;
pub use config::CoordinatorConfig;
pub use coordinator::{Disposable, ResourceId, ResourceRegistry, SessionCoordinator};
pub use error::{CoordinatorError, CoordinatorResult, ErrorInfo};
pub use events::{CoordinatorEvent, CoordinatorEventStream, SessionEvent, SessionEventStream};
pub use message_log::MessageLog;
pub use observer::{CoordinatorObserver, NoopObserver};
pub use session::CallSession;
pub use ticker::{format_elapsed, ElapsedTicker};
pub use types::{
    ChatMessage, CoordinatorId, CoordinatorState, Sender, SessionSummary, TerminationCause,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
