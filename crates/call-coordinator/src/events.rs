//! Event types flowing into and out of the coordinator
//!
//! Two directions are covered here:
//!
//! - **Session events** - what the call session emits. The stream ends with
//!   either a [`SessionEvent::Failed`] item or by closing (`Completed`).
//! - **Coordinator events** - what the coordinator broadcasts after each
//!   transition, for consumers that prefer a stream over the observer trait.
//!
//! # Producing a session stream
//!
//! ```rust
//! use rvoip_call_coordinator::events::{session_event_channel, SessionEvent};
//! use rvoip_call_coordinator::ChatMessage;
//!
//! let (tx, _stream) = session_event_channel();
//! tx.connected();
//! tx.chat(ChatMessage::from_peer("hi"));
//! tx.complete();
//! ```

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::{BroadcastStream, UnboundedReceiverStream};

use crate::error::ErrorInfo;
use crate::types::{ChatMessage, CoordinatorState, SessionSummary, TerminationCause};

/// Events emitted by the call session
///
/// `Completed` is not a variant: it is signalled by the stream ending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Media and signaling are established
    Connected,
    /// Chat message delivered by the remote party
    ChatReceived {
        /// The received message
        message: ChatMessage,
    },
    /// The session ended abnormally; no further events follow
    Failed {
        /// Failure details
        error: ErrorInfo,
    },
}

/// Ordered stream of session events; `None` means `Completed`
pub type SessionEventStream = BoxStream<'static, SessionEvent>;

/// Create a session event stream fed from an unbounded channel
pub fn session_event_channel() -> (SessionEventSender, SessionEventStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        SessionEventSender { tx },
        UnboundedReceiverStream::new(rx).boxed(),
    )
}

/// Producer half of [`session_event_channel`]
///
/// Sends never block; events sent after the consumer went away are dropped.
#[derive(Debug, Clone)]
pub struct SessionEventSender {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionEventSender {
    /// Emit an arbitrary event; returns false if the consumer is gone
    pub fn send(&self, event: SessionEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn connected(&self) -> bool {
        self.send(SessionEvent::Connected)
    }

    pub fn chat(&self, message: ChatMessage) -> bool {
        self.send(SessionEvent::ChatReceived { message })
    }

    pub fn fail(&self, error: impl Into<ErrorInfo>) -> bool {
        self.send(SessionEvent::Failed {
            error: error.into(),
        })
    }

    /// Close the stream normally
    ///
    /// The stream completes once every clone of the sender is dropped.
    pub fn complete(self) {}

    /// Whether the consuming side has dropped the stream
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Events broadcast by the coordinator after each transition
#[derive(Debug, Clone)]
pub enum CoordinatorEvent {
    /// Coordinator state changed (including every ticker update)
    StateChanged {
        /// New state
        state: CoordinatorState,
    },
    /// A message was appended to the log
    MessageAppended {
        /// The appended message
        message: ChatMessage,
        /// Position in the log
        index: usize,
    },
    /// The session ended; sent exactly once
    Terminated {
        /// Trigger that won the termination race
        cause: TerminationCause,
        /// Final figures of the session
        summary: SessionSummary,
    },
}

/// Stream of coordinator events for one subscriber
pub type CoordinatorEventStream = BroadcastStream<CoordinatorEvent>;

/// Broadcast emitter for coordinator events
#[derive(Debug, Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<CoordinatorEvent>,
}

impl EventEmitter {
    /// Create a new event emitter with the specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Emit an event
    pub fn emit(&self, event: CoordinatorEvent) {
        // No receivers is not an error
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> CoordinatorEventStream {
        BroadcastStream::new(self.sender.subscribe())
    }

    /// Get the number of active receivers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(1000)
    }
}
