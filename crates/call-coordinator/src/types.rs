//! Value types shared by the coordinator, its observers and the call session
//!
//! # Type Categories
//!
//! - **Chat Types** - [`ChatMessage`] and its [`Sender`] tag
//! - **State Types** - [`CoordinatorState`] as seen by observers
//! - **Termination Types** - why and how a session ended

use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ErrorInfo;
use crate::ticker::format_elapsed;

// ===== IDENTIFIERS =====

/// Unique identifier of one coordinator instance, used in log spans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordinatorId(pub Uuid);

impl CoordinatorId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CoordinatorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CoordinatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ===== CHAT TYPES =====

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sender {
    /// The local user
    #[serde(rename = "me")]
    Local,
    /// The remote party
    #[serde(rename = "opp")]
    Peer,
    /// Notices generated by the coordinator itself
    #[serde(rename = "system")]
    System,
}

impl Sender {
    /// Short tag shown next to the message
    pub fn as_tag(&self) -> &'static str {
        match self {
            Sender::Local => "me",
            Sender::Peer => "opp",
            Sender::System => "system",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// A single entry of the chat log
///
/// Messages are immutable once built; fields are reachable through accessors only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    timestamp: DateTime<Utc>,
    sender: Sender,
    body: String,
}

impl ChatMessage {
    /// Build a message with an explicit timestamp
    pub fn new(timestamp: DateTime<Utc>, sender: Sender, body: impl Into<String>) -> Self {
        Self {
            timestamp,
            sender,
            body: body.into(),
        }
    }

    /// Message from the remote party, stamped now
    pub fn from_peer(body: impl Into<String>) -> Self {
        Self::new(Utc::now(), Sender::Peer, body)
    }

    /// Message typed by the local user, stamped now
    pub fn local(body: impl Into<String>) -> Self {
        Self::new(Utc::now(), Sender::Local, body)
    }

    /// Coordinator notice, stamped now
    pub fn system(body: impl Into<String>) -> Self {
        Self::new(Utc::now(), Sender::System, body)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn is_from_peer(&self) -> bool {
        self.sender == Sender::Peer
    }

    pub fn is_system(&self) -> bool {
        self.sender == Sender::System
    }

    /// Local wall-clock time of the message as `HH:MM`
    pub fn time_of_day(&self) -> String {
        self.timestamp.with_timezone(&Local).format("%H:%M").to_string()
    }
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.sender, self.body)
    }
}

// ===== STATE TYPES =====

/// Coordinator state as published to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinatorState {
    /// Observing the session, no `Connected` event seen yet
    AwaitingConnection,
    /// Call is up; `elapsed_secs` is the nominal ticker count
    Connected { elapsed_secs: u64 },
    /// Absorbing end state
    Terminated,
}

impl CoordinatorState {
    pub fn is_terminated(&self) -> bool {
        matches!(self, CoordinatorState::Terminated)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, CoordinatorState::Connected { .. })
    }

    /// Elapsed call time, only while connected
    pub fn elapsed_secs(&self) -> Option<u64> {
        match self {
            CoordinatorState::Connected { elapsed_secs } => Some(*elapsed_secs),
            _ => None,
        }
    }

    /// Call timer as `mm:ss`, only while connected
    pub fn display_timer(&self) -> Option<String> {
        self.elapsed_secs().map(format_elapsed)
    }
}

impl Default for CoordinatorState {
    fn default() -> Self {
        CoordinatorState::AwaitingConnection
    }
}

// ===== TERMINATION TYPES =====

/// Which trigger ended the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationCause {
    /// The session stream reported a failure
    TransportFailure(ErrorInfo),
    /// The session stream closed normally
    StreamCompleted,
    /// `terminate()` or `stop()` was called
    LocalTermination,
    /// The coordinator was dropped while still live
    OwnerTeardown,
}

impl TerminationCause {
    /// Error to hand to `on_terminated`, present only for transport failures
    pub fn error(&self) -> Option<ErrorInfo> {
        match self {
            TerminationCause::TransportFailure(error) => Some(error.clone()),
            _ => None,
        }
    }

    /// Whether the termination was requested on this side
    ///
    /// Local terminations must forward a terminate command to the session.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            TerminationCause::LocalTermination | TerminationCause::OwnerTeardown
        )
    }
}

impl fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationCause::TransportFailure(error) => write!(f, "transport failure: {}", error),
            TerminationCause::StreamCompleted => f.write_str("session completed"),
            TerminationCause::LocalTermination => f.write_str("terminated locally"),
            TerminationCause::OwnerTeardown => f.write_str("owner teardown"),
        }
    }
}

/// Figures captured at the moment a session terminates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSummary {
    /// Last published elapsed time, zero if the call never connected
    pub elapsed_secs: u64,
    /// Number of log entries including the termination notice
    pub message_count: usize,
}
