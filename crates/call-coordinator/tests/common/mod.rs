//! Shared fixtures for coordinator integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;

use rvoip_call_coordinator::events::{session_event_channel, SessionEventSender};
use rvoip_call_coordinator::{
    CallSession, ChatMessage, CoordinatorEvent, CoordinatorEventStream, CoordinatorObserver,
    CoordinatorState, ErrorInfo, SessionCoordinator, SessionEvent, SessionEventStream,
};

/// Call session that records every command it receives
pub struct RecordingSession {
    stream: Mutex<Option<SessionEventStream>>,
    events_calls: AtomicUsize,
    terminate_calls: AtomicUsize,
    sent: Mutex<Vec<String>>,
}

impl RecordingSession {
    /// Session plus the sender feeding its event stream
    pub fn new() -> (Arc<Self>, SessionEventSender) {
        let (tx, stream) = session_event_channel();
        let session = Arc::new(Self {
            stream: Mutex::new(Some(stream)),
            events_calls: AtomicUsize::new(0),
            terminate_calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        });
        (session, tx)
    }

    pub fn events_calls(&self) -> usize {
        self.events_calls.load(Ordering::SeqCst)
    }

    pub fn terminate_calls(&self) -> usize {
        self.terminate_calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

impl CallSession for RecordingSession {
    fn events(&self) -> SessionEventStream {
        self.events_calls.fetch_add(1, Ordering::SeqCst);
        self.stream
            .lock()
            .take()
            .unwrap_or_else(|| futures::stream::empty::<SessionEvent>().boxed())
    }

    fn terminate(&self) {
        self.terminate_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn send_message(&self, text: &str) {
        self.sent.lock().push(text.to_string());
    }
}

/// One observer callback, in the order it was received
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    State(CoordinatorState),
    Message(ChatMessage, usize),
    Terminated(Option<ErrorInfo>),
}

/// Observer that keeps every notification
#[derive(Default)]
pub struct RecordingObserver {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }

    pub fn states(&self) -> Vec<CoordinatorState> {
        self.notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::State(state) => Some(state),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<(ChatMessage, usize)> {
        self.notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Message(message, index) => Some((message, index)),
                _ => None,
            })
            .collect()
    }

    pub fn terminations(&self) -> Vec<Option<ErrorInfo>> {
        self.notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Terminated(error) => Some(error),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl CoordinatorObserver for RecordingObserver {
    async fn on_state_changed(&self, state: CoordinatorState) {
        self.notifications.lock().push(Notification::State(state));
    }

    async fn on_message_appended(&self, message: ChatMessage, index: usize) {
        self.notifications
            .lock()
            .push(Notification::Message(message, index));
    }

    async fn on_terminated(&self, error: Option<ErrorInfo>) {
        self.notifications.lock().push(Notification::Terminated(error));
    }
}

/// Build and start a coordinator with default configuration
pub fn start_coordinator(
    session: Arc<RecordingSession>,
    observer: Arc<RecordingObserver>,
) -> SessionCoordinator {
    SessionCoordinator::builder()
        .session(session)
        .observer(observer)
        .start()
        .expect("coordinator should start")
}

/// Wait until the coordinator reports `Connected`
pub async fn wait_connected(coordinator: &SessionCoordinator) {
    let mut state = coordinator.state_watch();
    tokio::time::timeout(Duration::from_secs(5), state.wait_for(|s| s.is_connected()))
        .await
        .expect("timed out waiting for Connected")
        .expect("state channel closed");
}

/// Read a subscription until its `Terminated` event, returning everything seen
pub async fn collect_until_terminated(mut stream: CoordinatorEventStream) -> Vec<CoordinatorEvent> {
    let mut seen = Vec::new();
    while let Some(item) = stream.next().await {
        let event = item.expect("subscriber lagged");
        let done = matches!(event, CoordinatorEvent::Terminated { .. });
        seen.push(event);
        if done {
            break;
        }
    }
    seen
}

/// Bodies of a message list, tagged with their sender
pub fn tagged_bodies(messages: &[ChatMessage]) -> Vec<String> {
    messages
        .iter()
        .map(|m| format!("{}:{}", m.sender(), m.body()))
        .collect()
}
