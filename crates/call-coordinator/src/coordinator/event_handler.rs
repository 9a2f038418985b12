//! Event loop and transition handling for SessionCoordinator

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::coordinator::{Command, CoordinatorCore};
use super::registry::ResourceRegistry;
use crate::events::{CoordinatorEvent, SessionEvent, SessionEventStream};
use crate::types::{ChatMessage, CoordinatorState, SessionSummary, TerminationCause};

/// What the terminal transition recorded, pending notification
pub(super) struct TerminalRecord {
    cause: TerminationCause,
    notice: ChatMessage,
    index: usize,
    elapsed_secs: u64,
}

/// Disposes the registry when the loop exits, including by panic
struct DisposeOnExit(Arc<ResourceRegistry>);

impl Drop for DisposeOnExit {
    fn drop(&mut self) {
        self.0.dispose_all();
    }
}

impl CoordinatorCore {
    /// Main event loop
    ///
    /// Commands are polled before session events so that a terminate request
    /// queued alongside a terminal event is decided in arrival order on this
    /// task alone. The loop ends right after the terminal transition.
    pub(super) async fn run(
        mut self,
        mut events: SessionEventStream,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut ticks: mpsc::UnboundedReceiver<u64>,
        subscription: CancellationToken,
    ) {
        let _guard = DisposeOnExit(self.registry.clone());
        info!("Starting coordinator event loop");

        while !self.state.is_terminated() {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    // Every handle is gone without a terminate; treat as teardown.
                    None => self.terminate(TerminationCause::OwnerTeardown).await,
                },

                Some(elapsed) = ticks.recv() => self.handle_tick(elapsed).await,

                event = events.next(), if !subscription.is_cancelled() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => self.terminate(TerminationCause::StreamCompleted).await,
                },

                _ = subscription.cancelled() => {
                    warn!("Session subscription cancelled outside termination");
                    self.terminate(TerminationCause::LocalTermination).await;
                }
            }
        }

        drop(events);
        info!("Coordinator event loop ended");
    }

    /// Handle a session event
    async fn handle_event(&mut self, event: SessionEvent) {
        trace!("Handling session event: {:?}", event);

        if self.state.is_terminated() {
            debug!("Ignoring session event after termination: {:?}", event);
            return;
        }

        match event {
            SessionEvent::Connected => self.handle_connected().await,

            SessionEvent::ChatReceived { message } => {
                if !self.state.is_connected() {
                    debug!("Chat message received before Connected, appending anyway");
                }
                self.append_message(message).await;
            }

            SessionEvent::Failed { error } => {
                warn!("Session failed: {}", error);
                self.terminate(TerminationCause::TransportFailure(error)).await;
            }
        }
    }

    async fn handle_connected(&mut self) {
        if self.state.is_connected() {
            warn!("Duplicate Connected event ignored");
            return;
        }

        info!("Session connected");
        self.set_state(CoordinatorState::Connected { elapsed_secs: 0 }).await;

        let tick_tx = self.tick_tx.clone();
        let ticker = self.ticker.spawn(move |elapsed| tick_tx.send(elapsed).is_ok());
        self.registry.register(ticker);

        let notice = ChatMessage::system(self.config.start_notice.clone());
        self.append_message(notice).await;
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Terminate(cause) => self.terminate(cause).await,
            Command::SendMessage(text) => self.handle_send_message(text).await,
        }
    }

    async fn handle_send_message(&mut self, text: String) {
        if self.state.is_terminated() {
            debug!("Ignoring chat message after termination");
            return;
        }

        self.session.send_message(&text);
        self.append_message(ChatMessage::local(text)).await;
    }

    async fn handle_tick(&mut self, elapsed_secs: u64) {
        // Ticks already queued when the ticker was disposed land here too.
        if !self.state.is_connected() {
            trace!("Dropping tick {} outside Connected", elapsed_secs);
            return;
        }
        self.set_state(CoordinatorState::Connected { elapsed_secs }).await;
    }

    /// Run the terminal transition once
    pub(super) async fn terminate(&mut self, cause: TerminationCause) {
        if let Some(record) = self.begin_termination(cause) {
            self.announce_termination(record).await;
        }
    }

    /// Synchronous half of the terminal transition
    ///
    /// Order: forward the terminate command for local triggers, dispose every
    /// resource, append the termination notice, then publish `Terminated`.
    /// Returns `None` when the core had already terminated.
    pub(super) fn begin_termination(&mut self, cause: TerminationCause) -> Option<TerminalRecord> {
        if self.state.is_terminated() {
            debug!("Already terminated, ignoring {}", cause);
            return None;
        }

        info!("Terminating session: {}", cause);

        if cause.is_local() {
            self.session.terminate();
        }
        let disposed = self.registry.dispose_all();
        debug!("Released {} resources", disposed);

        let elapsed_secs = self.state.elapsed_secs().unwrap_or(0);

        let notice = ChatMessage::system(self.config.terminated_notice.clone());
        let index = self.log.write().append(notice.clone());

        // Mark terminated before any await so re-entrant triggers see it.
        self.state = CoordinatorState::Terminated;
        self.state_tx.send_replace(CoordinatorState::Terminated);

        Some(TerminalRecord {
            cause,
            notice,
            index,
            elapsed_secs,
        })
    }

    /// Notify the observer and subscribers, ending with `on_terminated`
    pub(super) async fn announce_termination(&self, record: TerminalRecord) {
        let TerminalRecord {
            cause,
            notice,
            index,
            elapsed_secs,
        } = record;

        self.observer.on_state_changed(CoordinatorState::Terminated).await;
        self.emitter.emit(CoordinatorEvent::StateChanged {
            state: CoordinatorState::Terminated,
        });

        self.observer.on_message_appended(notice.clone(), index).await;
        self.emitter.emit(CoordinatorEvent::MessageAppended {
            message: notice,
            index,
        });

        self.observer.on_terminated(cause.error()).await;
        debug!(
            "Announcing termination to {} subscribers",
            self.emitter.receiver_count()
        );
        self.emitter.emit(CoordinatorEvent::Terminated {
            summary: SessionSummary {
                elapsed_secs,
                message_count: index + 1,
            },
            cause,
        });
    }

    async fn set_state(&mut self, state: CoordinatorState) {
        self.state = state;
        self.state_tx.send_replace(state);
        self.observer.on_state_changed(state).await;
        self.emitter.emit(CoordinatorEvent::StateChanged { state });
    }

    async fn append_message(&mut self, message: ChatMessage) {
        let index = self.log.write().append(message.clone());
        trace!("Appended message #{} from {}", index, message.sender());
        self.observer.on_message_appended(message.clone(), index).await;
        self.emitter.emit(CoordinatorEvent::MessageAppended { message, index });
    }
}
