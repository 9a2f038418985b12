//! Core SessionCoordinator structure and lifecycle

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use super::registry::ResourceRegistry;
use crate::builder::SessionCoordinatorBuilder;
use crate::config::CoordinatorConfig;
use crate::error::{CoordinatorError, CoordinatorResult};
use crate::events::{CoordinatorEventStream, EventEmitter};
use crate::message_log::MessageLog;
use crate::observer::CoordinatorObserver;
use crate::session::CallSession;
use crate::ticker::ElapsedTicker;
use crate::types::{ChatMessage, CoordinatorId, CoordinatorState, TerminationCause};

/// Requests delivered to the event loop from outside
#[derive(Debug)]
pub(super) enum Command {
    Terminate(TerminationCause),
    SendMessage(String),
}

/// State owned by the event loop
///
/// Only the event-loop task mutates this. The handle reads through the
/// shared `log`, `registry` and the `state` watch channel.
pub(super) struct CoordinatorCore {
    pub(super) id: CoordinatorId,
    pub(super) session: Arc<dyn CallSession>,
    pub(super) observer: Arc<dyn CoordinatorObserver>,
    pub(super) config: CoordinatorConfig,
    pub(super) state: CoordinatorState,
    pub(super) state_tx: watch::Sender<CoordinatorState>,
    pub(super) log: Arc<RwLock<MessageLog>>,
    pub(super) registry: Arc<ResourceRegistry>,
    pub(super) emitter: EventEmitter,
    pub(super) ticker: ElapsedTicker,
    pub(super) tick_tx: mpsc::UnboundedSender<u64>,
    pub(super) finished: FinishSignal,
}

/// Flips the coordinator's `finished` flag when the core is dropped
///
/// The core is dropped only after its terminal notifications ran, or when
/// the loop task unwinds, so every `stop()` can wait on the flag.
pub(super) struct FinishSignal(watch::Sender<bool>);

impl Drop for FinishSignal {
    fn drop(&mut self) {
        self.0.send_replace(true);
    }
}

impl CoordinatorCore {
    /// Terminal transition for a core whose event loop never ran
    ///
    /// State, log and registry change before this returns. Observer callbacks
    /// run on the current runtime, or inline when there is none.
    fn finish_idle(mut self, cause: TerminationCause) {
        let Some(record) = self.begin_termination(cause) else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    self.announce_termination(record).await;
                });
            }
            Err(_) => {
                debug!("No Tokio runtime, notifying observer inline");
                futures::executor::block_on(self.announce_termination(record));
            }
        }
    }
}

enum Lifecycle {
    /// Built but not observing the session yet
    Idle {
        core: CoordinatorCore,
        commands: mpsc::UnboundedReceiver<Command>,
        ticks: mpsc::UnboundedReceiver<u64>,
    },
    /// Event loop task is live
    Running(JoinHandle<()>),
    /// `stop()` ran or the coordinator is being dropped
    Stopped,
}

/// Coordinates one live call session
///
/// Create it with [`SessionCoordinator::new`] or the
/// [builder](SessionCoordinator::builder), call [`start`](Self::start) to begin
/// observing the session and [`stop`](Self::stop) (or just drop it) to tear it
/// down. Termination is idempotent across every trigger: the observer's
/// `on_terminated` runs exactly once and every tracked resource is disposed
/// exactly once.
pub struct SessionCoordinator {
    id: CoordinatorId,
    commands: mpsc::UnboundedSender<Command>,
    lifecycle: Mutex<Lifecycle>,
    state_rx: watch::Receiver<CoordinatorState>,
    finished_rx: watch::Receiver<bool>,
    log: Arc<RwLock<MessageLog>>,
    registry: Arc<ResourceRegistry>,
    emitter: EventEmitter,
}

impl SessionCoordinator {
    /// Create a coordinator for `session`, reporting to `observer`
    pub fn new(
        session: Arc<dyn CallSession>,
        observer: Arc<dyn CoordinatorObserver>,
        config: CoordinatorConfig,
    ) -> CoordinatorResult<Self> {
        config.validate()?;

        let id = CoordinatorId::new();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(CoordinatorState::AwaitingConnection);
        let (finished_tx, finished_rx) = watch::channel(false);
        let log = Arc::new(RwLock::new(MessageLog::new()));
        let registry = Arc::new(ResourceRegistry::new());
        let emitter = EventEmitter::new(config.event_capacity);

        let core = CoordinatorCore {
            id,
            session,
            observer,
            ticker: ElapsedTicker::new(config.tick_interval()),
            config,
            state: CoordinatorState::AwaitingConnection,
            state_tx,
            log: log.clone(),
            registry: registry.clone(),
            emitter: emitter.clone(),
            tick_tx,
            finished: FinishSignal(finished_tx),
        };

        debug!("Created session coordinator {}", id);
        Ok(Self {
            id,
            commands: commands_tx,
            lifecycle: Mutex::new(Lifecycle::Idle {
                core,
                commands: commands_rx,
                ticks: tick_rx,
            }),
            state_rx,
            finished_rx,
            log,
            registry,
            emitter,
        })
    }

    /// Start building a coordinator
    pub fn builder() -> SessionCoordinatorBuilder {
        SessionCoordinatorBuilder::new()
    }

    /// Subscribe to the session and spawn the event loop
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> CoordinatorResult<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| CoordinatorError::internal("start() must be called within a Tokio runtime"))?;

        let mut lifecycle = self.lifecycle.lock();
        let (core, commands, ticks) = match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Idle { core, commands, ticks } => (core, commands, ticks),
            running @ Lifecycle::Running(_) => {
                *lifecycle = running;
                return Err(CoordinatorError::AlreadyStarted);
            }
            Lifecycle::Stopped => return Err(CoordinatorError::AlreadyStopped),
        };

        let events = core.session.events();
        let subscription = CancellationToken::new();
        self.registry.register(subscription.clone());

        let span = info_span!("session_coordinator", id = %self.id);
        let handle = runtime.spawn(core.run(events, commands, ticks, subscription).instrument(span));
        *lifecycle = Lifecycle::Running(handle);

        info!("Session coordinator {} started", self.id);
        Ok(())
    }

    /// Request termination (user or owner initiated)
    ///
    /// Never waits on the event loop. The first termination trigger to reach
    /// it wins; later ones are ignored. On a coordinator that was never
    /// started the terminal transition runs right away and a later
    /// [`start`](Self::start) fails with `AlreadyStopped`.
    pub fn terminate(&self) {
        if let Some(core) = self.take_idle_core() {
            info!("Terminating coordinator {} before it started", self.id);
            core.finish_idle(TerminationCause::LocalTermination);
            return;
        }
        if self
            .commands
            .send(Command::Terminate(TerminationCause::LocalTermination))
            .is_err()
        {
            debug!("Coordinator {} already finished, terminate ignored", self.id);
        }
    }

    /// Send a chat message to the remote party
    ///
    /// Blank text is ignored, as is any message sent after termination. The
    /// local copy is appended to the log without waiting for delivery.
    pub fn send_message(&self, text: impl Into<String>) {
        let text = text.into();
        if text.trim().is_empty() {
            debug!("Ignoring blank chat message");
            return;
        }
        if self.commands.send(Command::SendMessage(text)).is_err() {
            debug!("Coordinator {} already finished, message dropped", self.id);
        }
    }

    /// Terminate and wait until the observer has been told
    ///
    /// Idempotent; equivalent to [`terminate`](Self::terminate) followed by
    /// joining the loop. Every call, concurrent ones included, returns only
    /// after `on_terminated` has run.
    pub async fn stop(&self) -> CoordinatorResult<()> {
        let lifecycle = std::mem::replace(&mut *self.lifecycle.lock(), Lifecycle::Stopped);
        match lifecycle {
            Lifecycle::Idle { mut core, .. } => {
                info!("Stopping coordinator {} before it started", self.id);
                core.terminate(TerminationCause::LocalTermination).await;
            }
            Lifecycle::Running(handle) => {
                self.terminate();
                handle.await.map_err(|e| {
                    CoordinatorError::internal(format!("coordinator event loop failed: {}", e))
                })?;
                info!("Session coordinator {} stopped", self.id);
            }
            Lifecycle::Stopped => {}
        }
        self.wait_finished().await
    }

    /// Wait until the coordinator reaches `Terminated`
    ///
    /// Observer callbacks for the terminal transition may still be running
    /// when this returns; use [`stop`](Self::stop) to wait for them too.
    /// Fails if the event loop went away without terminating.
    pub async fn wait_for_termination(&self) -> CoordinatorResult<()> {
        let mut state_rx = self.state_rx.clone();
        match state_rx.wait_for(|state| state.is_terminated()).await {
            Ok(_) => Ok(()),
            Err(_) => {
                warn!("Coordinator {} event loop ended before Terminated", self.id);
                Err(CoordinatorError::internal(
                    "event loop ended before the session terminated",
                ))
            }
        }
    }

    async fn wait_finished(&self) -> CoordinatorResult<()> {
        let mut finished_rx = self.finished_rx.clone();
        match finished_rx.wait_for(|done| *done).await {
            Ok(_) => Ok(()),
            Err(_) => Err(CoordinatorError::internal(
                "coordinator core dropped without signalling completion",
            )),
        }
    }

    /// Move an unstarted core out, leaving the lifecycle `Stopped`
    fn take_idle_core(&self) -> Option<CoordinatorCore> {
        let mut lifecycle = self.lifecycle.lock();
        if !matches!(*lifecycle, Lifecycle::Idle { .. }) {
            return None;
        }
        match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Idle { core, .. } => Some(core),
            _ => None,
        }
    }

    pub fn id(&self) -> CoordinatorId {
        self.id
    }

    /// Current state snapshot
    pub fn state(&self) -> CoordinatorState {
        *self.state_rx.borrow()
    }

    /// Watch channel following every state change
    pub fn state_watch(&self) -> watch::Receiver<CoordinatorState> {
        self.state_rx.clone()
    }

    pub fn is_terminated(&self) -> bool {
        self.state().is_terminated()
    }

    /// Copy of the message log in display order
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.log.read().snapshot()
    }

    pub fn message_count(&self) -> usize {
        self.log.read().len()
    }

    /// Messages received from the remote party so far
    pub fn peer_message_count(&self) -> usize {
        self.log.read().peer_message_count()
    }

    /// Number of resources currently tracked
    pub fn live_resources(&self) -> usize {
        self.registry.len()
    }

    /// Stream of coordinator events for an additional consumer
    pub fn subscribe(&self) -> CoordinatorEventStream {
        self.emitter.subscribe()
    }
}

impl Drop for SessionCoordinator {
    fn drop(&mut self) {
        match std::mem::replace(self.lifecycle.get_mut(), Lifecycle::Stopped) {
            Lifecycle::Running(_) => {
                // The loop keeps running detached until it has torn down.
                let _ = self
                    .commands
                    .send(Command::Terminate(TerminationCause::OwnerTeardown));
            }
            Lifecycle::Idle { core, .. } => {
                core.finish_idle(TerminationCause::OwnerTeardown);
            }
            Lifecycle::Stopped => {}
        }
    }
}

impl fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("messages", &self.message_count())
            .finish()
    }
}
