//! Builder pattern for creating session coordinators

use std::sync::Arc;
use std::time::Duration;

use crate::config::CoordinatorConfig;
use crate::coordinator::SessionCoordinator;
use crate::error::{CoordinatorError, CoordinatorResult};
use crate::observer::{CoordinatorObserver, NoopObserver};
use crate::session::CallSession;

/// Builder for a [`SessionCoordinator`]
///
/// ```rust,no_run
/// # use rvoip_call_coordinator::{SessionCoordinator, CallSession};
/// # use std::sync::Arc;
/// # async fn example(session: Arc<dyn CallSession>) -> Result<(), Box<dyn std::error::Error>> {
/// let coordinator = SessionCoordinator::builder()
///     .session_arc(session)
///     .terminated_notice("Call ended")
///     .start()?;
///
/// coordinator.send_message("hello");
/// coordinator.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionCoordinatorBuilder {
    session: Option<Arc<dyn CallSession>>,
    observer: Option<Arc<dyn CoordinatorObserver>>,
    config: CoordinatorConfig,
}

impl SessionCoordinatorBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            session: None,
            observer: None,
            config: CoordinatorConfig::default(),
        }
    }

    /// Set the call session to observe (required)
    pub fn session<S>(mut self, session: S) -> Self
    where
        S: CallSession + 'static,
    {
        self.session = Some(Arc::new(session) as Arc<dyn CallSession>);
        self
    }

    /// Set an already shared call session (required)
    pub fn session_arc(mut self, session: Arc<dyn CallSession>) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the presentation-layer observer
    ///
    /// Without one, notifications are only available through `subscribe()`.
    pub fn observer<O>(mut self, observer: Arc<O>) -> Self
    where
        O: CoordinatorObserver + 'static,
    {
        self.observer = Some(observer as Arc<dyn CoordinatorObserver>);
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the elapsed-time period
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.config = self.config.with_tick_interval(interval);
        self
    }

    /// Set the broadcast capacity for `subscribe()`
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config = self.config.with_event_capacity(capacity);
        self
    }

    /// Set the notice appended when the call connects
    pub fn start_notice(mut self, notice: impl Into<String>) -> Self {
        self.config = self.config.with_start_notice(notice);
        self
    }

    /// Set the notice appended when the call ends
    pub fn terminated_notice(mut self, notice: impl Into<String>) -> Self {
        self.config = self.config.with_terminated_notice(notice);
        self
    }

    /// Build the coordinator without starting it
    pub fn build(self) -> CoordinatorResult<SessionCoordinator> {
        let session = self
            .session
            .ok_or_else(|| CoordinatorError::config("a call session is required"))?;
        let observer = self
            .observer
            .unwrap_or_else(|| Arc::new(NoopObserver) as Arc<dyn CoordinatorObserver>);
        SessionCoordinator::new(session, observer, self.config)
    }

    /// Build the coordinator and start observing the session
    pub fn start(self) -> CoordinatorResult<SessionCoordinator> {
        let coordinator = self.build()?;
        coordinator.start()?;
        Ok(coordinator)
    }
}

impl Default for SessionCoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
