//! Loopback Call Example
//!
//! Drives a coordinator with an in-process session that echoes every chat
//! message back as if the remote party had typed it. The call screen is a
//! console observer printing the timer and the chat log.
//!
//! Run with: cargo run --example loopback_call

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use tracing::Level;

use rvoip_call_coordinator::events::{session_event_channel, SessionEventSender};
use rvoip_call_coordinator::logging::{setup_logging, LoggingConfig};
use rvoip_call_coordinator::{
    CallSession, ChatMessage, CoordinatorConfig, CoordinatorObserver, CoordinatorState, ErrorInfo,
    SessionCoordinator, SessionEvent, SessionEventStream,
};

/// Session whose remote party repeats whatever it is sent
struct LoopbackSession {
    stream: Mutex<Option<SessionEventStream>>,
    remote: SessionEventSender,
}

impl LoopbackSession {
    fn new() -> (Self, SessionEventSender) {
        let (remote, stream) = session_event_channel();
        let session = Self {
            stream: Mutex::new(Some(stream)),
            remote: remote.clone(),
        };
        (session, remote)
    }
}

impl CallSession for LoopbackSession {
    fn events(&self) -> SessionEventStream {
        self.stream
            .lock()
            .take()
            .unwrap_or_else(|| futures::stream::empty::<SessionEvent>().boxed())
    }

    fn terminate(&self) {
        println!("📴 Hang-up sent to remote party");
    }

    fn send_message(&self, text: &str) {
        self.remote.chat(ChatMessage::from_peer(format!("echo: {}", text)));
    }
}

/// Prints what a call screen would render
struct ConsoleScreen;

#[async_trait]
impl CoordinatorObserver for ConsoleScreen {
    async fn on_state_changed(&self, state: CoordinatorState) {
        match state.display_timer() {
            Some(timer) => println!("⏱️  {}", timer),
            None => println!("📞 {:?}", state),
        }
    }

    async fn on_message_appended(&self, message: ChatMessage, index: usize) {
        println!("💬 #{} [{}] {}", index, message.time_of_day(), message);
    }

    async fn on_terminated(&self, error: Option<ErrorInfo>) {
        match error {
            Some(error) => println!("❌ Call failed: {}", error),
            None => println!("✅ Call ended"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging(LoggingConfig::new(Level::INFO, "loopback-call"))?;

    let config = CoordinatorConfig::from_toml_str(
        r#"
        tick_interval_ms = 500
        start_notice = "Call started"
        terminated_notice = "Call ended"
        "#,
    )
    .context("example configuration is invalid")?;

    let (session, remote) = LoopbackSession::new();
    let coordinator = SessionCoordinator::builder()
        .session(session)
        .observer(Arc::new(ConsoleScreen))
        .config(config)
        .start()?;

    remote.connected();
    tokio::time::sleep(Duration::from_millis(200)).await;

    coordinator.send_message("hello");
    coordinator.send_message("   ");
    coordinator.send_message("can you hear me?");
    tokio::time::sleep(Duration::from_secs(2)).await;

    coordinator.stop().await?;

    println!(
        "\n📊 {} messages, {} from the remote party",
        coordinator.message_count(),
        coordinator.peer_message_count()
    );
    Ok(())
}
