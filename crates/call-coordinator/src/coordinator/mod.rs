//! Session Coordinator
//!
//! State machine tying the event stream, the message log, the ticker and the
//! resource registry together.
//!
//! ```text
//! AwaitingConnection ──Connected──▶ Connected(n) ──tick──▶ Connected(n+1)
//!         │                              │
//!         └──── Failed / Completed / terminate() / drop ────▶ Terminated
//! ```
//!
//! Every transition runs on a single event-loop task, which is what makes the
//! terminal check-and-set atomic when several termination triggers race.

// Module declarations
mod coordinator;
mod event_handler;
pub mod registry;

// Re-exports
pub use coordinator::SessionCoordinator;
pub use registry::{Disposable, ResourceId, ResourceRegistry};
