//! Resource Registry
//!
//! Tracks every live resource a coordinator owns (the stream subscription and
//! the elapsed-time ticker) so that all of them can be released together at
//! the first termination trigger.
//!
//! Guarantees:
//! - every registered handle is disposed exactly once, either through
//!   [`ResourceRegistry::release`] or [`ResourceRegistry::dispose_all`];
//! - `dispose_all` is idempotent and safe to call from several threads;
//! - a handle registered after `dispose_all` is disposed immediately.

use std::fmt;

use parking_lot::Mutex;
use tokio::task::{AbortHandle, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// A resource that can be cancelled
pub trait Disposable: Send {
    /// Cancel the resource. Called at most once by the registry.
    fn dispose(&mut self);

    /// Short label for logs
    fn label(&self) -> &'static str {
        "resource"
    }
}

impl<T: Send + 'static> Disposable for JoinHandle<T> {
    fn dispose(&mut self) {
        self.abort();
    }

    fn label(&self) -> &'static str {
        "task"
    }
}

impl Disposable for AbortHandle {
    fn dispose(&mut self) {
        self.abort();
    }

    fn label(&self) -> &'static str {
        "task"
    }
}

impl Disposable for CancellationToken {
    fn dispose(&mut self) {
        self.cancel();
    }

    fn label(&self) -> &'static str {
        "subscription"
    }
}

/// Identifier returned by [`ResourceRegistry::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource-{}", self.0)
    }
}

struct RegistryInner {
    next_id: u64,
    disposed: bool,
    handles: Vec<(ResourceId, Box<dyn Disposable>)>,
}

/// Set of cancelable handles released together
pub struct ResourceRegistry {
    inner: Mutex<RegistryInner>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                next_id: 0,
                disposed: false,
                handles: Vec::new(),
            }),
        }
    }

    /// Track a handle
    ///
    /// Returns `None` when the registry was already disposed; the handle is
    /// then disposed on the spot instead of being kept alive.
    pub fn register<D>(&self, handle: D) -> Option<ResourceId>
    where
        D: Disposable + 'static,
    {
        let mut handle: Box<dyn Disposable> = Box::new(handle);
        {
            let mut inner = self.inner.lock();
            if !inner.disposed {
                let id = ResourceId(inner.next_id);
                inner.next_id += 1;
                trace!("Registered {} {}", handle.label(), id);
                inner.handles.push((id, handle));
                return Some(id);
            }
        }
        debug!("Registry already disposed, cancelling late {}", handle.label());
        handle.dispose();
        None
    }

    /// Remove and dispose a single handle
    ///
    /// Returns false if the handle is unknown or was already disposed.
    pub fn release(&self, id: ResourceId) -> bool {
        let removed = {
            let mut inner = self.inner.lock();
            inner
                .handles
                .iter()
                .position(|(candidate, _)| *candidate == id)
                .map(|pos| inner.handles.remove(pos))
        };
        match removed {
            Some((_, mut handle)) => {
                trace!("Released {} {}", handle.label(), id);
                handle.dispose();
                true
            }
            None => false,
        }
    }

    /// Dispose every handle and refuse new ones
    ///
    /// Returns how many handles this call disposed; later calls return 0.
    pub fn dispose_all(&self) -> usize {
        let handles = {
            let mut inner = self.inner.lock();
            inner.disposed = true;
            std::mem::take(&mut inner.handles)
        };
        let count = handles.len();
        for (id, mut handle) in handles {
            trace!("Disposing {} {}", handle.label(), id);
            handle.dispose();
        }
        if count > 0 {
            debug!("Disposed {} resources", count);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.inner.lock().handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.lock().disposed
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ResourceRegistry")
            .field("live", &inner.handles.len())
            .field("disposed", &inner.disposed)
            .finish()
    }
}
