//! Listener fan-out with per-listener failure isolation.
//!
//! The router owns the ordered listener registry. `dispatch` delivers one
//! message to every listener registered at the moment the call starts, in
//! registration order; one listener's failure is logged and never reaches
//! the others or the caller. That isolation is the router's whole point —
//! a misbehaving observer must not starve the rest.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use crate::message::{IrcMessage, Listener};

/// Ordered, failure-isolated listener fan-out.
#[derive(Default)]
pub struct MessageRouter {
    listeners: RwLock<Vec<Arc<dyn Listener>>>,
}

impl MessageRouter {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener. Duplicate handles are permitted; each registration
    /// gets its own delivery.
    pub fn register(&self, listener: Arc<dyn Listener>) {
        self.listeners.write().push(listener);
    }

    /// Remove **all** registrations of this handle (pointer identity).
    pub fn unregister(&self, listener: &Arc<dyn Listener>) {
        self.listeners
            .write()
            .retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Deliver `msg` to every listener registered when the call starts.
    ///
    /// The registry is snapshotted first, so a listener may register or
    /// unregister listeners during its own invocation; such changes take
    /// effect from the next dispatch.
    pub fn dispatch(&self, msg: &IrcMessage) {
        let snapshot: Vec<Arc<dyn Listener>> = self.listeners.read().clone();
        for listener in snapshot {
            if let Err(e) = listener.on_message(msg) {
                warn!(listener = listener.name(), error = %e, "listener failed to handle message");
            }
        }
    }

    /// Number of current registrations (duplicates counted).
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}
