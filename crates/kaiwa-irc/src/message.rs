//! The inbound message handed to listeners, and the listener contract.
//!
//! The core does not parse IRC commands. A received line is wrapped into an
//! [`IrcMessage`] — the raw decoded text plus the owning connection handle
//! and a receive timestamp — and fanned out as-is. Semantic parsing is a
//! collaborator's job.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::connection::IrcConnection;

/// One inbound line, wrapped for dispatch. Listeners treat it as read-only.
#[derive(Clone)]
pub struct IrcMessage {
    connection: Arc<IrcConnection>,
    raw: String,
    received_at: DateTime<Utc>,
}

impl IrcMessage {
    /// Wrap a decoded line for dispatch.
    ///
    /// Normally called by the connection's read loop; public so external
    /// parsing components and tests can synthesize messages.
    pub fn new(connection: Arc<IrcConnection>, raw: String) -> Self {
        Self {
            connection,
            raw,
            received_at: Utc::now(),
        }
    }

    /// The decoded line, line terminator stripped.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The connection this line arrived on; replies go back through it.
    pub fn connection(&self) -> &Arc<IrcConnection> {
        &self.connection
    }

    /// Wall-clock time the line was read off the socket.
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

impl fmt::Debug for IrcMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrcMessage")
            .field("raw", &self.raw)
            .field("received_at", &self.received_at)
            .finish_non_exhaustive()
    }
}

/// An independent observer of inbound messages.
///
/// Listeners are registered with [`crate::router::MessageRouter`] and
/// invoked in registration order. A failing listener returns `Err`; the
/// router logs it under [`Listener::name`] and carries on with the rest.
pub trait Listener: Send + Sync {
    /// Stable name used to attribute failures in logs.
    fn name(&self) -> &str;

    /// Handle one inbound message.
    fn on_message(&self, msg: &IrcMessage) -> anyhow::Result<()>;
}
