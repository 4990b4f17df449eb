//! # kaiwa-irc
//!
//! Transport and dispatch core for the kaiwa IRC bot. Owns the single
//! persistent server connection and everything with real failure-handling
//! responsibility around it:
//!
//! - **[`connection::IrcConnection`]**: socket lifecycle — connect, the
//!   line-oriented read loop, budgeted line writes, orderly stop.
//! - **[`watchdog::Watchdog`]**: background liveness timer that forces a
//!   disconnect when the server goes silent without closing the socket.
//! - **[`router::MessageRouter`]**: ordered listener fan-out with
//!   per-listener failure isolation.
//! - **[`config::IrcConfig`]**: frozen per-session connection settings.
//!
//! Everything semantic — command parsing, plugin logic, user/channel
//! bookkeeping — lives outside this crate. The core hands collaborators an
//! opaque [`message::IrcMessage`] and receives lines to send back; it never
//! interprets IRC commands itself.
//!
//! ## Data Flow
//!
//! Inbound: socket → raw byte line → encoding repair (`kaiwa-core`) →
//! [`message::IrcMessage`] → [`router::MessageRouter`] → listeners.
//! Outbound: `send`/`send_raw` → budget fit (`kaiwa-core`) → socket + CRLF.

#![deny(unsafe_code)]

pub mod config;
pub mod connection;
pub mod errors;
pub mod login;
pub mod message;
pub mod router;
pub mod watchdog;

pub use config::IrcConfig;
pub use connection::{ConnectionState, IrcConnection};
pub use errors::{IrcError, Result};
pub use login::{LoginHandler, StandardLogin};
pub use message::{IrcMessage, Listener};
pub use router::MessageRouter;
pub use watchdog::Watchdog;
