//! Error types for the transport core.

/// Errors surfaced by [`crate::connection::IrcConnection`].
///
/// Transient network failures end the session and are logged rather than
/// returned; what remains here is misuse (`AlreadyConnected`,
/// `NotConnected`), bad configuration (`NoServers`), and the I/O errors
/// that flow through internal plumbing before being absorbed.
#[derive(Debug, thiserror::Error)]
pub enum IrcError {
    /// `start` was called while a session is already running.
    #[error("connection already started")]
    AlreadyConnected,

    /// A write was requested while no socket is open.
    #[error("not connected")]
    NotConnected,

    /// The configuration lists no server endpoints.
    #[error("no servers configured")]
    NoServers,

    /// Socket-level failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IrcError>;
