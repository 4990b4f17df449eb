//! Built-in collaborator listeners.
//!
//! These live outside the transport core on purpose: the core treats every
//! line as opaque, so even something as basic as answering `PING` is a
//! listener. Replies are sent from spawned tasks because listener
//! callbacks are synchronous while writes are async.

use std::sync::Arc;

use kaiwa_irc::{IrcMessage, Listener};
use tracing::warn;

/// Answers server keepalive probes so the connection is not dropped.
pub struct PongResponder;

/// The `PONG` payload for a `PING` line, or `None` for anything else.
fn ping_payload(raw: &str) -> Option<&str> {
    raw.strip_prefix("PING")
}

impl Listener for PongResponder {
    fn name(&self) -> &str {
        "pong_responder"
    }

    fn on_message(&self, msg: &IrcMessage) -> anyhow::Result<()> {
        if let Some(rest) = ping_payload(msg.raw()) {
            let reply = format!("PONG{rest}");
            let conn = Arc::clone(msg.connection());
            let _ = tokio::spawn(async move {
                if let Err(e) = conn.send_raw(reply).await {
                    warn!(error = %e, "failed to answer PING");
                }
            });
        }
        Ok(())
    }
}

/// Joins the configured channels once the server welcomes us (numeric 001).
pub struct ChannelJoiner;

/// Whether a raw line is the RPL_WELCOME numeric.
fn is_welcome(raw: &str) -> bool {
    raw.split_whitespace().nth(1) == Some("001")
}

impl Listener for ChannelJoiner {
    fn name(&self) -> &str {
        "channel_joiner"
    }

    fn on_message(&self, msg: &IrcMessage) -> anyhow::Result<()> {
        if is_welcome(msg.raw()) {
            let channels = msg.connection().config().channels.clone();
            if channels.is_empty() {
                return Ok(());
            }
            let conn = Arc::clone(msg.connection());
            let _ = tokio::spawn(async move {
                if let Err(e) = conn.send(format!("JOIN {}", channels.join(","))).await {
                    warn!(error = %e, "failed to join channels");
                }
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_payload_extracted() {
        assert_eq!(ping_payload("PING :irc.example.net"), Some(" :irc.example.net"));
        assert_eq!(ping_payload("NOTICE * :hi"), None);
    }

    #[test]
    fn welcome_numeric_detected() {
        assert!(is_welcome(":irc.example.net 001 kaiwa :Welcome"));
        assert!(!is_welcome(":irc.example.net 372 kaiwa :- motd"));
        assert!(!is_welcome("PING :x"));
    }
}
