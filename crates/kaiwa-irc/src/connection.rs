//! The persistent server connection.
//!
//! One `IrcConnection` owns one socket at a time. `start` runs the blocking
//! read loop on the calling task; `send`, `send_raw`, and `stop` may be
//! called concurrently from anywhere. Every inbound line is decoded,
//! logged, wrapped into an [`IrcMessage`], and fanned out through the
//! router; every outbound line is fitted to the protocol byte budget and
//! terminated with CRLF.
//!
//! Transient network failures (reset, unreachable host, plain I/O errors)
//! end the session cleanly — they are logged, never returned, and never
//! fatal to the process. Restart policy belongs to the caller.

use std::sync::{Arc, Weak};

use kaiwa_core::encoding::decode_line;
use kaiwa_core::text::{MAX_LINE_BYTES, Outgoing, SERVER_BUDGET, Truncated, client_budget, fit_to_budget};
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::IrcConfig;
use crate::errors::{IrcError, Result};
use crate::login::LoginHandler;
use crate::message::IrcMessage;
use crate::router::MessageRouter;
use crate::watchdog::{self, Watchdog, WatchdogTarget};

/// Lifecycle of the single socket. Exactly one live socket handle exists
/// while `Connected`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session running.
    Disconnected,
    /// Endpoint chosen, socket opening.
    Connecting,
    /// Read loop active.
    Connected,
}

/// The transport core: socket lifecycle, read loop, budgeted writes.
pub struct IrcConnection {
    config: Arc<IrcConfig>,
    router: Arc<MessageRouter>,
    login: Arc<dyn LoginHandler>,
    watchdog: Watchdog,
    state: Mutex<ConnectionState>,
    /// Exclusive owner of the socket's write half while connected.
    writer: tokio::sync::Mutex<Option<BufWriter<OwnedWriteHalf>>>,
    /// Single-writer (read loop), multi-reader (watchdog).
    last_activity: RwLock<Instant>,
    last_sent: Mutex<Option<Truncated>>,
    last_received: Mutex<Option<String>>,
    /// Our own identity prefix as other clients see it; feeds the client
    /// byte budget. Updated by external user bookkeeping.
    hostmask: RwLock<String>,
    /// Replaced with a fresh token on every `start`.
    stop_token: Mutex<CancellationToken>,
}

impl IrcConnection {
    /// New connection with the default watchdog cadence.
    pub fn new(
        config: Arc<IrcConfig>,
        router: Arc<MessageRouter>,
        login: Arc<dyn LoginHandler>,
    ) -> Arc<Self> {
        Self::with_watchdog_tick(config, router, login, watchdog::DEFAULT_TICK)
    }

    /// New connection with a custom watchdog check cadence (shortened in
    /// tests so staleness is detected quickly).
    pub fn with_watchdog_tick(
        config: Arc<IrcConfig>,
        router: Arc<MessageRouter>,
        login: Arc<dyn LoginHandler>,
        tick: tokio::time::Duration,
    ) -> Arc<Self> {
        let hostmask = format!("{}!{}@unknown", config.nickname, config.username);
        Arc::new(Self {
            config,
            router,
            login,
            watchdog: Watchdog::with_tick(tick),
            state: Mutex::new(ConnectionState::Disconnected),
            writer: tokio::sync::Mutex::new(None),
            last_activity: RwLock::new(Instant::now()),
            last_sent: Mutex::new(None),
            last_received: Mutex::new(None),
            hostmask: RwLock::new(hostmask),
            stop_token: Mutex::new(CancellationToken::new()),
        })
    }

    /// The frozen session configuration.
    pub fn config(&self) -> &IrcConfig {
        &self.config
    }

    /// The router inbound lines are dispatched through.
    pub fn router(&self) -> &MessageRouter {
        &self.router
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Last line written to the socket, if any.
    pub fn last_sent(&self) -> Option<Truncated> {
        self.last_sent.lock().clone()
    }

    /// Last line read from the socket, if any.
    pub fn last_received(&self) -> Option<String> {
        self.last_received.lock().clone()
    }

    /// Our identity prefix as the server relays it to other clients.
    pub fn hostmask(&self) -> String {
        self.hostmask.read().clone()
    }

    /// Update the hostmask (e.g. after a WHOIS on ourselves) so the client
    /// byte budget stays accurate.
    pub fn set_hostmask(&self, hostmask: impl Into<String>) {
        *self.hostmask.write() = hostmask.into();
    }

    /// Open the socket and run the session until it ends.
    ///
    /// Blocks the calling task for the whole session: connect, handshake
    /// via the login collaborator, then one read-decode-dispatch iteration
    /// per inbound line. Returns `Err` only for misuse or bad
    /// configuration; network failures end the session cleanly and return
    /// `Ok(())`.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        let token = CancellationToken::new();
        {
            // Token swap happens under the state lock so a concurrent
            // `stop` either sees `Disconnected` or the token for this
            // session, never a cancelled leftover from the previous one.
            let mut state = self.state.lock();
            if *state != ConnectionState::Disconnected {
                return Err(IrcError::AlreadyConnected);
            }
            *state = ConnectionState::Connecting;
            *self.stop_token.lock() = token.clone();
        }
        *self.last_activity.write() = Instant::now();

        let result = self.run_session(&token).await;

        // Cleanup on every exit path.
        self.watchdog.disarm();
        *self.writer.lock().await = None;
        *self.state.lock() = ConnectionState::Disconnected;
        info!("session ended");

        match result {
            Ok(()) => Ok(()),
            Err(IrcError::Io(e)) => {
                // Transient network failure: not fatal, caller decides
                // whether to start a new session.
                warn!(error = %e, "session ended with network error");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Request an orderly close from any task.
    ///
    /// Cancels the session token, which deterministically unblocks the read
    /// loop. Idempotent; a no-op when no session is running.
    pub fn stop(&self) {
        let token = {
            let state = self.state.lock();
            if *state == ConnectionState::Disconnected {
                return;
            }
            // Same lock order as `start`, and reading the token under the
            // state lock guarantees it belongs to the session we just
            // observed.
            self.stop_token.lock().clone()
        };
        if token.is_cancelled() {
            return;
        }
        info!("forcibly closing connection");
        token.cancel();
    }

    /// Send a line sized for what *other clients* will see.
    ///
    /// The server prepends our hostmask when relaying, so the budget is
    /// `510 - hostmask - 2`. Returns the number of characters written.
    pub async fn send(&self, raw: impl Into<Outgoing>) -> Result<usize> {
        let budget = client_budget(self.hostmask.read().len());
        self.send_raw(fit_to_budget(raw, budget)).await
    }

    /// Send a line sized for the server's 510-byte payload budget.
    ///
    /// Already-fitted input (from [`Self::send`]) passes through without
    /// re-truncation. The line is logged with configured passwords
    /// redacted, then written with the CRLF terminator. Returns the number
    /// of characters written.
    pub async fn send_raw(&self, raw: impl Into<Outgoing>) -> Result<usize> {
        let fitted = fit_to_budget(raw, SERVER_BUDGET);
        *self.last_sent.lock() = Some(fitted.clone());
        info!(line = %self.redact(fitted.as_str()), "send");

        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(IrcError::NotConnected)?;
        writer.write_all(fitted.as_str().as_bytes()).await?;
        writer.write_all(b"\r\n").await?;
        writer.flush().await?;
        Ok(fitted.char_count())
    }

    async fn run_session(self: &Arc<Self>, token: &CancellationToken) -> Result<()> {
        let addr = self.pick_endpoint()?;
        info!(%addr, "connecting");

        // Armed before the socket opens so a hung connect is also caught.
        if let Some(interval) = self.config.watchdog_interval() {
            let weak = Arc::downgrade(self);
            let target: Weak<dyn WatchdogTarget> = weak;
            self.watchdog.arm(target, interval);
        }

        let stream = tokio::select! {
            res = TcpStream::connect(&addr) => res?,
            () = token.cancelled() => return Ok(()),
        };
        let (read_half, write_half) = stream.into_split();
        *self.writer.lock().await = Some(BufWriter::new(write_half));
        *self.state.lock() = ConnectionState::Connected;
        info!(%addr, "connected");

        self.login.login(self).await?;

        let mut reader = BufReader::new(read_half);
        let mut buf: Vec<u8> = Vec::with_capacity(MAX_LINE_BYTES);
        loop {
            buf.clear();
            let n = tokio::select! {
                res = reader.read_until(b'\n', &mut buf) => res?,
                () = token.cancelled() => {
                    info!("stop requested, closing connection");
                    return Ok(());
                }
            };
            if n == 0 {
                info!("server closed the connection");
                return Ok(());
            }
            *self.last_activity.write() = Instant::now();

            while buf.last().is_some_and(|b| *b == b'\n' || *b == b'\r') {
                let _ = buf.pop();
            }
            let line = decode_line(&buf);
            info!(line = %line, "recv");
            *self.last_received.lock() = Some(line.clone());

            let msg = IrcMessage::new(Arc::clone(self), line);
            self.router.dispatch(&msg);

            // Listeners usually reply from spawned tasks; pushing buffered
            // bytes out here bounds the latency of anything still queued.
            self.flush_pending().await?;
        }
    }

    fn pick_endpoint(&self) -> Result<String> {
        let servers = &self.config.servers;
        let host = match servers.len() {
            0 => return Err(IrcError::NoServers),
            1 => &servers[0],
            n => &servers[rand::rng().random_range(0..n)],
        };
        Ok(format!("{host}:{}", self.config.port))
    }

    async fn flush_pending(&self) -> Result<()> {
        if let Some(writer) = self.writer.lock().await.as_mut() {
            writer.flush().await?;
        }
        Ok(())
    }

    /// Substitute configured secrets before a line reaches the log.
    pub(crate) fn redact(&self, line: &str) -> String {
        let mut out = line.to_owned();
        if let Some(pass) = self.config.server_password.as_deref()
            && !pass.is_empty()
        {
            out = out.replace(pass, "*SRP*");
        }
        if let Some(pass) = self.config.user_password.as_deref()
            && !pass.is_empty()
        {
            out = out.replace(pass, "*USP*");
        }
        out
    }
}

impl WatchdogTarget for IrcConnection {
    fn last_activity(&self) -> Instant {
        *self.last_activity.read()
    }

    fn request_stop(&self) {
        self.stop();
    }
}
