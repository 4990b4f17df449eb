//! # kaiwa
//!
//! The bot binary: loads the connection config, initializes logging, wires
//! the transport core (`kaiwa-irc`) together with a couple of small
//! collaborator listeners, and runs the session until it ends or ctrl-c.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use kaiwa_irc::{IrcConfig, IrcConnection, MessageRouter, StandardLogin};
use tracing_subscriber::EnvFilter;

mod listeners;

/// IRC chat-bot connectivity core.
#[derive(Debug, Parser)]
#[command(name = "kaiwa", version)]
struct Args {
    /// Path to the JSON connection config.
    #[arg(long, default_value = "kaiwa.json")]
    config: PathBuf,

    /// Log filter override, e.g. "debug" or "kaiwa_irc=trace".
    #[arg(long)]
    log: Option<String>,
}

fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(f) => EnvFilter::new(f),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: &Path) -> anyhow::Result<IrcConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log.as_deref());

    let config = Arc::new(load_config(&args.config)?);
    let router = Arc::new(MessageRouter::new());
    router.register(Arc::new(listeners::PongResponder));
    router.register(Arc::new(listeners::ChannelJoiner));

    let conn = IrcConnection::new(config, router, Arc::new(StandardLogin));

    let mut session = tokio::spawn({
        let conn = Arc::clone(&conn);
        async move { conn.start().await }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, stopping");
            conn.stop();
            session.await??;
        }
        res = &mut session => res??,
    }
    Ok(())
}
