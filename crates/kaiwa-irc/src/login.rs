//! Login collaborator seam.
//!
//! The connection performs no registration itself; it hands a freshly
//! opened session to a [`LoginHandler`] exactly once, before the read loop
//! starts. [`StandardLogin`] covers the plain RFC handshake; anything
//! fancier (SASL, custom services) plugs in through the same trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::connection::IrcConnection;
use crate::errors::Result;

/// Performs the protocol handshake on a freshly opened connection.
#[async_trait]
pub trait LoginHandler: Send + Sync {
    /// Called once per successful connect, before any line is read.
    async fn login(&self, conn: &Arc<IrcConnection>) -> Result<()>;
}

/// Plain `PASS`/`NICK`/`USER` registration from the connection config.
pub struct StandardLogin;

#[async_trait]
impl LoginHandler for StandardLogin {
    async fn login(&self, conn: &Arc<IrcConnection>) -> Result<()> {
        let config = conn.config();
        if let Some(pass) = &config.server_password {
            let _ = conn.send_raw(format!("PASS {pass}")).await?;
        }
        let _ = conn.send_raw(format!("NICK {}", config.nickname)).await?;
        let _ = conn
            .send_raw(format!("USER {} 0 * :{}", config.username, config.realname))
            .await?;
        Ok(())
    }
}
