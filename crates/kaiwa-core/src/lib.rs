//! # kaiwa-core
//!
//! Foundation text utilities shared by the kaiwa IRC bot crates:
//!
//! - **Truncation**: [`text::fit_to_budget`] fits outbound lines into the
//!   protocol's byte budget without splitting multi-byte characters, and
//!   tags the result so it is never truncated twice.
//! - **Encoding repair**: [`encoding::decode_line`] turns arbitrary inbound
//!   bytes into valid UTF-8, falling back to Windows-1252 for legacy peers.
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `kaiwa-irc` and the `kaiwa` binary.

#![deny(unsafe_code)]

pub mod encoding;
pub mod text;
