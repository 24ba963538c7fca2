//! Points the `IdentityFile` entries of selected `Host` blocks in an ssh
//! client config at a new key, and registers that key with the agent.
//!
//! The work is split so that only the edges touch the outside world:
//! [`codec::decode`] turns text into a [`Config`], [`rewrite::rewrite`]
//! mutates it and calls a [`Registrar`] for every rewritten entry, and
//! [`codec::encode`] turns it back into text.

pub mod agent;
pub mod codec;
mod config;
mod error;
pub mod paths;
pub mod registrar;
pub mod rewrite;
#[cfg(test)]
mod testutil;

pub use self::config::{BlockKind, Config, Empty, Host, KeyValue, Node, Pattern};
pub use self::error::Error;
pub use self::error::Result;
pub use self::registrar::Registrar;
