// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for NameService discovery.
//!
//! Three families are kept apart so callers can tell them apart:
//!
//! - [`Error::Io`]: connect/read/write/timeout failures from the OS.
//! - [`ProtocolError`]: the peer sent bytes that do not frame or decode.
//! - [`DiscoveryError`]: the exchange worked but the target is not there.

use crate::config::ConfigError;
use std::io;
use thiserror::Error;

/// Malformed framing or payload. Always fatal to the current call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A frame announced a negative length.
    #[error("received a message with a negative length ({0})")]
    NegativeLength(i32),

    /// A frame announced a length of zero.
    #[error("received a message with a length of zero")]
    EmptyFrame,

    /// The stream ended before the announced number of bytes arrived.
    #[error("truncated message: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// The message framed correctly but its content is not valid.
    #[error("protocol error: {0}")]
    Malformed(String),

    /// A datagram did not start with the discovery magic marker.
    #[error("unexpected packet marker 0x{0:08X}")]
    BadMagic(u32),

    /// A string is too long for its 2-byte length prefix.
    #[error("string of {0} bytes exceeds 65535 byte limit")]
    StringTooLong(usize),
}

/// Expected negative outcomes of a discovery call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    /// A member answered but neither it nor its foreign-cluster table knows
    /// the requested cluster.
    #[error("cluster '{0}' could not be located")]
    ClusterNotFound(String),

    /// Nothing acceptable answered before the retry budget ran out.
    #[error("{}", not_found_message(.0))]
    NotFound(Option<String>),
}

fn not_found_message(cluster: &Option<String>) -> String {
    match cluster {
        Some(cluster) => format!("cluster '{}' could not be located", cluster),
        None => "no cluster could be located".to_string(),
    }
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// Lookup attempted on a connection that was already closed.
    #[error("connection closed")]
    Closed,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// True for "the cluster or name is not there", false for transport and
    /// protocol failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Discovery(_))
    }

    /// True when the underlying failure was a socket timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
