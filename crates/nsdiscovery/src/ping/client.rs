// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Proxy health checks.
//!
//! [`ping`] talks to the proxy itself with one framed request and one framed
//! answer per connection. [`ns_lookup`] asks the NameService whether the
//! proxy service publishes any addresses instead.

use super::patterns::{
    classify, decode_address_list, is_legacy_no_list, is_list_response, PING_LIST_REQUEST,
    PING_REQUEST,
};
use crate::codec::frame::{read_frame, write_frame};
use crate::error::Result;
use crate::lookup::lookup_addresses;
use std::io::{BufReader, BufWriter, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

/// Result of a completed ping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PingOutcome {
    /// Endpoint answered with a known "alive" pattern.
    pub alive: bool,
    /// Addresses reported by the endpoint, when requested.
    pub addresses: Option<Vec<String>>,
    /// CRC-32 of the raw response, when addresses were requested.
    pub checksum: Option<u32>,
}

/// Ping the proxy at `addr`.
///
/// An unrecognized answer is a completed ping with `alive == false`; only
/// transport and framing failures are errors.
pub fn ping(addr: SocketAddr, timeout: Duration, with_list: bool) -> Result<PingOutcome> {
    log::debug!("[PING] {} (list={})", addr, with_list);

    let stream = if timeout.is_zero() {
        TcpStream::connect(addr)?
    } else {
        TcpStream::connect_timeout(&addr, timeout)?
    };
    stream.set_nodelay(true)?;
    let io_timeout = (!timeout.is_zero()).then_some(timeout);
    stream.set_read_timeout(io_timeout)?;
    stream.set_write_timeout(io_timeout)?;

    let mut writer = BufWriter::new(stream.try_clone()?);
    let mut reader = BufReader::new(stream);

    let request: &[u8] = if with_list {
        &PING_LIST_REQUEST
    } else {
        &PING_REQUEST
    };
    write_frame(&mut writer, request)?;
    writer.flush()?;

    let response = read_frame(&mut reader)?;
    if let Err(e) = reader.get_ref().shutdown(Shutdown::Both) {
        log::trace!("[PING] shutdown of {} failed: {}", addr, e);
    }
    log::trace!("[PING] {} answered {} bytes", addr, response.len());

    let outcome = if !with_list {
        PingOutcome {
            alive: classify(&response),
            ..Default::default()
        }
    } else if is_legacy_no_list(&response) {
        PingOutcome {
            alive: true,
            addresses: Some(Vec::new()),
            checksum: Some(crc32fast::hash(&response)),
        }
    } else if is_list_response(&response) {
        PingOutcome {
            alive: true,
            addresses: Some(decode_address_list(&response)?),
            checksum: Some(crc32fast::hash(&response)),
        }
    } else {
        PingOutcome {
            alive: classify(&response),
            ..Default::default()
        }
    };

    log::debug!("[PING] {} alive={}", addr, outcome.alive);
    Ok(outcome)
}

/// Check a proxy service through the NameService instead of pinging it.
///
/// The service counts as alive when it publishes `<service>/addresses` in
/// `cluster`.
pub fn ns_lookup(
    addr: SocketAddr,
    cluster: Option<&str>,
    service: &str,
    timeout: Duration,
) -> Result<PingOutcome> {
    let addresses = lookup_addresses(cluster, service, addr, timeout)?;
    log::debug!(
        "[PING] NameService lookup of '{}' via {}: {:?}",
        service,
        addr,
        addresses
    );
    Ok(PingOutcome {
        alive: addresses.is_some(),
        addresses,
        checksum: None,
    })
}
