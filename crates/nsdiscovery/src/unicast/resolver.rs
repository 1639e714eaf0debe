// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Foreign-cluster resolution.
//!
//! Several clusters may share a host. The member that answers first may
//! belong to a different cluster than the one requested; every member knows
//! the NameService port of the other clusters it has seen, so the client
//! follows that redirect on the same host until it reaches the right one.
//!
//! ```text
//! open(addr) --> Cluster/name == target? --yes--> done
//!                     | no
//!                     v
//!   Cluster/foreign/<target>/NameService/localPort
//!        | absent -> ClusterNotFound
//!        | port   -> open(addr.ip, port) and repeat
//! ```
//!
//! There is no redirect cap: a cycle can only come from members that
//! disagree with each other, and every hop costs a full connect.

use super::connection::Connection;
use crate::error::{DiscoveryError, ProtocolError, Result};
use crate::lookup::{CLUSTER_NAME, NS_STRING_PREFIX};
use std::net::SocketAddr;
use std::time::Duration;

/// NameService key holding the NameService port of a foreign cluster.
pub fn foreign_port_key(cluster: &str) -> String {
    format!(
        "{}Cluster/foreign/{}/NameService/localPort",
        NS_STRING_PREFIX, cluster
    )
}

/// Open a connection to a member of `cluster`, starting at `addr`.
///
/// With no cluster the first member reached is returned as-is.
pub fn open_cluster(
    cluster: Option<&str>,
    addr: SocketAddr,
    timeout: Duration,
) -> Result<Connection> {
    let mut addr = addr;

    loop {
        let mut conn = Connection::open(addr, timeout)?;

        let Some(target) = cluster else {
            return Ok(conn);
        };

        let found = conn.lookup(CLUSTER_NAME)?;
        if found.as_deref() == Some(target) {
            log::debug!("[NS] reached cluster '{}' at {}", target, addr);
            return Ok(conn);
        }

        let port = conn.lookup(&foreign_port_key(target))?;
        conn.close()?;

        let Some(port) = port else {
            log::debug!(
                "[NS] {} (cluster {:?}) has no route to cluster '{}'",
                addr,
                found,
                target
            );
            return Err(DiscoveryError::ClusterNotFound(target.to_string()).into());
        };

        let port = parse_port(&port)?;
        log::debug!(
            "[NS] {} belongs to {:?}, redirecting to cluster '{}' on port {}",
            addr,
            found,
            target,
            port
        );
        addr = SocketAddr::new(addr.ip(), port);
    }
}

fn parse_port(value: &str) -> Result<u16> {
    value.trim().parse::<u16>().map_err(|_| {
        ProtocolError::Malformed(format!("invalid NameService port '{}'", value)).into()
    })
}
