// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! High-level NameService lookups.
//!
//! Convenience wrappers over [`crate::unicast`] and [`crate::multicast`] for
//! the names a cluster publishes about itself.

use crate::error::Result;
use crate::multicast::MulticastClient;
use crate::unicast::{open_cluster, Connection, LookupResult};
use std::net::SocketAddr;
use std::time::Duration;

/// Namespace that makes the NameService return the bound value as a string.
pub const NS_STRING_PREFIX: &str = "NameService/string/";

/// Name of the cluster the member belongs to.
pub const CLUSTER_NAME: &str = "Cluster/name";

/// Human-readable cluster description.
pub const CLUSTER_INFO: &str = "Cluster/info";

/// Comma-separated names of the foreign clusters a member knows about.
pub const CLUSTER_FOREIGN: &str = "Cluster/foreign";

/// JMX connector URL of the management node.
pub const JMX_CONNECTOR_URL: &str = "management/JMXServiceURL";

/// HTTP management URLs.
pub const HTTP_MANAGEMENT_URL: &str = "management/HTTPManagementURL";

/// HTTP metrics URLs.
pub const HTTP_METRICS_URL: &str = "metrics/HTTPMetricsURL";

/// Timeout of the unicast convenience lookups.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Look up `name` on whichever member answers at `addr`.
pub fn lookup(name: &str, addr: SocketAddr, timeout: Duration) -> Result<Option<String>> {
    let mut conn = Connection::open(addr, timeout)?;
    let value = conn.lookup(name);
    close_after(conn, value)
}

/// Look up `name` on a member of `cluster`, following foreign-cluster
/// redirects from `addr`.
pub fn lookup_in_cluster(
    cluster: Option<&str>,
    name: &str,
    addr: SocketAddr,
    timeout: Duration,
) -> Result<Option<String>> {
    let mut conn = open_cluster(cluster, addr, timeout)?;
    let value = conn.lookup(name);
    close_after(conn, value)
}

/// Close `conn` once `value` is known. A lookup error wins over a close
/// error, which is only logged then.
fn close_after<T>(mut conn: Connection, value: Result<T>) -> Result<T> {
    let closed = conn.close();
    finish_with(value, closed)
}

fn finish_with<T>(value: Result<T>, closed: Result<()>) -> Result<T> {
    match (value, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            log::debug!("[NS] close after failed lookup also failed: {}", close_err);
            Err(e)
        }
    }
}

/// JMX service URL of the cluster's management node.
pub fn lookup_jmx_service_url(cluster: Option<&str>, addr: SocketAddr) -> Result<Option<String>> {
    lookup_in_cluster(cluster, JMX_CONNECTOR_URL, addr, DEFAULT_TIMEOUT)
}

/// HTTP management URLs, empty when none are published.
pub fn lookup_http_management_urls(cluster: Option<&str>, addr: SocketAddr) -> Result<Vec<String>> {
    lookup_url_list(cluster, HTTP_MANAGEMENT_URL, addr, DEFAULT_TIMEOUT)
}

/// HTTP metrics URLs, empty when none are published.
pub fn lookup_http_metrics_urls(cluster: Option<&str>, addr: SocketAddr) -> Result<Vec<String>> {
    lookup_url_list(cluster, HTTP_METRICS_URL, addr, DEFAULT_TIMEOUT)
}

/// Addresses a service publishes under `<service>/addresses`.
pub fn lookup_addresses(
    cluster: Option<&str>,
    service: &str,
    addr: SocketAddr,
    timeout: Duration,
) -> Result<Option<Vec<String>>> {
    let key = format!("{}{}/addresses", NS_STRING_PREFIX, service);
    Ok(lookup_in_cluster(cluster, &key, addr, timeout)?.map(|s| parse_url_list(&s)))
}

fn lookup_url_list(
    cluster: Option<&str>,
    name: &str,
    addr: SocketAddr,
    timeout: Duration,
) -> Result<Vec<String>> {
    let key = format!("{}{}", NS_STRING_PREFIX, name);
    Ok(lookup_in_cluster(cluster, &key, addr, timeout)?
        .map(|s| parse_url_list(&s))
        .unwrap_or_default())
}

/// Split a `"[a, b, c]"` list rendering into its elements.
///
/// ```
/// use nsdiscovery::lookup::parse_url_list;
///
/// assert_eq!(
///     parse_url_list("[http://a:30000/, http://b:30000/]"),
///     vec!["http://a:30000/", "http://b:30000/"]
/// );
/// assert!(parse_url_list("[]").is_empty());
/// ```
pub fn parse_url_list(rendered: &str) -> Vec<String> {
    rendered
        .split(|c: char| matches!(c, '[' | ']' | ',' | ' '))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Names of the member's own cluster and every foreign cluster it knows.
pub fn cluster_names(conn: &mut Connection) -> Result<Vec<String>> {
    let local = conn.lookup(CLUSTER_NAME)?;
    let foreign = conn.lookup(&format!("{}{}", NS_STRING_PREFIX, CLUSTER_FOREIGN))?;

    let mut names = Vec::new();
    for list in [local, foreign].into_iter().flatten() {
        for name in list.split(|c: char| matches!(c, '[' | ']' | ',')) {
            let name = name.trim();
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

/// Datagram lookup decoding every accepted payload as a string.
///
/// `on_result` receives the responding cluster and its value, `None` when
/// the name is not bound there.
pub fn datagram_lookup<F>(
    client: &MulticastClient,
    cluster: Option<&str>,
    name: &str,
    payload: Option<&[u8]>,
    mut on_result: F,
) -> Result<()>
where
    F: FnMut(&str, Option<String>),
{
    client.discover(cluster, name, payload, |found, result| {
        on_result(found, result.into_text()?);
        Ok(())
    })
}

/// Datagram lookup returning the first payload delivered.
///
/// Meant for a single target cluster, where at most one payload arrives.
/// Without a target, later clusters are still collected and dropped.
pub fn datagram_lookup_raw_first(
    client: &MulticastClient,
    cluster: Option<&str>,
    name: &str,
    payload: Option<&[u8]>,
) -> Result<LookupResult> {
    let mut first = None;
    client.discover(cluster, name, payload, |_, result| {
        if first.is_none() {
            first = Some(result);
        }
        Ok(())
    })?;
    Ok(first.unwrap_or(LookupResult::Absent))
}
