// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Datagram discovery client.
//!
//! Sends a lookup request to the discovery group and collects answers from
//! every cluster that responds, at most one per cluster. Results too large
//! for a datagram are fetched from the responding member over TCP.

use super::attempt::{DiscoveryAttempt, RetrySchedule};
use super::packet::{
    DiscoveryRequest, DiscoveryResponse, RequestPacket, ResponseBody, MAX_DATAGRAM_SIZE,
};
use crate::error::{DiscoveryError, Result};
use crate::unicast::{open_cluster, LookupResult};
use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, Cursor};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::Duration;

/// Default discovery group address.
pub const DEFAULT_GROUP_ADDR: Ipv4Addr = Ipv4Addr::new(239, 192, 0, 0);

/// Default discovery port, shared with the NameService TCP port.
pub const DEFAULT_PORT: u16 = 7574;

/// Default multicast TTL.
pub const DEFAULT_TTL: u32 = 4;

/// Default total timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Discovery client for one group.
#[derive(Debug, Clone)]
pub struct MulticastClient {
    group: SocketAddr,
    local: Option<IpAddr>,
    timeout: Duration,
    ttl: u32,
}

impl Default for MulticastClient {
    fn default() -> Self {
        Self::new(SocketAddr::new(IpAddr::V4(DEFAULT_GROUP_ADDR), DEFAULT_PORT))
    }
}

impl MulticastClient {
    /// Client for `group` with default timeout and TTL.
    #[must_use]
    pub fn new(group: SocketAddr) -> Self {
        Self {
            group,
            local: None,
            timeout: DEFAULT_TIMEOUT,
            ttl: DEFAULT_TTL,
        }
    }

    /// Send from (and advertise) a specific local interface.
    #[must_use]
    pub fn with_local_interface(mut self, local: Option<IpAddr>) -> Self {
        self.local = local;
        self
    }

    /// Total timeout; zero retries until a result arrives.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn group(&self) -> SocketAddr {
        self.group
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Look up `name` in every cluster reachable through the group, or only
    /// in `cluster` when given.
    ///
    /// `on_result` is called once per accepted cluster. With a target cluster
    /// the call returns right after the first acceptance. Fails with
    /// [`DiscoveryError::NotFound`] if no cluster was accepted before the
    /// attempts ran out.
    pub fn discover<F>(
        &self,
        cluster: Option<&str>,
        name: &str,
        payload: Option<&[u8]>,
        mut on_result: F,
    ) -> Result<()>
    where
        F: FnMut(&str, LookupResult) -> Result<()>,
    {
        let socket = self.bind_socket()?;
        let schedule = RetrySchedule::for_timeout(self.timeout);

        let reply_to = self
            .advertised_local()
            .map(|ip| socket.local_addr().map(|a| SocketAddr::new(ip, a.port())))
            .transpose()?;

        let mut packet = RequestPacket::encode(&DiscoveryRequest {
            cluster,
            name,
            attempt_limit: schedule.attempt_limit_byte(),
            reply_to,
            payload,
        })?;

        let mut attempt = DiscoveryAttempt::new(schedule);
        packet.set_attempt(attempt.advance());
        socket.send_to(packet.as_bytes(), self.group)?;
        log::debug!(
            "[MCAST] sent lookup '{}' cluster={:?} to {} (delay={:?} attempts={:?})",
            name,
            cluster,
            self.group,
            schedule.delay,
            schedule.attempts
        );

        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        loop {
            let Some(window) = attempt.remaining_window() else {
                if !attempt.on_timeout() {
                    break;
                }
                packet.set_attempt(attempt.advance());
                socket.send_to(packet.as_bytes(), self.group)?;
                log::trace!(
                    "[MCAST] retransmit attempt={} remaining={:?}",
                    packet.attempt(),
                    attempt.remaining_attempts()
                );
                continue;
            };

            socket.set_read_timeout(Some(window))?;
            let (len, src) = match socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(ref e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::TimedOut
                        || e.kind() == io::ErrorKind::Interrupted =>
                {
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let datagram = &buf[..len];
            let accepted =
                self.handle_datagram(datagram, src, cluster, name, &mut attempt, &mut on_result)?;
            if accepted && cluster.is_some() {
                return Ok(());
            }
        }

        if attempt.has_accepted() {
            Ok(())
        } else {
            log::debug!("[MCAST] no answer for '{}' cluster={:?}", name, cluster);
            Err(DiscoveryError::NotFound(cluster.map(str::to_string)).into())
        }
    }

    /// Returns true if the datagram was accepted and delivered.
    fn handle_datagram<F>(
        &self,
        datagram: &[u8],
        src: SocketAddr,
        cluster: Option<&str>,
        name: &str,
        attempt: &mut DiscoveryAttempt,
        on_result: &mut F,
    ) -> Result<bool>
    where
        F: FnMut(&str, LookupResult) -> Result<()>,
    {
        let response = match DiscoveryResponse::parse(datagram) {
            Ok(response) => response,
            Err(e) => {
                log::debug!("[MCAST] ignoring datagram from {}: {}", src, e);
                return Ok(false);
            }
        };

        if cluster.is_some_and(|target| target != response.cluster) {
            log::trace!("[MCAST] skip {}: cluster '{}'", src, response.cluster);
            return Ok(false);
        }
        if response.name != name {
            log::trace!("[MCAST] skip {}: name '{}'", src, response.name);
            return Ok(false);
        }
        if !attempt.accept(&response.cluster) {
            log::trace!("[MCAST] skip {}: duplicate of '{}'", src, response.cluster);
            return Ok(false);
        }

        match response.body {
            ResponseBody::Inline(bytes) => {
                log::debug!(
                    "[MCAST] accepted '{}' from {} ({} bytes)",
                    response.cluster,
                    src,
                    bytes.len()
                );
                on_result(&response.cluster, LookupResult::Raw(Cursor::new(bytes)))?;
            }
            ResponseBody::TooLarge => {
                let ip = response.address.unwrap_or_else(|| src.ip());
                let member = SocketAddr::new(ip, self.group.port());
                log::debug!(
                    "[MCAST] '{}' result too large for UDP, fetching from {}",
                    response.cluster,
                    member
                );

                let tcp_timeout = if self.timeout.is_zero() {
                    DEFAULT_TIMEOUT
                } else {
                    self.timeout
                };
                let mut conn = open_cluster(Some(&response.cluster), member, tcp_timeout)?;
                let result = conn.lookup_raw(name)?;
                on_result(&response.cluster, result)?;
                conn.close()?;
            }
        }
        Ok(true)
    }

    /// Local interface to advertise, `None` when unset or unspecified.
    fn advertised_local(&self) -> Option<IpAddr> {
        self.local
            .filter(|ip| !ip.is_unspecified() && ip.is_ipv4() == self.group.is_ipv4())
    }

    fn bind_socket(&self) -> Result<UdpSocket> {
        let (domain, any) = match self.group.ip() {
            IpAddr::V4(_) => (Domain::IPV4, IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            IpAddr::V6(_) => (Domain::IPV6, IpAddr::V6(Ipv6Addr::UNSPECIFIED)),
        };

        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        socket.bind(&SocketAddr::new(any, 0).into())?;

        match self.group.ip() {
            IpAddr::V4(_) => {
                socket.set_multicast_ttl_v4(self.ttl)?;
                if let Some(IpAddr::V4(local)) = self.advertised_local() {
                    socket.set_multicast_if_v4(&local)?;
                    log::debug!("[MCAST] multicast interface {}", local);
                }
            }
            IpAddr::V6(_) => socket.set_multicast_hops_v6(self.ttl)?,
        }

        if self.local.is_some() && self.advertised_local().is_none() {
            log::debug!(
                "[MCAST] local interface {:?} not usable for group {}, using default",
                self.local,
                self.group
            );
        }

        Ok(socket.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let client = MulticastClient::default();
        assert_eq!(client.group(), "239.192.0.0:7574".parse().unwrap());
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(client.ttl, DEFAULT_TTL);
        assert!(client.local.is_none());
    }

    #[test]
    fn test_advertised_local_filters() {
        let group: SocketAddr = "239.192.0.0:7574".parse().unwrap();

        let client =
            MulticastClient::new(group).with_local_interface(Some("0.0.0.0".parse().unwrap()));
        assert_eq!(client.advertised_local(), None);

        let client = MulticastClient::new(group).with_local_interface(Some("::1".parse().unwrap()));
        assert_eq!(client.advertised_local(), None);

        let client =
            MulticastClient::new(group).with_local_interface(Some("127.0.0.1".parse().unwrap()));
        assert_eq!(client.advertised_local(), Some("127.0.0.1".parse().unwrap()));
    }

    #[test]
    fn test_no_answer_is_not_found() {
        // a bound socket that never answers
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let group = silent.local_addr().unwrap();

        let client = MulticastClient::new(group).with_timeout(Duration::from_millis(100));
        let err = client
            .discover(Some("prod"), "Cluster/info", None, |_, _| Ok(()))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "cluster 'prod' could not be located");
    }
}
