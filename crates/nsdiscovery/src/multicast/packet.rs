// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery datagram layout.
//!
//! # Request
//!
//! ```text
//! +--------------+-----------------+---------+-------+
//! | Magic (4B)   | Cluster (UTF)   | Attempt | Limit |
//! +--------------+-----------------+---------+-------+
//! | AddrLen (1B) | Addr (0/4/16B)  | Port (4B BE)     |
//! +--------------+-----------------+------------------+
//! | Name (UTF)   | PayloadLen (4B) | Payload          |
//! +--------------+-----------------+------------------+
//! ```
//!
//! UTF fields carry a 2-byte big-endian length. An empty cluster means
//! "any cluster". The address and port identify the sender so a member can
//! answer over unicast; both are zero when no interface was chosen.
//!
//! # Response
//!
//! Same header with the member's cluster, address and port, followed by the
//! NameService name and the lookup result. A result length of -1 means the
//! result did not fit in a datagram and must be fetched over TCP.

use crate::codec::data::{read_bytes, read_utf, write_utf};
use crate::error::{ProtocolError, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Marker at the start of every discovery datagram.
pub const DISCOVERY_MAGIC: u32 = 0x0DDF_00DA;

/// Result length announcing a TCP fallback.
pub const TOO_LARGE_FOR_UDP: i32 = -1;

/// Largest datagram the client will receive.
pub const MAX_DATAGRAM_SIZE: usize = 65535;

/// Fields of an outgoing discovery request.
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryRequest<'a> {
    /// Target cluster, `None` for any.
    pub cluster: Option<&'a str>,
    /// NameService name to look up.
    pub name: &'a str,
    /// Attempt limit, low 8 bits.
    pub attempt_limit: u8,
    /// Address members should reply to, `None` when not bound to an interface.
    pub reply_to: Option<SocketAddr>,
    /// Opaque bytes forwarded to the member.
    pub payload: Option<&'a [u8]>,
}

/// Encoded request with an in-place patchable attempt byte.
#[derive(Debug, Clone)]
pub struct RequestPacket {
    bytes: Vec<u8>,
    attempt_offset: usize,
}

impl RequestPacket {
    /// Encode `request`. The attempt byte starts at zero.
    pub fn encode(request: &DiscoveryRequest<'_>) -> Result<Self> {
        let mut buf = Vec::with_capacity(64 + request.name.len());
        buf.write_u32::<BigEndian>(DISCOVERY_MAGIC)?;
        write_utf(&mut buf, request.cluster.unwrap_or(""))?;

        let attempt_offset = buf.len();
        buf.write_u8(0)?;
        buf.write_u8(request.attempt_limit)?;

        match request.reply_to {
            Some(addr) => {
                let octets = ip_octets(addr.ip());
                buf.write_u8(octets.len() as u8)?;
                buf.extend_from_slice(&octets);
                buf.write_i32::<BigEndian>(i32::from(addr.port()))?;
            }
            None => {
                buf.write_u8(0)?;
                buf.write_i32::<BigEndian>(0)?;
            }
        }

        write_utf(&mut buf, request.name)?;

        match request.payload {
            Some(payload) => {
                let len = i32::try_from(payload.len()).map_err(|_| {
                    ProtocolError::Malformed(format!(
                        "client payload of {} bytes is too large",
                        payload.len()
                    ))
                })?;
                buf.write_i32::<BigEndian>(len)?;
                buf.extend_from_slice(payload);
            }
            None => buf.write_i32::<BigEndian>(0)?,
        }

        if buf.len() > MAX_DATAGRAM_SIZE {
            return Err(ProtocolError::Malformed(format!(
                "discovery request of {} bytes does not fit in a datagram",
                buf.len()
            ))
            .into());
        }

        Ok(Self {
            bytes: buf,
            attempt_offset,
        })
    }

    /// Overwrite the attempt byte.
    pub fn set_attempt(&mut self, attempt: u8) {
        self.bytes[self.attempt_offset] = attempt;
    }

    pub fn attempt(&self) -> u8 {
        self.bytes[self.attempt_offset]
    }

    pub fn attempt_offset(&self) -> usize {
        self.attempt_offset
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

fn ip_octets(ip: IpAddr) -> Vec<u8> {
    match ip {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    }
}

/// Lookup result carried by a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// Result too large for UDP, fetch it from the responder over TCP.
    TooLarge,
    /// Result bytes starting at the 4-byte result length.
    Inline(Vec<u8>),
}

/// Parsed discovery response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryResponse {
    pub cluster: String,
    pub attempt: u8,
    pub attempt_limit: u8,
    /// Responder address, `None` when it did not include one.
    pub address: Option<IpAddr>,
    pub port: i32,
    pub name: String,
    pub body: ResponseBody,
}

impl DiscoveryResponse {
    /// Parse one received datagram.
    pub fn parse(datagram: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(datagram);

        let magic = cursor.read_u32::<BigEndian>()?;
        if magic != DISCOVERY_MAGIC {
            return Err(ProtocolError::BadMagic(magic).into());
        }

        let cluster = read_utf(&mut cursor)?;
        let attempt = cursor.read_u8()?;
        let attempt_limit = cursor.read_u8()?;

        let addr_len = cursor.read_i8()?;
        let address = match addr_len {
            0 => None,
            4 => {
                let mut octets = [0u8; 4];
                octets.copy_from_slice(&read_bytes(&mut cursor, 4)?);
                Some(IpAddr::V4(Ipv4Addr::from(octets)))
            }
            16 => {
                let mut octets = [0u8; 16];
                octets.copy_from_slice(&read_bytes(&mut cursor, 16)?);
                Some(IpAddr::V6(Ipv6Addr::from(octets)))
            }
            n => {
                return Err(
                    ProtocolError::Malformed(format!("invalid address length {}", n)).into(),
                )
            }
        };
        let port = cursor.read_i32::<BigEndian>()?;
        let name = read_utf(&mut cursor)?;

        // peek the result length, the inline body starts at it
        let body_start = cursor.position() as usize;
        let result_len = cursor.read_i32::<BigEndian>()?;
        let body = if result_len == TOO_LARGE_FOR_UDP {
            ResponseBody::TooLarge
        } else {
            ResponseBody::Inline(datagram[body_start..].to_vec())
        };

        Ok(Self {
            cluster,
            attempt,
            attempt_limit,
            address,
            port,
            name,
            body,
        })
    }
}

/// Build a response datagram. Used by members and test responders.
pub fn encode_response(
    cluster: &str,
    attempt: u8,
    attempt_limit: u8,
    responder: Option<SocketAddr>,
    name: &str,
    body: &ResponseBody,
) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(64);
    buf.write_u32::<BigEndian>(DISCOVERY_MAGIC)?;
    write_utf(&mut buf, cluster)?;
    buf.write_u8(attempt)?;
    buf.write_u8(attempt_limit)?;
    match responder {
        Some(addr) => {
            let octets = ip_octets(addr.ip());
            buf.write_u8(octets.len() as u8)?;
            buf.extend_from_slice(&octets);
            buf.write_i32::<BigEndian>(i32::from(addr.port()))?;
        }
        None => {
            buf.write_u8(0)?;
            buf.write_i32::<BigEndian>(0)?;
        }
    }
    write_utf(&mut buf, name)?;
    match body {
        ResponseBody::TooLarge => buf.write_i32::<BigEndian>(TOO_LARGE_FOR_UDP)?,
        ResponseBody::Inline(bytes) => buf.extend_from_slice(bytes),
    }
    Ok(buf)
}
