// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Unicast NameService connection.
//!
//! One TCP connection to one cluster member, multiplexed down to a single
//! NameService channel:
//!
//! ```text
//! client                                   member
//!   | MULTIPLEXED_SOCKET, NAMESERVICE_SUBPORT |
//!   | [CONN_OPEN] [CHANNEL_OPEN]  ----------> |
//!   | <---------- [conn response]             |
//!   | <---------- [hdr(8) | channel id | 1]   |
//!   |                                         |
//!   | [chan | req id | len | name | 0x40] --> |   lookup
//!   | <---------- [chan | 1 | payload | 1]    |
//! ```
//!
//! The channel id is cut out of the open-channel response at a fixed offset
//! rather than parsed, which only holds for the constant request above.
//! Retries are the caller's business (see [`super::resolver`]).

use super::constants::{
    ABSENT_RESPONSE_EXTRA, CHANNEL_ID_OFFSET, CHANNEL_ID_TRAILER, CHANNEL_OPEN, CONN_OPEN,
    MULTIPLEXED_SOCKET, NAMESERVICE_SUBPORT, NS_LOOKUP_REQ_ID, REQ_END_MARKER,
};
use super::result::LookupResult;
use crate::codec::frame::{read_frame, write_frame};
use crate::codec::packed::write_packed_int;
use crate::error::{Error, ProtocolError, Result};
use byteorder::{BigEndian, WriteBytesExt};
use std::fmt;
use std::io::{self, BufReader, BufWriter, Cursor, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle of a [`Connection`].
///
/// A connection that has not been opened yet is just its `SocketAddr`; the
/// value only exists from the handshake on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake in progress.
    Opening,
    /// Handshake done, lookups allowed.
    Open,
    /// Socket closed, channel id discarded.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Opening => write!(f, "Opening"),
            Self::Open => write!(f, "Open"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// Channel id handed out by the member during the handshake.
///
/// Only meaningful on the connection that received it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelHandle(Vec<u8>);

impl ChannelHandle {
    /// Cut the channel id out of an open-channel response.
    pub fn from_open_response(response: &[u8]) -> Result<Self> {
        let min = CHANNEL_ID_OFFSET + CHANNEL_ID_TRAILER + 1;
        if response.len() < min {
            return Err(ProtocolError::Malformed(format!(
                "open channel response too short: {} bytes (minimum {})",
                response.len(),
                min
            ))
            .into());
        }
        let end = response.len() - CHANNEL_ID_TRAILER;
        Ok(Self(response[CHANNEL_ID_OFFSET..end].to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Aborts blocked reads on a [`Connection`] from another thread.
///
/// Shutting down makes a pending lookup on the owning connection fail with
/// an [`io::ErrorKind::ConnectionAborted`] I/O error instead of waiting out
/// its timeout.
#[derive(Debug)]
pub struct ShutdownHandle {
    peer_addr: SocketAddr,
    stream: TcpStream,
    aborted: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Shut the socket down in both directions. Safe to call repeatedly.
    pub fn shutdown(&self) -> Result<()> {
        self.aborted.store(true, Ordering::SeqCst);
        shutdown_stream(&self.stream)?;
        log::debug!("[NS] shut down connection to {}", self.peer_addr);
        Ok(())
    }
}

fn shutdown_stream(stream: &TcpStream) -> io::Result<()> {
    match stream.shutdown(Shutdown::Both) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
        Err(e) => Err(e),
    }
}

/// Open NameService connection to a single member.
pub struct Connection {
    peer_addr: SocketAddr,
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    channel: ChannelHandle,
    state: ConnectionState,
    aborted: Arc<AtomicBool>,
}

impl Connection {
    /// Connect to `addr` and perform the NameService handshake.
    ///
    /// `timeout` applies to the connect and to every read; zero means no
    /// timeout.
    pub fn open(addr: SocketAddr, timeout: Duration) -> Result<Self> {
        log::debug!("[NS] connecting to {} (timeout={:?})", addr, timeout);

        let stream = if timeout.is_zero() {
            TcpStream::connect(addr)?
        } else {
            TcpStream::connect_timeout(&addr, timeout)?
        };
        stream.set_nodelay(true)?;
        let io_timeout = (!timeout.is_zero()).then_some(timeout);
        stream.set_read_timeout(io_timeout)?;
        stream.set_write_timeout(io_timeout)?;

        let mut conn = Self {
            peer_addr: addr,
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
            channel: ChannelHandle::default(),
            state: ConnectionState::Opening,
            aborted: Arc::new(AtomicBool::new(false)),
        };

        conn.handshake()?;
        conn.state = ConnectionState::Open;
        log::debug!(
            "[NS] connected to {} channel_id_len={}",
            addr,
            conn.channel.len()
        );
        Ok(conn)
    }

    fn handshake(&mut self) -> Result<()> {
        self.writer.write_u32::<BigEndian>(MULTIPLEXED_SOCKET)?;
        self.writer.write_u32::<BigEndian>(NAMESERVICE_SUBPORT)?;
        write_frame(&mut self.writer, &CONN_OPEN)?;
        write_frame(&mut self.writer, &CHANNEL_OPEN)?;
        self.writer.flush()?;

        let conn_response = read_frame(&mut self.reader)?;
        log::trace!(
            "[NS] open connection response: {} bytes",
            conn_response.len()
        );

        let chan_response = read_frame(&mut self.reader)?;
        self.channel = ChannelHandle::from_open_response(&chan_response)?;
        Ok(())
    }

    /// Look up `name`, returning the raw payload for custom decoding.
    pub fn lookup_raw(&mut self, name: &str) -> Result<LookupResult> {
        if self.state != ConnectionState::Open {
            return Err(Error::Closed);
        }

        let request = self.build_lookup_request(name)?;
        let response = match self.exchange(&request) {
            Ok(response) => response,
            Err(_) if self.aborted.load(Ordering::SeqCst) => {
                return Err(io::Error::new(
                    io::ErrorKind::ConnectionAborted,
                    "connection shut down during lookup",
                )
                .into());
            }
            Err(e) => return Err(e),
        };
        let len = response.len();
        let min_len = self.channel.len() + 1;

        if len <= min_len {
            return Err(ProtocolError::Malformed(format!(
                "lookup response too short: {} bytes",
                len
            ))
            .into());
        }
        if len == min_len + ABSENT_RESPONSE_EXTRA {
            log::debug!("[NS] '{}' is not bound on {}", name, self.peer_addr);
            return Ok(LookupResult::Absent);
        }

        // strip channel id + request id, and the end marker
        let payload = response[min_len..len - 1].to_vec();
        log::trace!("[NS] '{}' -> {} payload bytes", name, payload.len());
        Ok(LookupResult::Raw(Cursor::new(payload)))
    }

    fn exchange(&mut self, request: &[u8]) -> Result<Vec<u8>> {
        write_frame(&mut self.writer, request)?;
        self.writer.flush()?;
        read_frame(&mut self.reader)
    }

    /// Look up `name` and decode the bound value as a string.
    pub fn lookup(&mut self, name: &str) -> Result<Option<String>> {
        self.lookup_raw(name)?.into_text()
    }

    fn build_lookup_request(&self, name: &str) -> Result<Vec<u8>> {
        let name_bytes = name.as_bytes();
        let name_len = i32::try_from(name_bytes.len())
            .map_err(|_| ProtocolError::Malformed("lookup name too long".into()))?;

        let mut request =
            Vec::with_capacity(self.channel.len() + NS_LOOKUP_REQ_ID.len() + name_bytes.len() + 6);
        request.extend_from_slice(self.channel.as_bytes());
        request.extend_from_slice(&NS_LOOKUP_REQ_ID);
        write_packed_int(&mut request, name_len)?;
        request.extend_from_slice(name_bytes);
        request.push(REQ_END_MARKER);
        Ok(request)
    }

    /// Close the socket. The channel id is discarded and further lookups
    /// fail with [`Error::Closed`].
    pub fn close(&mut self) -> Result<()> {
        if self.state == ConnectionState::Closed {
            return Ok(());
        }
        self.state = ConnectionState::Closed;
        self.channel = ChannelHandle::default();

        shutdown_stream(self.writer.get_ref())?;
        log::debug!("[NS] closed connection to {}", self.peer_addr);
        Ok(())
    }

    /// Handle for aborting a blocked lookup from another thread.
    pub fn shutdown_handle(&self) -> Result<ShutdownHandle> {
        if self.state == ConnectionState::Closed {
            return Err(Error::Closed);
        }
        Ok(ShutdownHandle {
            peer_addr: self.peer_addr,
            stream: self.writer.get_ref().try_clone()?,
            aborted: Arc::clone(&self.aborted),
        })
    }

    /// Address this connection was opened against.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Channel id negotiated in the handshake (empty once closed).
    pub fn channel(&self) -> &ChannelHandle {
        &self.channel
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("peer_addr", &self.peer_addr)
            .field("state", &self.state)
            .field("channel_id_len", &self.channel.len())
            .finish()
    }
}
