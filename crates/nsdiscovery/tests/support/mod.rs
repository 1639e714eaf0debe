// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fake cluster members for integration tests.

#![allow(dead_code)]

use byteorder::{BigEndian, ReadBytesExt};
use nsdiscovery::codec::data::read_utf;
use nsdiscovery::codec::frame::{read_frame, write_frame};
use nsdiscovery::codec::packed::read_packed_int;
use nsdiscovery::multicast::packet::{encode_response, ResponseBody};
use nsdiscovery::unicast::constants::{
    MULTIPLEXED_SOCKET, NAMESERVICE_SUBPORT, NS_LOOKUP_REQ_ID, REQ_END_MARKER,
};
use nsdiscovery::unicast::encode_string_value;
use std::collections::HashMap;
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, UdpSocket};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Channel id handed out by every fake member.
pub const FAKE_CHANNEL_ID: [u8; 3] = [0x11, 0x22, 0x33];

/// Open-channel response: 8 header bytes, channel id, end marker.
pub fn channel_open_response() -> Vec<u8> {
    let mut response = vec![0x00, 0x02, 0x02, 0x00, 0x42, 0x00, 0x01, 0x4E];
    response.extend_from_slice(&FAKE_CHANNEL_ID);
    response.push(REQ_END_MARKER);
    response
}

/// Fake NameService on 127.0.0.1 answering string lookups from a fixed map.
pub struct FakeNameService {
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
}

impl FakeNameService {
    /// Start a member of `cluster` binding `values` (full lookup keys).
    pub fn start(cluster: &str, values: &[(&str, &str)]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        Self::serve(listener, cluster, values)
    }

    /// Start on an already-bound listener.
    pub fn serve(listener: TcpListener, cluster: &str, values: &[(&str, &str)]) -> Self {
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));

        let mut map: HashMap<String, String> = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        map.insert("Cluster/name".to_string(), cluster.to_string());
        let map = Arc::new(map);

        let counter = Arc::clone(&connections);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                counter.fetch_add(1, Ordering::SeqCst);
                let map = Arc::clone(&map);
                thread::spawn(move || {
                    let _ = handle_member(stream, &map);
                });
            }
        });

        Self { addr, connections }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Connections accepted so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

fn read_handshake<R: Read>(reader: &mut R) -> nsdiscovery::Result<()> {
    assert_eq!(reader.read_u32::<BigEndian>()?, MULTIPLEXED_SOCKET);
    assert_eq!(reader.read_u32::<BigEndian>()?, NAMESERVICE_SUBPORT);
    read_frame(reader)?;
    read_frame(reader)?;
    Ok(())
}

fn handle_member(stream: TcpStream, values: &HashMap<String, String>) -> nsdiscovery::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);

    read_handshake(&mut reader)?;
    write_frame(&mut writer, &[0x00, 0x01, 0x02, 0x00, 0x42, 0x00, 0x40])?;
    write_frame(&mut writer, &channel_open_response())?;
    writer.flush()?;

    loop {
        let request = read_frame(&mut reader)?;
        let name = parse_lookup_request(&request);

        let mut response = FAKE_CHANNEL_ID.to_vec();
        match values.get(&name) {
            Some(value) => {
                response.push(0x01);
                response.extend_from_slice(&encode_string_value(value));
                response.push(REQ_END_MARKER);
            }
            None => {
                // channel id + 8 bytes: not bound
                response.extend_from_slice(&[0x01, 0, 0, 0, 0, 0, 0, REQ_END_MARKER]);
            }
        }
        write_frame(&mut writer, &response)?;
        writer.flush()?;
    }
}

/// Name carried by a lookup request body.
pub fn parse_lookup_request(request: &[u8]) -> String {
    let header = FAKE_CHANNEL_ID.len() + NS_LOOKUP_REQ_ID.len();
    assert_eq!(&request[..FAKE_CHANNEL_ID.len()], &FAKE_CHANNEL_ID);
    assert_eq!(&request[FAKE_CHANNEL_ID.len()..header], &NS_LOOKUP_REQ_ID);
    assert_eq!(request.last(), Some(&REQ_END_MARKER));

    let mut cursor = Cursor::new(&request[header..]);
    let len = read_packed_int(&mut cursor).unwrap() as usize;
    let mut name = vec![0u8; len];
    cursor.read_exact(&mut name).unwrap();
    String::from_utf8(name).unwrap()
}

/// Server that completes the transport handshake, then answers with the
/// given frames and closes.
pub fn start_scripted_server(frames: Vec<Vec<u8>>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let Ok((stream, _)) = listener.accept() else {
            return;
        };
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;
        if read_handshake(&mut reader).is_err() {
            return;
        }
        for frame in &frames {
            let _ = writer.write_all(frame);
        }
        let _ = writer.flush();
        thread::sleep(Duration::from_millis(500));
    });
    addr
}

/// Member that completes the handshake and then never answers a lookup.
pub fn start_silent_member(hold: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let Ok((stream, _)) = listener.accept() else {
            return;
        };
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = BufWriter::new(stream);
        if read_handshake(&mut reader).is_err() {
            return;
        }
        let _ = write_frame(&mut writer, &[0x01]);
        let _ = write_frame(&mut writer, &channel_open_response());
        let _ = writer.flush();
        thread::sleep(hold);
    });
    addr
}

/// Fake proxy answering one ping frame with `response`. The received request
/// is sent back over the returned channel.
pub fn start_ping_server(response: Vec<u8>) -> (SocketAddr, std::sync::mpsc::Receiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = std::sync::mpsc::channel();
    thread::spawn(move || {
        let Ok((stream, _)) = listener.accept() else {
            return;
        };
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = BufWriter::new(stream);
        let Ok(request) = read_frame(&mut reader) else {
            return;
        };
        let _ = tx.send(request);
        let _ = write_frame(&mut writer, &response);
        let _ = writer.flush();
    });
    (addr, rx)
}

/// Fields of a received discovery request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedRequest {
    pub cluster: String,
    pub attempt: u8,
    pub attempt_limit: u8,
    pub address: Vec<u8>,
    pub port: i32,
    pub name: String,
    pub payload: Vec<u8>,
}

pub fn parse_discovery_request(datagram: &[u8]) -> ReceivedRequest {
    let mut cursor = Cursor::new(datagram);
    assert_eq!(cursor.read_u32::<BigEndian>().unwrap(), 0x0DDF_00DA);
    let cluster = read_utf(&mut cursor).unwrap();
    let attempt = cursor.read_u8().unwrap();
    let attempt_limit = cursor.read_u8().unwrap();
    let addr_len = cursor.read_u8().unwrap() as usize;
    let mut address = vec![0u8; addr_len];
    cursor.read_exact(&mut address).unwrap();
    let port = cursor.read_i32::<BigEndian>().unwrap();
    let name = read_utf(&mut cursor).unwrap();
    let payload_len = cursor.read_i32::<BigEndian>().unwrap() as usize;
    let mut payload = vec![0u8; payload_len];
    cursor.read_exact(&mut payload).unwrap();

    ReceivedRequest {
        cluster,
        attempt,
        attempt_limit,
        address,
        port,
        name,
        payload,
    }
}

/// One answer a fake group sends back for a request.
#[derive(Debug, Clone)]
pub struct Reply {
    pub cluster: String,
    pub responder: Option<SocketAddr>,
    pub name: Option<String>,
    pub body: ResponseBody,
    /// Bytes sent verbatim instead of an encoded response.
    pub raw: Option<Vec<u8>>,
}

impl Reply {
    /// Inline string value.
    pub fn text(cluster: &str, value: &str) -> Self {
        Self {
            cluster: cluster.to_string(),
            responder: None,
            name: None,
            body: ResponseBody::Inline(encode_string_value(value)),
            raw: None,
        }
    }

    /// Result too large for UDP, fetch from `responder`.
    pub fn too_large(cluster: &str, responder: SocketAddr) -> Self {
        Self {
            cluster: cluster.to_string(),
            responder: Some(responder),
            name: None,
            body: ResponseBody::TooLarge,
            raw: None,
        }
    }

    /// Datagram that is not a discovery response at all.
    pub fn garbage(bytes: &[u8]) -> Self {
        Self {
            cluster: String::new(),
            responder: None,
            name: None,
            body: ResponseBody::TooLarge,
            raw: Some(bytes.to_vec()),
        }
    }

    /// Echo a different name than requested.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

/// Fake discovery group: a UDP socket on 127.0.0.1 that skips `ignore`
/// requests, then answers the next one with `replies`, each from a fresh
/// socket. Every received request is forwarded on the returned channel.
pub fn start_group(
    socket: UdpSocket,
    ignore: usize,
    replies: Vec<Reply>,
) -> std::sync::mpsc::Receiver<ReceivedRequest> {
    let (tx, rx) = std::sync::mpsc::channel();
    socket
        .set_read_timeout(Some(Duration::from_secs(10)))
        .unwrap();

    thread::spawn(move || {
        let mut buf = vec![0u8; 65535];
        let mut seen = 0;
        while let Ok((len, src)) = socket.recv_from(&mut buf) {
            let request = parse_discovery_request(&buf[..len]);
            let _ = tx.send(request.clone());
            seen += 1;
            if seen <= ignore {
                continue;
            }

            for reply in &replies {
                let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
                if let Some(raw) = &reply.raw {
                    sender.send_to(raw, src).unwrap();
                    continue;
                }
                let name = reply.name.clone().unwrap_or_else(|| request.name.clone());
                let datagram = encode_response(
                    &reply.cluster,
                    request.attempt,
                    request.attempt_limit,
                    reply.responder,
                    &name,
                    &reply.body,
                )
                .unwrap();
                sender.send_to(&datagram, src).unwrap();
            }
        }
    });
    rx
}

/// Fake discovery group on an ephemeral port.
pub fn start_ephemeral_group(
    ignore: usize,
    replies: Vec<Reply>,
) -> (SocketAddr, std::sync::mpsc::Receiver<ReceivedRequest>) {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap();
    (addr, start_group(socket, ignore, replies))
}

/// Encode a frame into a raw byte vector (length prefix included).
pub fn framed(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    write_frame(&mut out, payload).unwrap();
    out
}
