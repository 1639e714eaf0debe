// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Lookup results and string payload decoding.
//!
//! A bound value travels as a serialized payload:
//!
//! ```text
//! +----------------+-------------+----------------------+-------------+
//! | Length (4B BE) | Type (2B)   | Byte count (packed)  | UTF-8 bytes |
//! +----------------+-------------+----------------------+-------------+
//! ```
//!
//! A length of zero means the name is bound to nothing. The type tag is not
//! checked: only string values are requested in string form, everything else
//! is handed back raw for the caller to decode.

use crate::codec::frame::{read_exact_field, read_packed_field};
use crate::codec::packed::encode_packed_int;
use crate::error::{ProtocolError, Result};
use byteorder::{BigEndian, ByteOrder};
use std::io::{Cursor, Read};

/// Type tag of a string value.
pub const STRING_TYPE_TAG: u16 = 0x004E;

/// Raw payload positioned past the response framing.
pub type PayloadStream = Cursor<Vec<u8>>;

/// Outcome of a NameService lookup.
#[derive(Debug)]
pub enum LookupResult {
    /// Name is not bound.
    Absent,
    /// Value decoded as a string.
    Text(String),
    /// Undecoded payload for callers with their own decoding.
    Raw(PayloadStream),
}

impl LookupResult {
    /// True when the name was not bound.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Decode a raw payload as a string value.
    ///
    /// `Text` and `Absent` pass through unchanged; a raw payload whose
    /// length field is zero becomes `Absent`.
    pub fn decode(self) -> Result<Self> {
        match self {
            Self::Raw(mut stream) => Ok(match read_string(&mut stream)? {
                Some(text) => Self::Text(text),
                None => Self::Absent,
            }),
            other => Ok(other),
        }
    }

    /// Decode and return the string value, if any.
    pub fn into_text(self) -> Result<Option<String>> {
        match self.decode()? {
            Self::Text(text) => Ok(Some(text)),
            _ => Ok(None),
        }
    }

    /// Raw payload, if this result carries one.
    pub fn into_raw(self) -> Option<PayloadStream> {
        match self {
            Self::Raw(stream) => Some(stream),
            _ => None,
        }
    }
}

/// Read a string value from a payload stream.
///
/// Returns `Ok(None)` when the payload length field is zero. A payload that
/// ends early fails with [`ProtocolError::Truncated`].
pub fn read_string<R: Read + ?Sized>(reader: &mut R) -> Result<Option<String>> {
    let mut result_len = [0u8; 4];
    read_exact_field(reader, &mut result_len)?;
    if BigEndian::read_i32(&result_len) == 0 {
        return Ok(None);
    }

    // type tag, always a string for NameService string lookups
    read_exact_field(reader, &mut [0u8; 2])?;

    let len = read_packed_field(reader)?;
    if len < 0 {
        return Err(ProtocolError::NegativeLength(len).into());
    }

    let mut bytes = vec![0u8; len as usize];
    read_exact_field(reader, &mut bytes)?;

    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| ProtocolError::Malformed(format!("invalid UTF-8 in value: {}", e)).into())
}

/// Encode a string value the way the NameService does.
///
/// Used by fake servers in tests and by tools that replay captured traffic.
pub fn encode_string_value(value: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(value.len() + 8);
    // string type tag as written by the cluster
    body.extend_from_slice(&STRING_TYPE_TAG.to_be_bytes());
    body.extend_from_slice(&encode_packed_int(value.len() as i32));
    body.extend_from_slice(value.as_bytes());

    let mut out = Vec::with_capacity(body.len() + 4);
    out.extend_from_slice(&(body.len() as i32).to_be_bytes());
    out.extend_from_slice(&body);
    out
}
