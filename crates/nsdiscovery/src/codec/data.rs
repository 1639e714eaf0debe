// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Big-endian field helpers for the discovery datagram.
//!
//! The datagram uses fixed-width big-endian integers and strings prefixed
//! with a 2-byte big-endian length:
//!
//! ```text
//! +---------------+----------------------+
//! | Length (2B BE)| UTF-8 bytes          |
//! +---------------+----------------------+
//! ```
//!
//! Cluster and NameService names are plain text, so standard UTF-8 is
//! byte-identical to the modified UTF-8 the cluster writes for them.

use crate::error::{ProtocolError, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// Write a 2-byte-length-prefixed UTF-8 string.
pub fn write_utf<W: Write + ?Sized>(writer: &mut W, s: &str) -> Result<()> {
    let len = u16::try_from(s.len()).map_err(|_| ProtocolError::StringTooLong(s.len()))?;
    writer.write_u16::<BigEndian>(len)?;
    writer.write_all(s.as_bytes())?;
    Ok(())
}

/// Read a 2-byte-length-prefixed UTF-8 string.
pub fn read_utf<R: Read + ?Sized>(reader: &mut R) -> Result<String> {
    let len = reader.read_u16::<BigEndian>()? as usize;
    let bytes = read_bytes(reader, len)?;
    String::from_utf8(bytes)
        .map_err(|e| ProtocolError::Malformed(format!("invalid UTF-8 string: {}", e)).into())
}

/// Read exactly `len` bytes.
pub fn read_bytes<R: Read + ?Sized>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
