// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Length-prefix framing for NameService messages over TCP.
//!
//! ```text
//! +---------------------+-------------------+
//! | Length (packed int) | Message payload   |
//! +---------------------+-------------------+
//! ```
//!
//! The length is a packed integer (see [`super::packed`]). Zero and negative
//! lengths are never valid: writing an empty payload is rejected up front and
//! reading one fails with [`ProtocolError::EmptyFrame`].

use super::packed::{read_packed_int, write_packed_int};
use crate::error::{ProtocolError, Result};
use std::io::{self, Read, Write};

/// Default maximum frame size accepted from a peer (16 MB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Write one frame: packed length followed by the payload bytes.
///
/// The caller is responsible for flushing buffered writers.
pub fn write_frame<W: Write + ?Sized>(writer: &mut W, payload: &[u8]) -> Result<()> {
    if payload.is_empty() {
        return Err(ProtocolError::EmptyFrame.into());
    }
    let len = i32::try_from(payload.len()).map_err(|_| {
        ProtocolError::Malformed(format!("frame of {} bytes is too large", payload.len()))
    })?;

    write_packed_int(writer, len)?;
    writer.write_all(payload)?;
    Ok(())
}

/// Read one frame with the default size limit.
pub fn read_frame<R: Read + ?Sized>(reader: &mut R) -> Result<Vec<u8>> {
    read_frame_limited(reader, DEFAULT_MAX_FRAME_SIZE)
}

/// Read one frame, rejecting announced lengths above `max_size`.
pub fn read_frame_limited<R: Read + ?Sized>(reader: &mut R, max_size: usize) -> Result<Vec<u8>> {
    let len = read_packed_field(reader)?;

    if len < 0 {
        return Err(ProtocolError::NegativeLength(len).into());
    }
    if len == 0 {
        return Err(ProtocolError::EmptyFrame.into());
    }

    let len = len as usize;
    if len > max_size {
        return Err(ProtocolError::Malformed(format!(
            "message too large: {} > {}",
            len, max_size
        ))
        .into());
    }

    let mut buf = vec![0u8; len];
    read_exact_field(reader, &mut buf)?;

    log::trace!("[FRAME] read {} bytes", len);
    Ok(buf)
}

/// Read a packed integer field of a message.
///
/// Running out of input is [`ProtocolError::Truncated`], not an I/O error.
pub fn read_packed_field<R: Read + ?Sized>(reader: &mut R) -> Result<i32> {
    match read_packed_int(reader) {
        Ok(value) => Ok(value),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(ProtocolError::Truncated {
            expected: 1,
            actual: 0,
        }
        .into()),
        Err(e) => Err(e.into()),
    }
}

/// Fill `buf` from a message, failing with [`ProtocolError::Truncated`] if
/// the input ends first.
pub fn read_exact_field<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    let actual = read_full(reader, buf)?;
    if actual < buf.len() {
        return Err(ProtocolError::Truncated {
            expected: buf.len(),
            actual,
        }
        .into());
    }
    Ok(())
}

/// Fill `buf` as far as the stream allows, returning the byte count.
fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
