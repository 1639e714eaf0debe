// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Packed signed integer encoding.
//!
//! Every length and most integers on the NameService wire use this form.
//!
//! # Encoding Rules
//!
//! - Negative values set the sign bit and encode `!n` (one's complement)
//! - First byte: bit 7 continuation, bit 6 sign, bits 0-5 data
//! - Following bytes: bit 7 continuation, bits 0-6 data
//! - Data is emitted least-significant group first
//!
//! ```text
//! Value 300 = 0b1_0010_1100
//!   Byte 0: 0b1_0_101100 = 0xAC  (low 6 bits, continuation=1, sign=0)
//!   Byte 1: 0b0_0000100  = 0x04  (next 7 bits, continuation=0)
//!
//! Value -1  -> sign=1, !(-1) = 0 -> single byte 0x40
//! ```
//!
//! # Examples
//!
//! ```
//! use nsdiscovery::codec::packed::{encode_packed_int, read_packed_int};
//!
//! let bytes = encode_packed_int(300);
//! assert_eq!(bytes, vec![0xAC, 0x04]);
//!
//! let value = read_packed_int(&mut bytes.as_slice()).unwrap();
//! assert_eq!(value, 300);
//! ```

use std::io::{self, Read, Write};

/// Maximum bytes needed to encode an `i32` (6 + 4 * 7 >= 32 bits).
pub const MAX_PACKED_LEN: usize = 5;

/// Continuation bit, present in every byte.
const CONTINUATION_BIT: u8 = 0x80;

/// Sign bit, first byte only.
const SIGN_BIT: u8 = 0x40;

/// Data bits of the first byte.
const FIRST_DATA_MASK: u8 = 0x3F;

/// Data bits of the following bytes.
const DATA_MASK: u8 = 0x7F;

/// Encode `n` into `buf`, returning the number of bytes written (1-5).
///
/// # Panics
///
/// Panics if `buf` is shorter than [`packed_int_len`] of `n`.
#[inline]
pub fn encode_packed_int_into(n: i32, buf: &mut [u8]) -> usize {
    let (mut byte, mut rest) = if n < 0 {
        (SIGN_BIT, !n as u32)
    } else {
        (0u8, n as u32)
    };

    byte |= (rest as u8) & FIRST_DATA_MASK;
    rest >>= 6;

    let mut i = 0;
    while rest != 0 {
        buf[i] = byte | CONTINUATION_BIT;
        i += 1;
        byte = (rest as u8) & DATA_MASK;
        rest >>= 7;
    }
    buf[i] = byte;
    i + 1
}

/// Encode `n` into a freshly allocated vector.
pub fn encode_packed_int(n: i32) -> Vec<u8> {
    let mut buf = [0u8; MAX_PACKED_LEN];
    let len = encode_packed_int_into(n, &mut buf);
    buf[..len].to_vec()
}

/// Number of bytes [`encode_packed_int_into`] produces for `n`.
#[must_use]
pub const fn packed_int_len(n: i32) -> usize {
    let magnitude = if n < 0 { !n as u32 } else { n as u32 };
    let bits = 32 - magnitude.leading_zeros() as usize;
    if bits <= 6 {
        1
    } else {
        1 + (bits - 6).div_ceil(7)
    }
}

/// Write a packed integer to a stream.
pub fn write_packed_int<W: Write + ?Sized>(writer: &mut W, n: i32) -> io::Result<()> {
    let mut buf = [0u8; MAX_PACKED_LEN];
    let len = encode_packed_int_into(n, &mut buf);
    writer.write_all(&buf[..len])
}

/// Read a packed integer from a stream.
///
/// Data bits past the 32nd are dropped. A stream that ends mid-integer
/// yields `UnexpectedEof`; the framing layer above turns that into a
/// protocol error where it matters.
pub fn read_packed_int<R: Read + ?Sized>(reader: &mut R) -> io::Result<i32> {
    let mut byte = read_u8(reader)?;
    let negative = byte & SIGN_BIT != 0;
    let mut value = u32::from(byte & FIRST_DATA_MASK);
    let mut shift = 6u32;

    while byte & CONTINUATION_BIT != 0 {
        byte = read_u8(reader)?;
        value |= u32::from(byte & DATA_MASK)
            .checked_shl(shift)
            .unwrap_or(0);
        shift += 7;
    }

    let value = value as i32;
    Ok(if negative { !value } else { value })
}

fn read_u8<R: Read + ?Sized>(reader: &mut R) -> io::Result<u8> {
    let mut b = [0u8; 1];
    reader.read_exact(&mut b)?;
    Ok(b[0])
}
