// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Ping request frames and known response patterns.
//!
//! | pattern                    | bytes                                  |
//! |----------------------------|----------------------------------------|
//! | current                    | `00 04 02 00 42 00 03 64 40`            |
//! | current, explicit length   | `00 04 02 00 42 00 03 64 02 01 00 40`   |
//! | legacy v1 (no list)        | `00 02 02 00 42 00 03 64 40 40`         |
//! | legacy v2                  | `00 02 02 00 42 00 40`                  |
//! | address list (prefix)      | `00 04 02 00 42 01 4E ...`              |

use crate::codec::frame::{read_exact_field, read_packed_field};
use crate::error::{ProtocolError, Result};
use std::io::Cursor;

/// Liveness probe.
pub const PING_REQUEST: [u8; 7] = [0x00, 0x03, 0x02, 0x00, 0x42, 0x00, 0x40];

/// Liveness probe asking for the proxy's address list.
pub const PING_LIST_REQUEST: [u8; 9] = [0x00, 0x03, 0x02, 0x00, 0x42, 0x01, 0x4E, 0x01, 0x40];

pub const PING_RESPONSE: [u8; 9] = [0x00, 0x04, 0x02, 0x00, 0x42, 0x00, 0x03, 0x64, 0x40];

pub const PING_RESPONSE_EXPLICIT_LEN: [u8; 12] = [
    0x00, 0x04, 0x02, 0x00, 0x42, 0x00, 0x03, 0x64, 0x02, 0x01, 0x00, 0x40,
];

/// Answer of proxies that predate address lists. Also their answer to a list
/// request.
pub const PING_RESPONSE_LEGACY_V1: [u8; 10] =
    [0x00, 0x02, 0x02, 0x00, 0x42, 0x00, 0x03, 0x64, 0x40, 0x40];

pub const PING_RESPONSE_LEGACY_V2: [u8; 7] = [0x00, 0x02, 0x02, 0x00, 0x42, 0x00, 0x40];

/// Start of an address-list response.
pub const LIST_RESPONSE_PREFIX: [u8; 7] = [0x00, 0x04, 0x02, 0x00, 0x42, 0x01, 0x4E];

/// Marker byte opening the embedded address collection.
pub const COLLECTION_MARKER: u8 = 0x55;

const EXACT_PATTERNS: [&[u8]; 4] = [
    &PING_RESPONSE,
    &PING_RESPONSE_EXPLICIT_LEN,
    &PING_RESPONSE_LEGACY_V1,
    &PING_RESPONSE_LEGACY_V2,
];

/// True if `response` is one of the known "alive" answers.
pub fn classify(response: &[u8]) -> bool {
    EXACT_PATTERNS.iter().any(|p| *p == response) || is_list_response(response)
}

pub fn is_list_response(response: &[u8]) -> bool {
    response.starts_with(&LIST_RESPONSE_PREFIX)
}

pub fn is_legacy_no_list(response: &[u8]) -> bool {
    response == PING_RESPONSE_LEGACY_V1
}

/// Decode the address list of a list response.
///
/// A response without a collection marker carries no addresses; one that
/// ends inside the collection fails with [`ProtocolError::Truncated`].
pub fn decode_address_list(response: &[u8]) -> Result<Vec<String>> {
    let body = response.get(LIST_RESPONSE_PREFIX.len()..).unwrap_or_default();
    let Some(start) = body.iter().position(|&b| b == COLLECTION_MARKER) else {
        return Ok(Vec::new());
    };

    let mut cursor = Cursor::new(&body[start + 1..]);
    let count = read_packed_field(&mut cursor)?;
    if count < 0 {
        return Err(ProtocolError::NegativeLength(count).into());
    }

    let mut addresses = Vec::with_capacity(count.min(64) as usize);
    for _ in 0..count {
        // element type tag
        read_exact_field(&mut cursor, &mut [0u8; 1])?;
        let len = read_packed_field(&mut cursor)?;
        if len < 0 {
            return Err(ProtocolError::NegativeLength(len).into());
        }
        let mut bytes = vec![0u8; len as usize];
        read_exact_field(&mut cursor, &mut bytes)?;
        let address = String::from_utf8(bytes).map_err(|e| {
            ProtocolError::Malformed(format!("invalid UTF-8 in address: {}", e))
        })?;
        addresses.push(address);
    }
    Ok(addresses)
}

/// Build an address-list response. Used by test proxies.
pub fn encode_list_response(addresses: &[&str]) -> Vec<u8> {
    use crate::codec::packed::encode_packed_int;

    let mut out = LIST_RESPONSE_PREFIX.to_vec();
    out.push(COLLECTION_MARKER);
    out.extend_from_slice(&encode_packed_int(addresses.len() as i32));
    for address in addresses {
        out.push(0x4E);
        out.extend_from_slice(&encode_packed_int(address.len() as i32));
        out.extend_from_slice(address.as_bytes());
    }
    out.push(0x40);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_known_patterns_are_alive() {
        assert!(classify(&PING_RESPONSE));
        assert!(classify(&PING_RESPONSE_EXPLICIT_LEN));
        assert!(classify(&PING_RESPONSE_LEGACY_V1));
        assert!(classify(&PING_RESPONSE_LEGACY_V2));
        assert!(classify(&LIST_RESPONSE_PREFIX));
        assert!(classify(&encode_list_response(&["10.0.0.1:9099"])));
    }

    #[test]
    fn test_unknown_patterns_are_not_alive() {
        assert!(!classify(&[]));
        assert!(!classify(&[0x00]));
        assert!(!classify(&PING_REQUEST));
        assert!(!classify(&PING_RESPONSE[..8]));
        let mut extended = PING_RESPONSE.to_vec();
        extended.push(0x00);
        assert!(!classify(&extended));
    }

    #[test]
    fn test_decode_address_list() {
        let response = encode_list_response(&["10.0.0.1:9099", "10.0.0.2:9099"]);
        let addresses = decode_address_list(&response).unwrap();
        assert_eq!(addresses, vec!["10.0.0.1:9099", "10.0.0.2:9099"]);
    }

    #[test]
    fn test_decode_skips_header_bytes() {
        let mut response = LIST_RESPONSE_PREFIX.to_vec();
        response.extend_from_slice(&[0x01, 0x02]);
        response.extend_from_slice(&encode_list_response(&["h:1"])[LIST_RESPONSE_PREFIX.len()..]);
        assert_eq!(decode_address_list(&response).unwrap(), vec!["h:1"]);
    }

    #[test]
    fn test_decode_without_marker() {
        assert!(decode_address_list(&LIST_RESPONSE_PREFIX).unwrap().is_empty());
    }

    #[test]
    fn test_decode_truncated_list() {
        let mut response = encode_list_response(&["10.0.0.1:9099"]);
        response.truncate(response.len() - 5);
        assert!(matches!(
            decode_address_list(&response).unwrap_err(),
            Error::Protocol(ProtocolError::Truncated {
                expected: 13,
                actual: 9
            })
        ));

        // marker present, element count missing
        let mut response = LIST_RESPONSE_PREFIX.to_vec();
        response.push(COLLECTION_MARKER);
        assert!(matches!(
            decode_address_list(&response).unwrap_err(),
            Error::Protocol(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn test_legacy_detection() {
        assert!(is_legacy_no_list(&PING_RESPONSE_LEGACY_V1));
        assert!(!is_legacy_no_list(&PING_RESPONSE));
    }
}
