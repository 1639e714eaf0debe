// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! NameService wire constants.
//!
//! These byte sequences were captured from a cluster member's own TCP
//! initiator and must match byte for byte. They are protocol-version
//! specific; do not reformat them.

/// Protocol identifier selecting multiplexed-socket framing.
pub const MULTIPLEXED_SOCKET: u32 = 0x5AC1_E000;

/// Well-known sub-port of the NameService on a multiplexed socket.
pub const NAMESERVICE_SUBPORT: u32 = 3;

/// Packed-integer encoding of -1; terminates a complex value.
pub const REQ_END_MARKER: u8 = 0x40;

/// Offset of the channel id inside the open-channel response.
pub const CHANNEL_ID_OFFSET: usize = 8;

/// Trailing bytes after the channel id in the open-channel response.
pub const CHANNEL_ID_TRAILER: usize = 1;

/// Response length (beyond channel id + 1) that means "name not bound".
pub const ABSENT_RESPONSE_EXTRA: usize = 7;

/// Open-connection request frame.
pub const CONN_OPEN: [u8; 212] = [
    0x00, 0x01, 0x02, 0x00, 0x42, 0x00, 0x01, 0x0E, 0x00, 0x00, 0x42, 0xA6,
    0xB6, 0x9F, 0xDE, 0xB2, 0x51, 0x01, 0x41, 0xE3, 0xF3, 0xE4, 0xDD, 0x0F,
    0x02, 0x41, 0x8F, 0xF6, 0xBA, 0x99, 0x01, 0x03, 0x41, 0xF8, 0xB4, 0xE5,
    0xF2, 0x04, 0x04, 0x41, 0xC4, 0xFE, 0xDC, 0xF5, 0x05, 0x05, 0x41, 0xD7,
    0xCE, 0xC3, 0x8D, 0x07, 0x06, 0x41, 0xDB, 0x89, 0xDC, 0xD5, 0x0A, 0x40,
    0x02, 0x6E, 0x03, 0x5D, 0x4E, 0x57, 0x02, 0x11, 0x4D, 0x65, 0x73, 0x73,
    0x61, 0x67, 0x69, 0x6E, 0x67, 0x50, 0x72, 0x6F, 0x74, 0x6F, 0x63, 0x6F,
    0x6C, 0x02, 0x41, 0x02, 0x41, 0x02, 0x13, 0x4E, 0x61, 0x6D, 0x65, 0x53,
    0x65, 0x72, 0x76, 0x69, 0x63, 0x65, 0x50, 0x72, 0x6F, 0x74, 0x6F, 0x63,
    0x6F, 0x6C, 0x02, 0x41, 0x01, 0x41, 0x01, 0x05, 0xA0, 0x02, 0x00, 0x00,
    0x0E, 0x00, 0x00, 0x42, 0xAE, 0x89, 0x9E, 0xDE, 0xB2, 0x51, 0x01, 0x41,
    0x81, 0x80, 0x80, 0xF0, 0x0F, 0x05, 0x41, 0x98, 0x9F, 0x81, 0x80, 0x08,
    0x06, 0x41, 0x93, 0x9E, 0x01, 0x40, 0x01, 0x6A, 0x02, 0x6E, 0x03, 0x6A,
    0x04, 0x71, 0x05, 0x71, 0x06, 0x4E, 0x08, 0x43, 0x6C, 0x75, 0x73, 0x74,
    0x65, 0x72, 0x42, 0x09, 0x4E, 0x09, 0x6C, 0x6F, 0x63, 0x61, 0x6C, 0x68,
    0x6F, 0x73, 0x74, 0x0A, 0x4E, 0x05, 0x32, 0x30, 0x32, 0x33, 0x33, 0x0C,
    0x4E, 0x10, 0x43, 0x6F, 0x68, 0x65, 0x72, 0x65, 0x6E, 0x63, 0x65, 0x43,
    0x6F, 0x6E, 0x73, 0x6F, 0x6C, 0x65, 0x40, 0x40,
];

/// Open-channel request frame for the NameService protocol.
pub const CHANNEL_OPEN: [u8; 43] = [
    0x00, 0x0B, 0x02, 0x00, 0x42, 0x01, 0x01, 0x4E, 0x13, 0x4E, 0x61, 0x6D,
    0x65, 0x53, 0x65, 0x72, 0x76, 0x69, 0x63, 0x65, 0x50, 0x72, 0x6F, 0x74,
    0x6F, 0x63, 0x6F, 0x6C, 0x02, 0x4E, 0x0B, 0x4E, 0x61, 0x6D, 0x65, 0x53,
    0x65, 0x72, 0x76, 0x69, 0x63, 0x65, 0x40,
];

/// Request id tag written after the channel id of every lookup.
pub const NS_LOOKUP_REQ_ID: [u8; 7] = [0x01, 0x01, 0x00, 0x42, 0x00, 0x01, 0x4E];
