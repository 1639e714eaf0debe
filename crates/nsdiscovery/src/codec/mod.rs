// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire codecs shared by the unicast, multicast and ping clients.
//!
//! - [`packed`]: variable-length signed integers
//! - [`frame`]: packed-length framed messages over a byte stream
//! - [`data`]: big-endian fields and short strings used in datagrams

pub mod data;
pub mod frame;
pub mod packed;

pub use frame::{read_exact_field, read_frame, read_packed_field, write_frame};
pub use packed::{read_packed_int, write_packed_int};
