// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Unicast (TCP) NameService client.
//!
//! - [`Connection`]: handshake and named lookups on one member
//! - [`open_cluster`]: follow foreign-cluster redirects to the right member
//! - [`LookupResult`]: absent / text / raw payload

pub mod constants;
mod connection;
mod resolver;
mod result;

pub use connection::{ChannelHandle, Connection, ConnectionState, ShutdownHandle};
pub use resolver::{foreign_port_key, open_cluster};
pub use result::{encode_string_value, read_string, LookupResult, PayloadStream, STRING_TYPE_TAG};
