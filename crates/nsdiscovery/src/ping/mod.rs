// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Proxy liveness checks.
//!
//! [`ping`] sends a fixed probe frame and matches the answer against known
//! byte patterns; [`ns_lookup`] asks the NameService instead.

mod client;
pub mod patterns;

pub use client::{ns_lookup, ping, PingOutcome};
pub use patterns::classify;
