// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Multicast (datagram) cluster discovery.

pub mod attempt;
mod client;
pub mod packet;

pub use attempt::{next_attempt, DiscoveryAttempt, RetrySchedule, DEFAULT_ATTEMPT_DELAY};
pub use client::{MulticastClient, DEFAULT_GROUP_ADDR, DEFAULT_PORT, DEFAULT_TIMEOUT, DEFAULT_TTL};
pub use packet::{DiscoveryResponse, RequestPacket, ResponseBody, DISCOVERY_MAGIC};
