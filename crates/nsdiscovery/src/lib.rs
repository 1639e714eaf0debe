// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! NameService Discovery Client
//!
//! Locate cluster members and read the values they publish in their
//! NameService:
//! - Unicast: TCP lookup on a known member, following foreign-cluster
//!   redirects to the requested cluster
//! - Multicast: datagram lookup across every cluster listening on a group,
//!   with retransmission and TCP fallback for large results
//! - Ping: liveness check of a proxy endpoint
//!
//! # Quick Start
//!
//! ```no_run
//! use nsdiscovery::lookup::{lookup_in_cluster, CLUSTER_INFO};
//! use std::time::Duration;
//!
//! let addr = "10.0.0.5:7574".parse().unwrap();
//! let info = lookup_in_cluster(Some("prod"), CLUSTER_INFO, addr, Duration::from_secs(5))?;
//! println!("{:?}", info);
//! # Ok::<(), nsdiscovery::Error>(())
//! ```
//!
//! ```bash
//! # Ask every cluster on the default group for its description
//! nsdiscoctl lookup
//!
//! # Check a proxy and list its peers
//! nsdiscoctl ping --host 10.0.0.5 --port 9099 --list
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod lookup;
pub mod multicast;
pub mod ping;
pub mod unicast;

pub use config::{ConfigError, LookupConfig};
pub use error::{DiscoveryError, Error, ProtocolError, Result};
pub use multicast::MulticastClient;
pub use ping::{ns_lookup, ping, PingOutcome};
pub use unicast::{open_cluster, Connection, LookupResult};
