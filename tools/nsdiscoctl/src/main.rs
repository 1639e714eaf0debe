// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! nsdiscoctl - NameService lookups and proxy health checks
//!
//! # Usage
//!
//! ```bash
//! # Cluster/info of every cluster on the default multicast group
//! nsdiscoctl lookup
//!
//! # JMX URL of cluster "prod" through a known member
//! nsdiscoctl lookup --host 10.0.0.5 --cluster prod --name management/JMXServiceURL
//!
//! # Ping a proxy and list its addresses
//! nsdiscoctl ping --host 10.0.0.5 --port 9099 --list
//! ```
//!
//! Exit codes: 0 success, 1 transport or protocol failure, 2 cluster or name
//! not found, 3 endpoint not alive, 64 usage or configuration error.

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use nsdiscovery::lookup::{cluster_names, datagram_lookup, lookup_in_cluster, NS_STRING_PREFIX};
use nsdiscovery::{open_cluster, LookupConfig, MulticastClient, PingOutcome};
use std::collections::BTreeSet;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

const EXIT_FAILURE: i32 = 1;
const EXIT_NOT_FOUND: i32 = 2;
const EXIT_NOT_ALIVE: i32 = 3;
const EXIT_USAGE: i32 = 64;

/// NameService discovery client
#[derive(Parser, Debug)]
#[command(name = "nsdiscoctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up a NameService value, over multicast or through a known member
    Lookup(LookupArgs),
    /// Check that a proxy endpoint is alive
    Ping(PingArgs),
}

#[derive(Args, Debug)]
struct LookupArgs {
    /// Cluster address, unicast or multicast [default: 239.192.0.0]
    #[arg(long)]
    host: Option<String>,

    /// Cluster port [default: 7574]
    #[arg(short, long)]
    port: Option<u16>,

    /// Local IP to issue multicast requests on
    #[arg(long)]
    local: Option<IpAddr>,

    /// Multicast TTL [default: 4]
    #[arg(long)]
    ttl: Option<u32>,

    /// Cluster name (all clusters when omitted)
    #[arg(short, long)]
    cluster: Option<String>,

    /// Name to look up [default: Cluster/info]
    #[arg(short, long)]
    name: Option<String>,

    /// Lookup timeout in seconds [default: 5]
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Configuration file (JSON format)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PingArgs {
    /// Proxy host (NameService host with --service)
    #[arg(long)]
    host: String,

    /// Proxy port (NameService port with --service)
    #[arg(short, long)]
    port: u16,

    /// Timeout in seconds
    #[arg(short, long, default_value = "5")]
    timeout: u64,

    /// Request the proxy's address list
    #[arg(long)]
    list: bool,

    /// Cluster of the proxy service
    #[arg(short, long)]
    cluster: Option<String>,

    /// Check this proxy service through the NameService instead
    #[arg(long)]
    service: Option<String>,
}

/// Error with a chosen exit code.
#[derive(Debug)]
struct Exit(i32);

impl std::fmt::Display for Exit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "exit {}", self.0)
    }
}

impl std::error::Error for Exit {}

fn main() {
    let cli = Cli::parse();

    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    // try_init also forwards the library's `log` records
    if let Err(e) = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("Warning: logging unavailable: {}", e);
    }

    let result = match &cli.command {
        Command::Lookup(args) => run_lookup(args),
        Command::Ping(args) => run_ping(args),
    };

    if let Err(e) = result {
        let code = exit_code(&e);
        if code != EXIT_NOT_ALIVE {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(code);
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(Exit(code)) = cause.downcast_ref::<Exit>() {
            return *code;
        }
        if cause.downcast_ref::<nsdiscovery::ConfigError>().is_some() {
            return EXIT_USAGE;
        }
        if let Some(e) = cause.downcast_ref::<nsdiscovery::Error>() {
            return match e {
                nsdiscovery::Error::Config(_) => EXIT_USAGE,
                e if e.is_not_found() => EXIT_NOT_FOUND,
                _ => EXIT_FAILURE,
            };
        }
    }
    EXIT_FAILURE
}

impl LookupArgs {
    fn to_config(&self) -> anyhow::Result<LookupConfig> {
        let mut config = match &self.config {
            Some(path) => {
                debug!("Loading config from {:?}", path);
                LookupConfig::from_file(path)?
            }
            None => LookupConfig::default(),
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.local.is_some() {
            config.local = self.local;
        }
        if let Some(ttl) = self.ttl {
            config.ttl = ttl;
        }
        if self.cluster.is_some() {
            config.cluster = self.cluster.clone();
        }
        if let Some(name) = &self.name {
            config.name = name.clone();
        }
        if let Some(secs) = self.timeout {
            config.timeout_ms = secs.saturating_mul(1000);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Every address `host` stands for; `localhost` means every local interface.
fn resolve_host(host: &str, port: u16) -> anyhow::Result<Vec<SocketAddr>> {
    let mut addrs = BTreeSet::new();

    if host == "localhost" {
        let interfaces =
            local_ip_address::list_afinet_netifas().context("listing local interfaces")?;
        for (_name, ip) in interfaces {
            addrs.insert(SocketAddr::new(ip, port));
        }
    } else {
        let resolved = (host, port)
            .to_socket_addrs()
            .with_context(|| format!("resolving {}", host))?;
        addrs.extend(resolved);
    }

    if addrs.is_empty() {
        return Err(anyhow!("{} did not resolve to any address", host));
    }
    Ok(addrs.into_iter().collect())
}

fn run_lookup(args: &LookupArgs) -> anyhow::Result<()> {
    let config = args.to_config()?;
    let name = format!("{}{}", NS_STRING_PREFIX, config.name);
    let addrs = resolve_host(&config.host, config.port)?;

    let mut last_err = None;
    for addr in addrs {
        match lookup_at(&config, addr, &name) {
            Ok(()) => return Ok(()),
            Err(e) => {
                debug!("Lookup via {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }

    let err = last_err.unwrap_or_else(|| anyhow!("no address to query"));
    Err(err.context(format!(
        "while querying {}:{} for {}",
        config.host, config.port, config.name
    )))
}

fn lookup_at(config: &LookupConfig, addr: SocketAddr, name: &str) -> anyhow::Result<()> {
    let cluster = config.cluster.as_deref();

    if addr.ip().is_multicast() {
        let client = MulticastClient::new(addr)
            .with_local_interface(config.local)
            .with_timeout(config.timeout())
            .with_ttl(config.ttl);

        datagram_lookup(&client, cluster, name, None, |found, value| {
            let value = value.unwrap_or_default();
            if cluster.is_some() {
                println!("{}", value);
            } else {
                println!("Cluster {}:\t{}", found, value);
            }
        })?;
        return Ok(());
    }

    let timeout = config.timeout();
    let mut conn = open_cluster(cluster, addr, timeout)?;

    if cluster.is_some() {
        let value = conn.lookup(name)?;
        conn.close()?;
        println!("{}", value.unwrap_or_default());
        return Ok(());
    }

    let clusters = cluster_names(&mut conn)?;
    conn.close()?;
    for found in clusters {
        let value = lookup_in_cluster(Some(&found), name, addr, timeout)?;
        println!("Cluster {}:\t{}", found, value.unwrap_or_default());
    }
    Ok(())
}

fn run_ping(args: &PingArgs) -> anyhow::Result<()> {
    let timeout = Duration::from_secs(args.timeout);
    let addr = resolve_host(&args.host, args.port)?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("{} did not resolve to any address", args.host))?;

    let outcome = match &args.service {
        Some(service) => nsdiscovery::ns_lookup(addr, args.cluster.as_deref(), service, timeout)?,
        None => nsdiscovery::ping(addr, timeout, args.list)?,
    };

    print_outcome(addr, &outcome);
    if outcome.alive {
        Ok(())
    } else {
        Err(Exit(EXIT_NOT_ALIVE).into())
    }
}

fn print_outcome(addr: SocketAddr, outcome: &PingOutcome) {
    println!(
        "{} is {}",
        addr,
        if outcome.alive { "alive" } else { "not alive" }
    );
    if let Some(addresses) = &outcome.addresses {
        for address in addresses {
            println!("  {}", address);
        }
    }
    if let Some(checksum) = outcome.checksum {
        println!("  crc32: 0x{:08x}", checksum);
    }
}
