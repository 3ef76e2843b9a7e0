//! verdant-qr - Display a QR code that opens the AR plant viewer
//!
//! Finds the LAN address a phone is most likely to reach, asks the daemon's
//! `/api/health` whether the viewer is being served there, and prints the
//! viewer link as a QR code.

use std::collections::HashSet;
use std::fmt;
use std::net::Ipv4Addr;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use network_interface::{Addr, NetworkInterface, NetworkInterfaceConfig};
use qrcode::render::unicode::Dense1x2;
use qrcode::QrCode;
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "verdant-qr")]
#[command(about = "Display QR code for opening the Verdant AR viewer")]
#[command(version)]
struct Args {
    /// Daemon port
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Link to https (phones only start AR sessions on secure origins)
    #[arg(long)]
    https: bool,

    /// Use this address instead of picking one
    #[arg(long)]
    host: Option<Ipv4Addr>,

    /// Skip daemon availability check
    #[arg(long)]
    no_check: bool,

    /// Show URL only (no QR code)
    #[arg(long)]
    url_only: bool,
}

/// Where a phone should point its browser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ViewerLink {
    https: bool,
    host: Ipv4Addr,
    port: u16,
}

impl ViewerLink {
    fn health_url(&self) -> String {
        format!("{}api/health", self)
    }
}

impl fmt::Display for ViewerLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.https { "https" } else { "http" };
        write!(f, "{}://{}:{}/", scheme, self.host, self.port)
    }
}

/// Body of the daemon's `/api/health`
#[derive(Debug, Deserialize)]
struct Health {
    version: String,
    plants: usize,
    #[serde(default)]
    models_missing: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let candidates = local_ipv4s();
    let Some(host) = args.host.or_else(|| pick_best_ip(&candidates)) else {
        eprintln!("Error: No network interfaces found");
        return ExitCode::FAILURE;
    };
    let link = ViewerLink {
        https: args.https,
        host,
        port: args.port,
    };

    if !args.no_check {
        print!("Checking daemon at {}... ", link);
        match check_daemon(&link).await {
            Ok(Some(health)) => {
                println!("OK (verdant {}, {} plants)", health.version, health.plants);
                for key in &health.models_missing {
                    println!("  warning: no model file for '{}'", key);
                }
            }
            Ok(None) => {
                println!("NOT RESPONDING");
                eprintln!("\nVerdant daemon is not running at {}", link);
                eprintln!("Start it with: verdant");
                return ExitCode::FAILURE;
            }
            Err(e) => {
                println!("ERROR");
                eprintln!("\nFailed to check daemon: {:#}", e);
                eprintln!("Use --no-check to skip this check");
                return ExitCode::FAILURE;
            }
        }
    }

    println!();
    println!("=== Verdant AR Viewer ===");
    println!();
    println!("Viewer URL: {}", link);
    if !link.https {
        println!("Note: phones only start AR sessions over HTTPS; configure [daemon.tls] and pass --https");
    }

    if args.url_only {
        return ExitCode::SUCCESS;
    }

    match QrCode::new(link.to_string()) {
        Ok(code) => {
            println!();
            println!("{}", render_qr_terminal(&code));
            println!();
            println!("Scan the QR code with your phone, pick a plant, then tap the screen to start AR.");
        }
        Err(e) => {
            eprintln!("Failed to generate QR code: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let others: Vec<_> = candidates.iter().filter(|ip| **ip != host).collect();
    if !others.is_empty() {
        println!();
        println!("Other addresses on this machine:");
        for ip in others {
            println!("  {}", ViewerLink { host: *ip, ..link });
        }
    }

    ExitCode::SUCCESS
}

/// Non-loopback IPv4 addresses of every interface
fn local_ipv4s() -> Vec<Ipv4Addr> {
    let Ok(interfaces) = NetworkInterface::show() else {
        return Vec::new();
    };
    let ips = interfaces
        .into_iter()
        .flat_map(|iface| iface.addr)
        .filter_map(|addr| match addr {
            Addr::V4(v4) if !v4.ip.is_loopback() => Some(v4.ip),
            _ => None,
        })
        .collect();
    unique_in_order(ips)
}

/// Drop repeated addresses, keeping the first occurrence
fn unique_in_order(mut ips: Vec<Ipv4Addr>) -> Vec<Ipv4Addr> {
    let mut seen = HashSet::new();
    ips.retain(|ip| seen.insert(*ip));
    ips
}

/// Lower is more likely to be the Wi-Fi a phone shares with this machine
fn reachability_rank(ip: &Ipv4Addr) -> u8 {
    match ip.octets() {
        [192, 168, ..] => 0,
        [10, ..] => 1,
        [172, b, ..] if (16..=31).contains(&b) => 2,
        _ if ip.is_link_local() => 4,
        _ => 3,
    }
}

/// The best candidate; ties keep interface order
fn pick_best_ip(ips: &[Ipv4Addr]) -> Option<Ipv4Addr> {
    ips.iter()
        .filter(|ip| !ip.is_loopback())
        .min_by_key(|ip| reachability_rank(ip))
        .copied()
}

/// `Ok(None)` when nothing answers; `Err` when something answers wrongly
async fn check_daemon(link: &ViewerLink) -> anyhow::Result<Option<Health>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        // Self-signed certificates are the norm on a LAN
        .danger_accept_invalid_certs(true)
        .build()?;

    let response = match client.get(link.health_url()).send().await {
        Ok(response) => response,
        Err(e) if e.is_timeout() || e.is_connect() => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if !response.status().is_success() {
        anyhow::bail!("{} answered {}", link.health_url(), response.status());
    }
    let body = response.text().await?;
    let health = serde_json::from_str(&body).context("not a Verdant health response")?;
    Ok(Some(health))
}

/// Half-block rendering: two modules per terminal line
fn render_qr_terminal(code: &QrCode) -> String {
    code.render::<Dense1x2>()
        .dark_color(Dense1x2::Light)
        .light_color(Dense1x2::Dark)
        .quiet_zone(true)
        .build()
}
