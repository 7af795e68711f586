//! ryzenmon-rs-pmtable: PM-table replay/decoding binary.
//!
//! Decodes a captured PM-table dump (raw bytes as handed over by the SMU
//! transport) and prints the derived sensor report as JSON, either once or
//! on an interval while the capture file is being rewritten in place.

use clap::Parser;
use ryzenmon_rs_core::{Topology, ZenGeneration, MAX_CORES};
use ryzenmon_rs_pmtable::{compute_report, layout_for, supported_versions, PmTableView};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tokio::time;

/// Command-line arguments for the PM-table decoder.
#[derive(Parser)]
#[command(name = "ryzenmon-rs-pmtable")]
#[command(about = "PM-table decoder for ryzenmon-rs")]
#[command(version)]
#[command(author)]
struct Args {
    /// Path to a raw PM-table dump
    #[arg(short, long)]
    file: PathBuf,

    /// PM-table version identifier (e.g. 0x380904)
    #[arg(short = 't', long, value_parser = parse_version)]
    table_version: u32,

    /// Update interval in milliseconds (minimum 100ms)
    #[arg(short, long, default_value = "1000", value_parser = validate_interval)]
    interval: u64,

    /// One-shot mode (decode once and exit)
    #[arg(short, long)]
    once: bool,

    /// Maximum number of core slots to fill
    #[arg(long, default_value_t = MAX_CORES)]
    core_limit: usize,

    /// Disabled-core bitmap as reported by fuse readout (hex or decimal)
    #[arg(long, default_value = "0", value_parser = parse_bitmap)]
    disable_map: u64,

    /// Pretty-print the JSON report
    #[arg(short, long)]
    pretty: bool,

    /// List supported table versions and exit
    #[arg(long)]
    list_versions: bool,
}

/// Parse a table version given as hex (`0x380904`) or decimal.
fn parse_version(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    parsed.map_err(|_| format!("Invalid table version: {s}"))
}

/// Parse the disabled-core bitmap given as hex or decimal.
fn parse_bitmap(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|_| format!("Invalid disable map: {s}"))
}

/// Validate that the interval is at least 100ms.
fn validate_interval(s: &str) -> Result<u64, String> {
    let interval = s
        .parse::<u64>()
        .map_err(|_| "Interval must be a positive integer".to_owned())?;

    if interval < 100 {
        return Err("Interval must be at least 100ms".to_owned());
    }

    Ok(interval)
}

/// Build a replay topology from the table's structural counters.
///
/// The real topology comes from the discovery collaborator on live systems;
/// for replaying captures the layout's counters plus the caller-supplied
/// disable map are a faithful stand-in.
fn replay_topology(version: u32, disable_map: u64) -> Option<Topology> {
    let layout = layout_for(version)?;
    let cores = layout.max_cores;
    let disabled = (disable_map & ((1u64 << cores) - 1)).count_ones() as usize;
    let ccds = cores.div_ceil(8);
    let ccxs = match layout.zen {
        ZenGeneration::Zen2 => ccds * 2,
        ZenGeneration::Zen3 => ccds,
    };
    Some(Topology {
        cores,
        ccds,
        ccxs,
        cores_per_ccx: cores / ccxs,
        enabled_cores: cores - disabled,
        core_disable_map: disable_map,
        l3_caches: layout.max_l3,
        memory_channels: 2,
    })
}

fn decode_and_print(args: &Args, topology: &Topology) -> Result<(), Box<dyn std::error::Error>> {
    let raw = fs::read(&args.file)?;
    let view = PmTableView::decode(args.table_version, &raw)?;
    let report = compute_report(&view, topology, args.core_limit);

    if args.pretty {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", serde_json::to_string(&report)?);
    }
    Ok(())
}

/// Main entry point for the PM-table decoder.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.list_versions {
        for version in supported_versions() {
            println!("0x{version:06X}");
        }
        return Ok(());
    }

    let topology = match replay_topology(args.table_version, args.disable_map) {
        Some(topology) => topology,
        None => {
            eprintln!(
                "Unsupported PM table version 0x{:06X} (use --list-versions)",
                args.table_version
            );
            process::exit(1);
        }
    };
    if let Err(e) = topology.validate() {
        eprintln!("Invalid topology for replay: {e}");
        process::exit(1);
    }

    if args.once {
        // One-shot mode: decode once and exit.
        if let Err(e) = decode_and_print(&args, &topology) {
            eprintln!("Error decoding PM table: {e}");
            process::exit(1);
        }
    } else {
        // Continuous mode: re-read the capture on every tick.
        let mut interval = time::interval(Duration::from_millis(args.interval));

        loop {
            interval.tick().await;

            match decode_and_print(&args, &topology) {
                Ok(()) => io::stdout().flush()?,
                Err(e) => {
                    eprintln!("Error decoding PM table: {e}");
                    // Continue running on errors, just log them
                }
            }
        }
    }

    Ok(())
}
