//! veil-sim
//!
//! Opens several tabs of one session, mounts a gate for the same scope in
//! each, submits a password in the first tab and reports how the others
//! converge.
//!
//! Usage:
//!   veil-sim --password <text> [--scope <id|global>] [--tabs <n>]
//!            [--catalog <file>] [--poll-ms <n>] [--suppress-native]

mod args;

use args::Args;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};
use veil_core::{GateConfig, Scope, ScopeCatalog};
use veil_gate::{GateController, GatedElement, Session};

fn print_usage() {
    eprintln!("veil-sim - Simulate unlock propagation across tabs");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  veil-sim --password <text>    Password submitted in the first tab");
    eprintln!("           [--scope <id>]       Scope id, or 'global' (default)");
    eprintln!("           [--tabs <n>]         Number of tabs (default: 3)");
    eprintln!("           [--catalog <file>]   Scope catalog JSON");
    eprintln!("           [--poll-ms <n>]      Poll interval in milliseconds");
    eprintln!("           [--suppress-native]  Drop cross-tab storage events");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  VEIL_CATALOG           Catalog file when --catalog is not given");
    eprintln!("  VEIL_POLL_INTERVAL_MS  Poll interval when --poll-ms is not given");
    eprintln!("  RUST_LOG               Log filter (default: veil=info)");
}

fn report(gates: &[GateController]) {
    for (tab, gate) in gates.iter().enumerate() {
        let state = if gate.is_unlocked() { "unlocked" } else { "locked" };
        println!("  tab {}: {} ({})", tab, state, gate.scope());
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    veil_logging::init(veil_logging::DEFAULT_DIRECTIVES);

    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            std::process::exit(2);
        }
    };
    if args.help {
        print_usage();
        return Ok(());
    }

    let catalog = match &args.catalog {
        Some(path) => ScopeCatalog::load(path)?,
        None => ScopeCatalog::from_env()?,
    };
    let config = match args.poll_interval {
        Some(interval) => GateConfig::with_poll_interval(interval)?,
        None => GateConfig::from_env()?,
    };

    let session = Session::in_memory(catalog);
    session.set_native_events(!args.suppress_native);

    let scope = if args.scope == "global" {
        Scope::global()
    } else {
        session.catalog().scope(&args.scope)
    };
    let prompt = session.catalog().prompt_for(&scope);

    let gates: Vec<GateController> = (0..args.tabs)
        .map(|_| {
            let tab = session.open_context(true);
            GateController::mount(&tab, GatedElement::new(scope.clone(), prompt.clone()), &config)
        })
        .collect();

    println!("Before:");
    report(&gates);

    if let Err(rejection) = gates[0].submit(&args.password) {
        warn!("tab 0 rejected: {}", rejection);
        println!("Rejected: {}", rejection);
        return Ok(());
    }

    let started = Instant::now();
    let deadline = started + config.poll_interval * 2;
    while !gates.iter().all(GateController::is_unlocked) && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    info!(elapsed = ?started.elapsed(), "propagation finished");

    println!("After {:?}:", started.elapsed());
    report(&gates);

    Ok(())
}
