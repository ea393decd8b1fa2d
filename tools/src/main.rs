//! simbridge-runner: headless host for the simulation bridge.
//!
//! Usage:
//!   simbridge-runner --config data/bridge.json
//!   simbridge-runner --port 1114 --cycles 500

use anyhow::{Context, Result};
use simbridge_core::{
    acceptor::{Acceptor, ShutdownSignal},
    clock::TickClock,
    config::BridgeConfig,
    queue::handoff_queue,
    reconciler::Reconciler,
    tick::TickDriver,
    view::LoggingView,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config_path = args
        .windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| w[1].as_str());
    let cycles = parse_arg(&args, "--cycles", 0u64);

    let mut config = match config_path {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };
    config.port = parse_arg(&args, "--port", config.port);
    config.validate()?;

    println!("simbridge-runner");
    println!("  bind:      {}", config.bind_target());
    println!("  boundary:  ±{}", config.boundary_half_extent);
    println!("  queue:     {} ({:?})", config.queue_capacity, config.overflow_policy);
    println!("  tick:      {} ms", config.tick_interval_ms);
    println!("  cycles:    {}", if cycles == 0 { "until Ctrl-C".to_string() } else { cycles.to_string() });
    println!();

    let acceptor = Acceptor::bind(&config)
        .with_context(|| format!("cannot start listener on {}", config.bind_target()))?;

    let signal = ShutdownSignal::new();
    {
        let signal = signal.clone();
        ctrlc::set_handler(move || {
            log::info!("interrupt received, shutting down");
            signal.request();
        })
        .context("cannot install Ctrl-C handler")?;
    }

    let (sender, receiver) = handoff_queue(config.queue_capacity, config.overflow_policy);
    let net = acceptor.spawn(sender, signal.clone())?;

    let mut driver = TickDriver::new(
        receiver,
        Reconciler::new(config.boundary_half_extent),
        LoggingView::with_hints(config.kind_hints.clone()),
    );
    let mut clock = TickClock::new(config.tick_interval());
    let ran = driver.run(&mut clock, &signal, cycles);

    signal.request();
    let dropped = driver.receiver().dropped();
    let live = driver.reconciler().len();
    let meta = driver.latest_meta().copied();
    driver.into_view();

    let stats = net
        .join()
        .map_err(|_| anyhow::anyhow!("network thread panicked"))?;

    print_summary(ran, live, dropped, meta, &stats)?;
    Ok(())
}

fn print_summary(
    cycles: u64,
    live: usize,
    dropped: u64,
    meta: Option<simbridge_core::snapshot::SnapshotMeta>,
    stats: &simbridge_core::acceptor::AcceptorStats,
) -> Result<()> {
    println!("=== RUN SUMMARY ===");
    println!("  cycles:          {cycles}");
    println!("  live entities:   {live}");
    println!("  connections:     {}", stats.connections);
    println!("  conn errors:     {}", stats.connection_errors);
    println!("  bytes received:  {}", stats.bytes_received);
    println!("  frames:          {}", stats.frames);
    println!("  snapshots:       {}", stats.snapshots);
    println!("  decode failures: {}", stats.decode_failures);
    println!("  queue drops:     {dropped}");
    match meta {
        Some(m) => println!("  last snapshot:   {}", serde_json::to_string(&m)?),
        None => println!("  last snapshot:   (none received)"),
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
