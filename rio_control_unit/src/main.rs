//! # RIO Control Unit
//!
//! Runs the bridge cycle against the firmware emulator: loads the board
//! TOML, applies `--ctrl-type` overrides, performs RT setup and loops
//! until Ctrl-C or `--cycles` is reached.

use clap::Parser;
use rio_common::config::BridgeConfig;
use rio_common::consts::DEFAULT_CONFIG_PATH;
use rio_control_unit::cycle::{CycleRunner, rt_setup};
use rio_hal::drivers::create_emulator;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::Ordering;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// RIO Control Unit: step/IO bridge cycle
#[derive(Parser, Debug)]
#[command(name = "rio_control_unit")]
#[command(version)]
#[command(about = "Per-cycle control law and SPI frame exchange for the RIO bridge")]
struct Args {
    /// Board configuration TOML. Falls back to /etc/rio/bridge.toml, then
    /// to built-in defaults.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Per-joint control type override, comma separated ('p' or 'v').
    #[arg(long, value_delimiter = ',')]
    ctrl_type: Vec<String>,

    /// Stop after this many cycles (0 = run until Ctrl-C).
    #[arg(long, default_value_t = 0)]
    cycles: u64,

    /// CPU core to pin the RT thread to (default: 1).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (default: 80).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    info!("RIO Control Unit v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("RIO Control Unit shutdown complete");
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(args.config.as_deref())?;
    config.apply_control_overrides(&args.ctrl_type)?;

    info!(
        "Config OK: cycle_time={}µs, joints={}, oscillator={}Hz",
        config.bus.cycle_time_us,
        config.joints.len(),
        config.bus.oscillator_hz
    );

    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    let transport = create_emulator(&config);
    let mut runner = CycleRunner::new(&config, transport)?;

    let pins = runner.pins_mut();
    pins.enable = true;
    pins.reset_request = true;
    pins.enable_all_joints();

    let running = runner.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    info!("CycleRunner initialized, entering loop");
    let result = runner.run(args.cycles);

    let stats = runner.stats();
    let diag = runner.bridge().diagnostics();
    info!(
        cycles = stats.cycle_count,
        avg_ns = stats.avg_cycle_ns(),
        max_ns = stats.max_cycle_ns,
        overruns = stats.overruns,
        transfers = diag.transfers,
        data = diag.data_frames,
        estop = diag.estop_frames,
        malformed = diag.malformed_frames,
        transport_errors = diag.transport_errors,
        "Loop finished"
    );

    if let Err(e) = result {
        error!("Loop error: {e}");
        return Err(e.into());
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<BridgeConfig, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        info!("Loading config from {}", path.display());
        return Ok(BridgeConfig::load(path)?);
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        info!("Loading config from {}", default_path.display());
        Ok(BridgeConfig::load(default_path)?)
    } else {
        warn!("No config given and {DEFAULT_CONFIG_PATH} missing; using built-in defaults");
        Ok(BridgeConfig::default())
    }
}

fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
