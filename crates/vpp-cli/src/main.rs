//! `vpp-cli` – the `vpp-bridge` binary.
//!
//! Wires the whole adapter stack together and runs it headless:
//!
//! 1. Loads `~/.vpp/config.toml` (or `--config <path>`), falling back to
//!    defaults when the file is absent.
//! 2. Loads the accel and brake calibration CSVs.
//! 3. Builds the actuation adapter over a simulated vehicle and connects it
//!    to an in-process loopback link through the event bus.
//! 4. Runs the tick loop until **Ctrl-C**, injecting each JSON line read
//!    from stdin (`{"kind": "gear", "msg": {"command": 2}}`) as an inbound
//!    message.
//!
//! `--print-schema` prints the JSON schema of the inbound message type and
//! exits; `--init` writes a default config file and exits.

mod config;

use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use vpp_calibration::PedalMap;
use vpp_hal::SimVehicle;
use vpp_kernel::{strategy_from_config, ActuationAdapter};
use vpp_middleware::{pump_inbound, pump_outbound, EventBus, LoopbackLink, StatusReporter, VehicleLink};
use vpp_runtime::{init_tracing, TickRunner};
use vpp_types::{InboundMessage, VppError};

/// Parsed command-line flags.
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    print_schema: bool,
    init: bool,
    help: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().ok_or("--config needs a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--print-schema" => parsed.print_schema = true,
            "--init" => parsed.init = true,
            "--help" | "-h" => parsed.help = true,
            other => return Err(format!("unknown argument '{other}'")),
        }
    }
    Ok(parsed)
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}: {}", "Argument error".red(), e);
            print_usage();
            return ExitCode::FAILURE;
        }
    };
    if args.help {
        print_usage();
        return ExitCode::SUCCESS;
    }
    if args.print_schema {
        return print_schema();
    }

    let config_path = args.config.clone().unwrap_or_else(config::config_path);
    if args.init {
        return write_default_config(&config_path);
    }

    // Hold the guard until main returns so buffered spans are flushed.
    let _tracing = init_tracing("vpp-bridge");
    print_banner();

    let cfg = match config::load_from(&config_path) {
        Ok(Some(cfg)) => {
            println!("  Config loaded from {}", config_path.display().to_string().bold());
            cfg
        }
        Ok(None) => {
            println!(
                "  No config at {}; using defaults.",
                config_path.display().to_string().dimmed()
            );
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            return ExitCode::FAILURE;
        }
    };

    let runner = match build_runner(&cfg, EventBus::default()) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("{}: {}", "Startup error".red(), e);
            return ExitCode::FAILURE;
        }
    };

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let shutdown = runner.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping the tick loop …".yellow().bold());
        shutdown.store(true, Ordering::Release);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {}", "Runtime error".red(), e);
            return ExitCode::FAILURE;
        }
    };

    let summary = rt.block_on(async move {
        let bus = runner.bus().clone();
        let loopback = Arc::new(LoopbackLink::new());
        let link: Arc<dyn VehicleLink> = loopback.clone();
        let inbound = tokio::spawn(pump_inbound(Arc::clone(&link), bus.clone()));
        let outbound = tokio::spawn(pump_outbound(Arc::clone(&link), bus));
        let stdin = tokio::spawn(feed_lines(
            BufReader::new(tokio::io::stdin()),
            loopback,
        ));

        let summary = runner.run().await;
        inbound.abort();
        outbound.abort();
        stdin.abort();
        summary
    });

    info!(ticks = summary.ticks, published = summary.published, "Bridge stopped");
    println!("{}", format!("  ✓ {} ticks, {} status batches.", summary.ticks, summary.published).green());
    ExitCode::SUCCESS
}

/// Load calibration, build the adapter over a simulated vehicle and wrap it
/// in a tick runner attached to `bus`.
fn build_runner(cfg: &config::Config, bus: EventBus) -> Result<TickRunner<SimVehicle>, VppError> {
    if cfg.tick_hz == 0 {
        return Err(VppError::Config("tick_hz must be at least 1".to_string()));
    }
    let accel = load_map(cfg.accel_map_path.as_ref(), "accel")?;
    let brake = load_map(cfg.brake_map_path.as_ref(), "brake")?;
    let strategy = strategy_from_config(&cfg.adapter, accel, brake);

    let vehicle = SimVehicle::builder()
        .with_id("sim")
        .with_all_channels()
        .with_steering()
        .build();
    let adapter = ActuationAdapter::new(vehicle, cfg.adapter.clone(), strategy)?;
    let reporter = StatusReporter::new(cfg.publish_hz).with_frame_id(cfg.frame_id.clone());
    Ok(TickRunner::new(adapter, reporter, bus, cfg.tick_hz))
}

/// Inject every non-blank line of `reader` into `link` as a JSON-encoded
/// inbound message until the reader is exhausted.  Returns the number of
/// messages accepted.
async fn feed_lines<R>(reader: R, link: Arc<LoopbackLink>) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut accepted = 0;
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match link.inject_json(line) {
                    Ok(_) => accepted += 1,
                    Err(e) => warn!(error = %e, "Inbound line rejected"),
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Inbound reader failed");
                break;
            }
        }
    }
    accepted
}

fn load_map(path: Option<&PathBuf>, which: &str) -> Result<PedalMap, VppError> {
    match path {
        Some(path) => PedalMap::load(path),
        None => {
            warn!(map = which, "No calibration file configured; map is empty");
            Ok(PedalMap::default())
        }
    }
}

fn print_schema() -> ExitCode {
    let schema = schemars::schema_for!(InboundMessage);
    match serde_json::to_string_pretty(&schema) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Schema error".red(), e);
            ExitCode::FAILURE
        }
    }
}

fn write_default_config(path: &PathBuf) -> ExitCode {
    if path.exists() {
        println!("  Config already exists at {}", path.display().to_string().bold());
        return ExitCode::SUCCESS;
    }
    match config::save_to(&config::Config::default(), path) {
        Ok(()) => {
            println!(
                "  {} Config saved to {}",
                "✓".green().bold(),
                path.display().to_string().bold()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error saving config".red(), e);
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#" _   _____  ___ "#.bold().cyan());
    println!("{}", r#"| | / / _ \/ _ \"#.bold().cyan());
    println!("{}", r#"| |/ / ___/ ___/"#.bold().cyan());
    println!("{}", r#"|___/_/  /_/    "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "vpp-bridge".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Vehicle actuation adapter");
    println!();
}

fn print_usage() {
    println!("Usage: vpp-bridge [--config <path>] [--init] [--print-schema]");
    println!();
    println!("  -c, --config <path>  Config file (default ~/.vpp/config.toml)");
    println!("      --init           Write a default config file and exit");
    println!("      --print-schema   Print the inbound message JSON schema and exit");
    println!("  -h, --help           Show this help");
}
