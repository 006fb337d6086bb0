//! ambifand
//!
//! Sensor display daemon. Reads `H:<humidity>,T:<temperature>,G:<gas>` lines
//! from a serial sensor board, shows the values and animates a fan whose speed
//! follows them.
//!
//! While no board is connected, values come from fallback fractions that can
//! be changed with `set <field> <fraction>` on stdin. Type `help` for the full
//! command list.

use std::ops::ControlFlow;
use std::path::PathBuf;

use ambifan_core::config::DisplayFormat;
use ambifan_core::default_config_path;
use ambifan_hardware::{available_ports, SerialOpener};
use ambifand::config::{load_config, Overrides};
use ambifand::{controls, presentation, shutdown, App};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::info;

/// ambifan sensor display daemon
#[derive(Parser, Debug)]
#[command(name = "ambifand")]
#[command(version, about = "Serial sensor display with an animated fan", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Serial port to use instead of scanning (e.g., /dev/ttyUSB0, COM3)
    #[arg(short, long)]
    port: Option<String>,

    /// Start disconnected, on fallback values
    #[arg(long)]
    no_auto_connect: bool,

    /// Output format: terminal, json or headless
    #[arg(short, long)]
    format: Option<DisplayFormat>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the display loop (default)
    Run,
    /// List serial ports and exit
    Ports,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.verbose);

    if let Some(Command::Ports) = args.command {
        let ports = available_ports()?;
        println!("{}", presentation::format_port_list(&ports));
        return Ok(());
    }

    info!("ambifan daemon starting...");

    // Config path: CLI flag > env var > default
    let config_path = args.config.clone().unwrap_or_else(|| {
        std::env::var("AMBIFAN_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path())
    });

    let mut config = load_config(&config_path).await?;
    Overrides {
        port: args.port.clone(),
        no_auto_connect: args.no_auto_connect,
        format: args.format,
    }
    .apply(&mut config);

    info!(
        "Serial: {} baud, poll every {} ms, auto-connect {}",
        config.serial.baud_rate, config.serial.poll_interval_ms, config.serial.auto_connect
    );
    info!(
        "Limits: temperature {}, gas {}; display {} at {} Hz",
        config.limits.max_temperature,
        config.limits.max_gas,
        config.display.format,
        config.display.frame_rate_hz
    );

    let opener = SerialOpener::new(config.serial.baud_rate, config.serial.read_timeout());
    let sink = presentation::sink_for(config.display.format);
    let frame_period = config.display.frame_period();

    let mut app = App::new(config, opener, sink);
    app.start();

    let (tx, mut rx) = mpsc::channel(16);
    let _controls = controls::spawn_stdin_reader(tx)?;

    let mut frames = time::interval(frame_period);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_frame = Instant::now();

    let shutdown = shutdown::shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            now = frames.tick() => {
                let dt = now.duration_since(last_frame);
                last_frame = now;
                app.tick(dt).await;
            }
            Some(command) = rx.recv() => {
                if let ControlFlow::Break(()) = app.handle_command(command) {
                    info!("Quit requested");
                    break;
                }
            }
        }
    }

    app.shutdown();
    info!("Shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber for logging
///
/// Logs go to stderr so frame output on stdout stays machine readable.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
