//! open-moon: animate a two-loop LED ring over a serial link.
//!
//! Loads the settings and colors files (writing them back so missing
//! fields show up with their defaults), then runs the driver loop until
//! Ctrl+C.
//!
//! ## Architecture
//! - **Engine** (`AnimationEngine`): decides what to send each tick
//! - **Driver** (`Driver`): connect / animate state machine on a
//!   single-threaded tokio runtime
//! - **Link** (`SerialLink`): the serial port, reopened after failures
//!
//! ## Usage
//! ```sh
//! ./target/release/open-moon --config local/config.json --colors local/colors.json -v
//! ```

#[cfg(not(feature = "serial"))]
fn main() {
    eprintln!("This binary requires the 'serial' feature (tokio-serial).");
    eprintln!("Build with: cargo build --release");
    eprintln!("Tests can run without it: cargo test --no-default-features");
    std::process::exit(1);
}

#[cfg(feature = "serial")]
fn main() -> anyhow::Result<()> {
    serial_main()
}

#[cfg(feature = "serial")]
#[tokio::main(flavor = "current_thread")]
async fn serial_main() -> anyhow::Result<()> {
    use anyhow::Context as _;
    use clap::Parser;
    use open_moon::config::{self, ColorConfig, Config};
    use open_moon::driver::Driver;
    use open_moon::engine::AnimationEngine;
    use open_moon::metrics::{SplitMix64, SystemMetrics};
    use open_moon::setup_signal_handler;
    use open_moon::spec::SpecResolver;
    use open_moon::transport::SerialLink;
    use std::path::PathBuf;
    use tracing_subscriber::EnvFilter;

    /// Animate a two-loop LED ring over a serial link
    #[derive(Parser)]
    #[command(name = "open-moon")]
    #[command(version)]
    struct Args {
        /// Path to JSON color settings file
        #[arg(short, long, default_value = "local/colors.json")]
        colors: PathBuf,

        /// Path to JSON configuration file
        #[arg(long, default_value = "local/config.json")]
        config: PathBuf,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    }

    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .with_ansi(false) // Disable ANSI color codes for systemd/journald
        .compact()
        .init();

    let settings: Config = config::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let mut colors: ColorConfig = config::load_or_default(&args.colors)
        .with_context(|| format!("loading {}", args.colors.display()))?;

    colors.fill_defaults();

    config::save(&args.config, &settings)
        .with_context(|| format!("saving {}", args.config.display()))?;
    config::save(&args.colors, &colors)
        .with_context(|| format!("saving {}", args.colors.display()))?;

    tracing::info!("open-moon v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Loops: inner {} LEDs ({} frames), outer {} LEDs ({} frames)",
        settings.inner_loop.count,
        colors.inner.len(),
        settings.outer_loop.count,
        colors.outer.len()
    );
    match &settings.serial.port {
        Some(port) => tracing::info!("Port: {} @ {} baud", port, settings.serial.baudrate),
        None => tracing::info!("Port: auto-detect @ {} baud", settings.serial.baudrate),
    }

    let running = setup_signal_handler().context("installing Ctrl-C handler")?;

    let resolver = SpecResolver::new(SystemMetrics::new(), SplitMix64::from_time());
    let engine = AnimationEngine::new(settings.inner_loop, settings.outer_loop, colors, resolver);
    let link = SerialLink::new(settings.serial.clone());

    let mut driver = Driver::new(engine, link, &settings.serial);
    driver.run(&running).await;

    tracing::info!("Shutting down cleanly.");
    Ok(())
}
