//! diskwatcher
//!
//! Samples SMART telemetry of the local drives into an append-only store
//! and checks successive samples for power-cycle discontinuities.
//!
//! Intended to be run from a scheduler: `sample` at boot and periodically,
//! `check` after each sample in the user's desktop session.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use diskwatcher::hardware::boot_time;
use diskwatcher::{
    serial_fingerprint, CheckSettings, ContinuityChecker, DesktopNotifier, DeviceEnumerator,
    EventStore, LsblkScanner, Notifier, NullNotifier, Result, Sampler, SmartctlFetcher,
    SqliteEventStore, TraceFile, WatcherConfig,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// diskwatcher - SMART power-cycle continuity auditing
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(long, env = "DISKWATCHER_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the event database and trace file
    #[arg(long, env = "DISKWATCHER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Notify on consistent verdicts too
    #[arg(long, env = "DISKWATCHER_ALWAYS_NOTIFY")]
    always_notify: bool,

    /// Disable desktop notifications
    #[arg(long)]
    no_notify: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record one SMART sample per device
    Sample,
    /// Compare the last two samples of each device
    Check,
    /// List the devices lsblk reports
    Devices,
    /// Show the last two stored samples for a serial number
    History { serial: String },
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    init_logging(&args);

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = build_config(&args)?;

    info!("Starting diskwatcher {}", diskwatcher::VERSION);
    info!("  Data dir: {}", config.data_dir.display());

    match args.command {
        Command::Sample => sample(&config).await,
        Command::Check => check(&config).await,
        Command::Devices => devices(&config).await,
        Command::History { serial } => history(&config, &serial).await,
    }
}

fn build_config(args: &Args) -> Result<WatcherConfig> {
    let mut config = WatcherConfig::load(args.config.as_deref())?;

    if let Some(data_dir) = &args.data_dir {
        config.data_dir = data_dir.clone();
    }
    if args.always_notify {
        config.always_notify = true;
    }
    if args.no_notify {
        config.notifications = false;
    }

    config.validate()?;
    Ok(config)
}

// =============================================================================
// Commands
// =============================================================================

async fn sample(config: &WatcherConfig) -> Result<()> {
    config.ensure_runtime()?;

    let devices = scanner(config).list_devices().await?;
    let store = Arc::new(SqliteEventStore::open(
        config.database_path(),
        config.db_busy_timeout(),
    )?);
    let fetcher = Arc::new(SmartctlFetcher::new(
        &config.smartctl_path,
        config.tool_timeout(),
    ));

    let sampler = Sampler::new(
        fetcher,
        store,
        TraceFile::new(config.trace_path()),
        boot_time()?,
    );
    sampler.run_pass(&devices).await?;

    Ok(())
}

async fn check(config: &WatcherConfig) -> Result<()> {
    config.ensure_runtime()?;

    let devices = scanner(config).list_devices().await?;
    let store = Arc::new(SqliteEventStore::open(
        config.database_path(),
        config.db_busy_timeout(),
    )?);

    let checker = ContinuityChecker::new(store, notifier(config), CheckSettings::from(config));
    checker.run_pass(&devices).await?;

    Ok(())
}

async fn devices(config: &WatcherConfig) -> Result<()> {
    let devices = scanner(config).list_devices().await?;

    println!("Disks recognized:\n");
    for device in devices {
        println!("KNAME: {}", device.kname);
        println!("SERIAL: {}", device.serial);
        println!("TRAN: {}", device.transport);
        println!("MODEL: {}", device.model);
        println!("ROTA: {}", u8::from(device.rotational));
        println!();
    }

    Ok(())
}

async fn history(config: &WatcherConfig, serial: &str) -> Result<()> {
    let database = config.database_path();
    if !database.exists() {
        println!("No event database at {}", database.display());
        return Ok(());
    }

    let store = SqliteEventStore::open_read_only(&database, config.db_busy_timeout())?;
    let events = store.last_two(&serial_fingerprint(serial)).await?;

    if events.is_empty() {
        println!("No samples recorded for {}", serial);
    }
    for event in events {
        println!(
            "#{} {} {} boot={} {}",
            event.id,
            event.dt.to_rfc3339(),
            event.dev,
            event.dt_boot.to_rfc3339(),
            serde_json::to_string(event.sample())?
        );
    }

    Ok(())
}

fn scanner(config: &WatcherConfig) -> LsblkScanner {
    LsblkScanner::new(&config.lsblk_path, config.tool_timeout())
}

fn notifier(config: &WatcherConfig) -> Arc<dyn Notifier> {
    if !config.notifications {
        return Arc::new(NullNotifier);
    }

    if !config.notify_send_path.exists() {
        warn!(
            "notify-send not found under {}, notifications disabled",
            config.notify_send_path.display()
        );
        return Arc::new(NullNotifier);
    }

    Arc::new(DesktopNotifier::new(
        &config.notify_send_path,
        config.tool_timeout(),
    ))
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
