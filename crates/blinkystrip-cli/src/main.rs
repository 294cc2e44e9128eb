//! BlinkyStrip Control Tool
//!
//! CLI for driving a BlinkyTape-style LED strip: static colors, fades,
//! rainbows and GPU temperature lighting.

mod config;
mod discovery;
mod effects;
mod probes;
mod schedule;

use anyhow::{Context, Result};
use blinkystrip_hw::{DisplayOutcome, MemoryTransport, Pixel, StripLink, Transport};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Config;
use effects::Animator;
use probes::{NvidiaSmiProbe, ProcessProbe};
use schedule::{ScheduleGate, MAX_OVERRIDE_MINUTES};

#[derive(Parser)]
#[command(name = "blinkystrip")]
#[command(about = "Control tool for BlinkyTape-style LED strips")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port path, or "auto" to detect
    #[arg(short, long)]
    port: Option<String>,

    /// Number of LEDs on the strip
    #[arg(short = 'n', long)]
    led_count: Option<usize>,

    /// Write each pixel immediately instead of buffering frames
    #[arg(long)]
    unbuffered: bool,

    /// Show colors outside display hours for MINUTES (config default if omitted)
    #[arg(
        long = "override",
        value_name = "MINUTES",
        num_args = 0..=1,
        require_equals = true,
        value_parser = clap::value_parser!(u32).range(1..=MAX_OVERRIDE_MINUTES)
    )]
    override_minutes: Option<Option<u32>>,

    /// Ignore display hours entirely
    #[arg(long)]
    no_schedule: bool,

    /// Encode frames without opening a serial port
    #[arg(long)]
    dry_run: bool,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Effect(Effect),
    /// List serial ports that may have a strip attached
    Ports {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reboot the strip controller into its bootloader
    Bootloader,
    /// Write the effective configuration to a file
    InitConfig {
        /// Output file path
        #[arg(default_value = "blinkystrip.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum Effect {
    /// Fill the strip with one color
    Color {
        /// Color: #RRGGBB, r,g,b or a name (red, gold, ...)
        color: Pixel,
    },
    /// Turn every LED off
    Off,
    /// Fade from one color to another
    Fade {
        from: Pixel,
        to: Pixel,

        /// Fade duration in milliseconds
        #[arg(long, default_value = "2000")]
        duration: u64,
    },
    /// Alternate between two colors
    Swap {
        first: Pixel,
        second: Pixel,

        /// Time each color is shown, in milliseconds
        #[arg(long, default_value = "1000")]
        interval: u64,

        /// Number of swaps (forever if omitted)
        #[arg(long)]
        cycles: Option<u32>,
    },
    /// Rotate a rainbow along the strip
    Rainbow {
        /// Wheel positions to advance per frame (1-255)
        #[arg(long, default_value = "4")]
        step: u8,

        /// Delay between frames in milliseconds
        #[arg(long, default_value = "30")]
        delay: u64,

        /// Number of full wheel turns (forever if omitted)
        #[arg(long)]
        cycles: Option<u32>,
    },
    /// Move a block of color along the strip
    Block {
        color: Pixel,

        /// Background color
        #[arg(long, default_value = "black")]
        background: Pixel,

        /// Block length in LEDs
        #[arg(long, default_value = "5")]
        size: usize,

        /// Delay between frames in milliseconds
        #[arg(long, default_value = "50")]
        delay: u64,

        /// Number of trips along the strip (forever if omitted)
        #[arg(long)]
        cycles: Option<u32>,
    },
    /// Color the strip by GPU temperature
    Gpu {
        /// Poll interval in milliseconds (config default if omitted)
        #[arg(long)]
        interval: Option<u64>,

        /// Number of polls (forever if omitted)
        #[arg(long)]
        cycles: Option<u32>,
    },
    /// Cycle red, green, blue, white and black
    Demo {
        /// Time each color is shown, in milliseconds
        #[arg(long, default_value = "1000")]
        delay: u64,

        /// Number of passes (forever if omitted)
        #[arg(long)]
        cycles: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration, then apply command line overrides
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(port) = &cli.port {
        config.strip.device = port.clone();
    }
    if let Some(led_count) = cli.led_count {
        config.strip.led_count = led_count;
    }
    if cli.unbuffered {
        config.strip.buffered = false;
    }
    if cli.log_file.is_some() {
        config.log_file = cli.log_file.clone();
    }

    // Setup logging
    init_logging(cli.verbose, config.log_file.as_deref())?;
    if let Some(path) = &cli.config {
        info!("Loaded configuration from: {}", path.display());
    }

    let effect = match cli.command {
        Commands::Ports { json } => return handle_ports(json),
        Commands::InitConfig { path, force } => return handle_init_config(&config, &path, force),
        Commands::Bootloader => return handle_bootloader(&config, cli.dry_run),
        Commands::Effect(effect) => effect,
    };

    let mut gate = if cli.no_schedule {
        ScheduleGate::disabled()
    } else {
        ScheduleGate::from_config(&config.schedule)
    };
    if let Some(minutes) = cli.override_minutes {
        let minutes = minutes.map_or(config.schedule.override_minutes, i64::from);
        gate.set_override(true, minutes);
    }

    if cli.dry_run {
        let link = StripLink::with_transport(
            "dry-run",
            MemoryTransport::new(),
            config.strip.led_count,
            config.strip.buffered,
        )?;
        let mut link = run(link, gate, effect, &config).await?;
        if let Some(transport) = link.close() {
            info!(
                "Dry run: {} writes, {} bytes",
                transport.writes().len(),
                transport.bytes().len()
            );
        }
    } else {
        let port = discovery::resolve_port(&config.strip.device)?;
        let link = StripLink::open(&port, config.strip.led_count, config.strip.buffered)
            .with_context(|| format!("Failed to open LED strip on {}", port))?;
        info!(
            "Connected to {} ({} LEDs)",
            link.port_path(),
            link.led_count()
        );
        run(link, gate, effect, &config).await?.close();
    }

    Ok(())
}

fn init_logging(verbose: bool, log_file: Option<&str>) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::from_default_env().add_directive(level.parse()?);

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

/// Plays an effect until it finishes or the process is asked to stop.
///
/// On SIGINT/SIGTERM the strip is blanked before returning.
async fn run<T: Transport>(
    link: StripLink<T>,
    gate: ScheduleGate,
    effect: Effect,
    config: &Config,
) -> Result<StripLink<T>> {
    let mut animator = Animator::new(link, gate);
    let mut sigterm = signal(SignalKind::terminate())?;

    let interrupted = tokio::select! {
        result = play(&mut animator, effect, config) => {
            result?;
            false
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down");
            true
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down");
            true
        }
    };

    if interrupted {
        info!("Turning off {}", animator.link().port_path());
        animator.blank()?;
    }
    Ok(animator.into_link())
}

async fn play<T: Transport>(
    animator: &mut Animator<T, ScheduleGate>,
    effect: Effect,
    config: &Config,
) -> Result<()> {
    match effect {
        Effect::Color { color } => match animator.set_static_color(color)? {
            DisplayOutcome::Applied => println!("Strip set to: {}", color),
            DisplayOutcome::Suppressed => println!("Outside display hours, strip turned off"),
        },
        Effect::Off => {
            animator.blank()?;
            println!("Strip turned off");
        }
        Effect::Fade { from, to, duration } => {
            animator
                .fade(from, to, Duration::from_millis(duration))
                .await?;
        }
        Effect::Swap {
            first,
            second,
            interval,
            cycles,
        } => {
            animator
                .swap(first, second, Duration::from_millis(interval), cycles)
                .await?;
        }
        Effect::Rainbow {
            step,
            delay,
            cycles,
        } => {
            animator
                .rainbow(step, Duration::from_millis(delay), cycles)
                .await?;
        }
        Effect::Block {
            color,
            background,
            size,
            delay,
            cycles,
        } => {
            animator
                .traveling_block(color, background, size, Duration::from_millis(delay), cycles)
                .await?;
        }
        Effect::Gpu { interval, cycles } => {
            let mut probe = NvidiaSmiProbe::new(&config.gpu.command);
            let games = ProcessProbe::new(&config.gpu.games);
            let idle: Pixel = config
                .gpu
                .idle_color
                .parse()
                .context("Invalid gpu.idle_color in configuration")?;
            let interval = Duration::from_millis(interval.unwrap_or(config.gpu.poll));
            animator
                .gpu_color(&mut probe, &games, idle, interval, cycles)
                .await?;
        }
        Effect::Demo { delay, cycles } => {
            animator.demo(Duration::from_millis(delay), cycles).await?;
        }
    }

    Ok(())
}

fn handle_ports(json: bool) -> Result<()> {
    let ports = discovery::list_ports();
    if json {
        println!("{}", serde_json::to_string_pretty(&ports)?);
        return Ok(());
    }

    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        match (&port.usb_id, &port.product) {
            (Some(id), Some(product)) => println!("{}  [{}] {}", port.path, id, product),
            (Some(id), None) => println!("{}  [{}]", port.path, id),
            _ => println!("{}", port.path),
        }
    }
    Ok(())
}

fn handle_bootloader(config: &Config, dry_run: bool) -> Result<()> {
    if dry_run {
        let mut link = StripLink::with_transport(
            "dry-run",
            MemoryTransport::new(),
            config.strip.led_count,
            config.strip.buffered,
        )?;
        let transport = link.reset_to_bootloader()?;
        println!("Dry run: baud changes {:?}", transport.baud_rates());
        return Ok(());
    }

    let port = discovery::resolve_port(&config.strip.device)?;
    let mut link = StripLink::open(&port, config.strip.led_count, config.strip.buffered)
        .with_context(|| format!("Failed to open LED strip on {}", port))?;
    link.reset_to_bootloader()?;
    println!("Bootloader reset sent to {}", port);
    Ok(())
}

fn handle_init_config(config: &Config, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    config.save(path)?;
    println!("Configuration written to: {}", path.display());
    Ok(())
}
