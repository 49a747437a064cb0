//! push-display
//!
//! Drives the display panel with a built-in test pattern. Frames are
//! produced at the panel rate on a blocking task and handed to the
//! streamer pipeline, which sends them over USB from its own thread.

use anyhow::{Context, Result};
use clap::Parser;
use common::{PatternGenerator, PatternKind, setup_logging};
use protocol::ImageInput;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use streamer::config::StreamerConfig;
use streamer::usb::enumerate_panels;
use streamer::{StreamerPipeline, TransportConfig};
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Interval between metrics log lines
const STATS_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "push-display")]
#[command(author, version, about = "Stream frames to a USB display panel")]
#[command(long_about = "
Streams a test pattern to the 960x160 USB display panel at a fixed frame rate.

EXAMPLES:
    # Run with default config
    push-display

    # Scrolling checkerboard with debug logging
    push-display --pattern checkerboard --log-level debug

    # Send 600 frames (10 seconds at 60 Hz) and exit
    push-display --frames 600

    # List attached panels without streaming
    push-display --list-devices

CONFIGURATION:
    The streamer looks for configuration files in the following order:
    1. Path specified with --config
    2. ~/.config/push-display/streamer.toml
    3. /etc/push-display/streamer.toml
    4. Built-in defaults
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// List attached panels and exit
    #[arg(long)]
    list_devices: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Test pattern (solid, gradient, checkerboard, noise)
    #[arg(short, long, value_name = "PATTERN")]
    pattern: Option<PatternKind>,

    /// Stop after delivering this many frames
    #[arg(long, value_name = "N")]
    frames: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.save_config {
        let config = StreamerConfig::default();
        let path = StreamerConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let mut config = if let Some(ref path) = args.config {
        StreamerConfig::load(Some(path.clone())).context("Failed to load configuration")?
    } else {
        StreamerConfig::load_or_default()
    };

    if let Some(pattern) = args.pattern {
        config.pattern.kind = pattern;
    }

    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    setup_logging(&log_level).context("Failed to setup logging")?;

    info!("push-display v{}", env!("CARGO_PKG_VERSION"));
    info!("Log level: {}", log_level);

    if args.list_devices {
        return list_devices_mode().await;
    }

    run_stream(config, args.frames).await
}

/// List attached panels and exit
async fn list_devices_mode() -> Result<()> {
    let panels = tokio::task::spawn_blocking(enumerate_panels)
        .await
        .context("Device enumeration task failed")?
        .context("Failed to enumerate USB devices")?;

    if panels.is_empty() {
        println!("No panels found.");
    } else {
        println!("Found {} panel(s):\n", panels.len());
        for panel in panels {
            println!(
                "  {:04x}:{:04x}  Bus {:03} Device {:03}",
                panel.vendor_id, panel.product_id, panel.bus_number, panel.address
            );
        }
    }

    Ok(())
}

/// Stream the configured pattern until Ctrl+C or the frame limit
async fn run_stream(config: StreamerConfig, frame_limit: Option<u64>) -> Result<()> {
    let transport = config.display.transport_config();
    let pipeline = tokio::task::spawn_blocking(move || StreamerPipeline::create(transport))
        .await
        .context("Pipeline setup task failed")?
        .context("Failed to create pipeline")?;
    let pipeline = Arc::new(pipeline);

    if let Some(e) = pipeline.device_error() {
        warn!("Streaming without a panel: {}", e);
    }

    let stop = Arc::new(AtomicBool::new(false));
    let producer = tokio::task::spawn_blocking({
        let pipeline = Arc::clone(&pipeline);
        let stop = Arc::clone(&stop);
        let pattern = config.pattern.clone();
        move || {
            produce_frames(
                &pipeline,
                PatternGenerator::new(pattern.kind, pattern.speed),
                transport,
                frame_limit,
                &stop,
            )
        }
    });

    info!("Streaming, press Ctrl+C to stop");

    let delivered = supervise(producer, signal::ctrl_c(), &stop, STATS_INTERVAL, || {
        log_metrics(&pipeline)
    })
    .await?;

    info!("Delivered {} frames", delivered);
    log_metrics(&pipeline);

    match Arc::try_unwrap(pipeline) {
        Ok(pipeline) => tokio::task::spawn_blocking(move || pipeline.destroy())
            .await
            .context("Pipeline teardown task failed")?,
        Err(_) => warn!("Pipeline still shared at shutdown; releasing on drop"),
    }

    Ok(())
}

/// Wait for the producer to finish or for `shutdown` to resolve
///
/// `shutdown` is polled across loop iterations, so a signal that arrives
/// while `on_stats` runs is still seen. Returns frames delivered.
async fn supervise(
    mut producer: JoinHandle<u64>,
    shutdown: impl Future<Output = std::io::Result<()>>,
    stop: &AtomicBool,
    stats_interval: Duration,
    mut on_stats: impl FnMut(),
) -> Result<u64> {
    let mut stats = tokio::time::interval(stats_interval);
    stats.tick().await;

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut producer => return result.context("Frame producer task failed"),
            _ = stats.tick() => on_stats(),
            signal = &mut shutdown => {
                match signal {
                    Ok(()) => info!("Received Ctrl+C, shutting down..."),
                    Err(e) => error!("Error waiting for Ctrl+C: {}", e),
                }
                stop.store(true, Ordering::Relaxed);
                return producer.await.context("Frame producer task failed");
            }
        }
    }
}

/// Deliver pattern frames at the transport rate; returns frames delivered
fn produce_frames(
    pipeline: &StreamerPipeline,
    mut generator: PatternGenerator,
    transport: TransportConfig,
    frame_limit: Option<u64>,
    stop: &AtomicBool,
) -> u64 {
    let period = transport.period();
    let mut delivered = 0;
    info!(
        "Producing '{}' frames every {:?}",
        generator.kind(),
        period
    );

    while !stop.load(Ordering::Relaxed) && frame_limit.is_none_or(|limit| delivered < limit) {
        let started = Instant::now();

        let result = pipeline.deliver(&ImageInput::panel(generator.next_frame()));
        match result {
            Ok(()) => delivered += 1,
            Err(e) => warn!("Frame {} rejected: {}", generator.frames_rendered(), e),
        }

        if let Some(remaining) = period.checked_sub(started.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    delivered
}

fn log_metrics(pipeline: &StreamerPipeline) {
    let snap = pipeline.metrics();
    info!(
        "State {:?}: {} frames sent, {} aborted, {} header errors, avg send {}",
        pipeline.state(),
        snap.frames_sent,
        snap.frames_aborted,
        snap.header_errors,
        snap.format_avg_frame()
    );
}
