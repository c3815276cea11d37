//! stillcamd - still-image camera daemon
//!
//! This daemon:
//! 1. Loads configuration (JSON file + env overrides)
//! 2. Decodes the configured source image once (arm)
//! 3. Republishes it as a timestamped frame at the configured rate
//! 4. Publishes frames to the MQTT port (or drops them with --dry-run)
//!
//! A load failure at startup is fatal; a failed tick is logged and the loop
//! keeps going.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use stillcam::{
    FrameProducer, FrameSink, ImageCodec, ImageRsCodec, MqttSink, NullSink, StillcamConfig,
};

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Republish a still image as a periodic camera frame stream"
)]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(long, env = "STILLCAM_CONFIG")]
    config: Option<PathBuf>,

    /// Drop frames instead of publishing to MQTT.
    #[arg(long)]
    dry_run: bool,

    /// Stop after this many frames (0 = run until Ctrl-C).
    #[arg(long, env = "STILLCAM_MAX_FRAMES", default_value_t = 0)]
    max_frames: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = StillcamConfig::load_from(args.config.as_deref())?;
    log::info!(
        "source: {} format={} compression_ratio={}",
        cfg.source.file_name,
        cfg.source.output_color_format,
        cfg.source.compression_ratio
    );

    if args.dry_run {
        let mut producer =
            FrameProducer::new(cfg.source.clone(), ImageRsCodec::new(), NullSink::new())?;
        run_loop(&mut producer, &cfg, args.max_frames)?;
        producer.disarm();
        log::info!("dry run finished: {} frames dropped", producer.sink().written());
    } else {
        let sink = MqttSink::connect(&cfg.mqtt)?;
        let mut producer = FrameProducer::new(cfg.source.clone(), ImageRsCodec::new(), sink)?;
        run_loop(&mut producer, &cfg, args.max_frames)?;
        producer.disarm();
        producer.into_sink().disconnect()?;
    }

    log::info!("stillcamd stopped");
    Ok(())
}

fn run_loop<C: ImageCodec, S: FrameSink>(
    producer: &mut FrameProducer<C, S>,
    cfg: &StillcamConfig,
    max_frames: u64,
) -> Result<()> {
    producer.arm()?;

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("set Ctrl-C handler")?;

    let period = cfg.tick.period();
    log::info!(
        "stillcamd running at {} fps ({} ms period)",
        cfg.tick.target_fps,
        period.as_millis()
    );

    let mut last_health_log = Instant::now();
    loop {
        if rx.try_recv().is_ok() {
            log::info!("shutdown signal received");
            break;
        }

        if let Err(e) = producer.tick() {
            log::warn!("frame dropped: {}", e);
        }

        let stats = producer.stats();
        if max_frames > 0 && stats.frames_produced >= max_frames {
            log::info!("produced {} frames, stopping", stats.frames_produced);
            break;
        }

        if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
            log::info!(
                "health frames={} source={}",
                stats.frames_produced,
                stats.source
            );
            last_health_log = Instant::now();
        }

        std::thread::sleep(period);
    }
    Ok(())
}
