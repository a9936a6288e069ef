use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use framecast::config::AppConfig;
use framecast::render::RenderSink;
use framecast::source::SyntheticSource;
use framecast::state::{AppState, NoopHost};
use framecast::video::{detect, FilterCell, FrameMailbox, FramePipeline, PipelineMetrics, Resolution, Rotation};
use framecast::web;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "framecast", about = "Real-time frame processing and distribution", version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address for the HTTP surface
    #[arg(long)]
    address: Option<IpAddr>,

    /// Port for the HTTP surface
    #[arg(short, long)]
    port: Option<u16>,

    /// Minimum interval between processed frames, milliseconds
    #[arg(long)]
    min_interval: Option<u64>,

    /// JPEG quality for served frames, 1-100
    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// Source frame width
    #[arg(long)]
    width: Option<u32>,

    /// Source frame height
    #[arg(long)]
    height: Option<u32>,

    /// Source rotation in degrees (0, 90, 180, 270)
    #[arg(long)]
    rotation: Option<u32>,

    /// Log level
    #[arg(short, long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Increase verbosity (-v: debug, -vv: trace)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(level: LogLevel, verbose: u8) {
    let level = match verbose {
        0 => level,
        1 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("framecast={},tower_http=info", level.as_str()))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_level, args.verbose);

    let mut config = AppConfig::load_or_default(args.config.as_deref())?;
    if let Some(address) = args.address {
        config.web.bind_address = address.to_string();
    }
    if let Some(port) = args.port {
        config.web.port = port;
    }
    if let Some(interval) = args.min_interval {
        config.pipeline.min_frame_interval_ms = interval;
    }
    if let Some(quality) = args.jpeg_quality {
        config.web.jpeg_quality = quality.clamp(1, 100);
    }
    if let Some(width) = args.width {
        config.source.width = width;
    }
    if let Some(height) = args.height {
        config.source.height = height;
    }
    if let Some(rotation) = args.rotation {
        config.source.rotation = rotation;
    }

    let rotation = match Rotation::from_degrees(config.source.rotation) {
        Some(r) => r,
        None => {
            warn!(
                degrees = config.source.rotation,
                "Unsupported rotation, using 0"
            );
            Rotation::Deg0
        }
    };
    let resolution = Resolution::new(config.source.width, config.source.height);
    if !resolution.is_valid() {
        anyhow::bail!("invalid source resolution {}", resolution);
    }

    info!(
        %resolution,
        %rotation,
        min_interval_ms = config.pipeline.min_frame_interval_ms,
        "Starting pipeline"
    );

    let filter = Arc::new(FilterCell::default());
    let render_mailbox = Arc::new(FrameMailbox::new());
    let stream_mailbox = Arc::new(FrameMailbox::new());
    let metrics = Arc::new(PipelineMetrics::default());
    let render_sink = Arc::new(RenderSink::new());

    let detector = detect::from_asset(
        config.detector.asset_path.as_deref().map(Path::new),
        config.detector.min_size,
    );

    let mut pipeline = FramePipeline::new(
        &config,
        filter.clone(),
        render_mailbox.clone(),
        stream_mailbox.clone(),
        metrics.clone(),
        detector,
    );

    let running = Arc::new(AtomicBool::new(true));

    // capture loop on its own thread, driving the pipeline at the
    // source's native rate
    let capture_thread = {
        let running = running.clone();
        let render_sink = render_sink.clone();
        let render_mailbox = render_mailbox.clone();
        let mut source = SyntheticSource::new(resolution, rotation);
        let interval = Duration::from_millis(1000 / config.source.fps.max(1) as u64);
        std::thread::spawn(move || {
            let epoch = Instant::now();
            while running.load(Ordering::Relaxed) {
                let frame = source.next_frame();
                let now_ms = epoch.elapsed().as_millis() as u64;
                match pipeline.process(&frame, now_ms) {
                    Ok(Some(_)) => {
                        render_sink.pump(&render_mailbox);
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Frame processing failed: {e}"),
                }
                std::thread::sleep(interval);
            }
            debug!("Capture loop stopped");
        })
    };

    // drain loop standing in for a GPU upload thread
    {
        let running = running.clone();
        let render_sink = render_sink.clone();
        tokio::spawn(async move {
            let mut buf = Vec::new();
            let mut ticker = tokio::time::interval(Duration::from_millis(33));
            while running.load(Ordering::Relaxed) {
                ticker.tick().await;
                if let Some(drained) = render_sink.take_pending(&mut buf) {
                    if drained.geometry_changed {
                        debug!(
                            width = drained.geometry.width,
                            height = drained.geometry.height,
                            "Render geometry changed"
                        );
                    }
                }
            }
        });
    }

    let state = AppState::new(
        filter,
        stream_mailbox,
        metrics,
        Arc::new(NoopHost),
        config.web.jpeg_quality,
    );
    let addr = SocketAddr::new(config.web.bind_address.parse::<IpAddr>()?, config.web.port);

    // The HTTP surface runs alongside the pipeline. If it fails to
    // start, capture and render keep going without it.
    tokio::spawn(async move {
        if let Err(e) = web::serve(state, addr).await {
            error!("HTTP surface unavailable: {e}");
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    running.store(false, Ordering::Relaxed);
    if capture_thread.join().is_err() {
        error!("Capture thread panicked");
    }
    Ok(())
}
