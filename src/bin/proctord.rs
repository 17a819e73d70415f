//! proctord - camera proctoring daemon
//!
//! This daemon:
//! 1. Opens the configured camera (V4L2 webcam or `stub://` synthetic source)
//! 2. Builds the configured face detector backend
//! 3. Samples one frame every N and reduces detector output to a status
//! 4. Renders the current status line until interrupted or the stream ends
//!
//! Frames never leave memory. Nothing is written to disk.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use gaze_proctor::{
    open_source, CameraError, CameraFrame, DetectorRegistry, FrameSource, ModelSelection,
    PipelineCoordinator, PipelineState, ProctorConfig,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(
    name = "proctord",
    about = "Monitor a webcam for exam proctoring (face presence, face count, gaze direction)"
)]
struct Args {
    /// Camera device path or stub:// URI (overrides PROCTOR_CAMERA_DEVICE)
    #[arg(long, value_name = "DEVICE")]
    device: Option<String>,

    /// Run the detector on every Nth frame
    #[arg(long, value_name = "FRAMES")]
    interval: Option<u32>,

    /// Detector backend name
    #[arg(long, value_name = "NAME")]
    backend: Option<String>,

    /// Face model variant (short|full)
    #[arg(long, value_name = "MODEL")]
    model: Option<ModelSelection>,

    /// Path to the detector model file
    #[arg(long, value_name = "PATH")]
    model_path: Option<PathBuf>,

    /// Stop after this many camera frames
    #[arg(long, value_name = "COUNT")]
    frames: Option<u64>,

    /// List detector backends in this build and exit
    #[arg(long)]
    list_backends: bool,

    /// UI mode for the stderr status line (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

/// Ends the stream after a fixed number of frames.
struct FrameBudget {
    inner: Box<dyn FrameSource>,
    remaining: u64,
}

impl FrameSource for FrameBudget {
    fn start(&mut self) -> Result<(), CameraError> {
        self.inner.start()
    }

    fn next_frame(&mut self) -> Result<CameraFrame, CameraError> {
        if self.remaining == 0 {
            return Err(CameraError::EndOfStream);
        }
        self.remaining -= 1;
        self.inner.next_frame()
    }

    fn stop(&mut self) {
        self.inner.stop();
    }

    fn describe(&self) -> String {
        format!("{} (limit {} frames)", self.inner.describe(), self.remaining)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let registry = DetectorRegistry::with_builtin();
    if args.list_backends {
        for name in registry.list() {
            println!("{name}");
        }
        return Ok(());
    }

    let mut cfg = ProctorConfig::load()?;
    if let Some(device) = args.device {
        cfg.camera.device = device;
    }
    if let Some(interval) = args.interval {
        cfg.sampling_interval = interval;
    }
    if let Some(backend) = args.backend {
        cfg.detector.backend = backend;
    }
    if let Some(model) = args.model {
        cfg.detector.model = model;
    }
    if let Some(path) = args.model_path {
        cfg.detector.model_path = Some(path);
    }
    cfg.validate()?;

    let is_tty = std::io::stderr().is_terminal();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui = ui::Ui::from_args(Some(&args.ui), is_tty, stdout_is_tty);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst))
            .map_err(|e| anyhow!("failed to install signal handler: {e}"))?;
    }

    let detector = {
        let _step = ui.step("Load face detector");
        registry.create(
            &cfg.detector.backend,
            &cfg.detector_options(),
            cfg.detector.model_path.as_deref(),
        )?
    };

    let source = match open_source(&cfg.camera_config()) {
        Ok(source) => Some(source),
        Err(err) => {
            log::warn!("no camera source: {:#}", err);
            None
        }
    };
    let source = match (source, args.frames) {
        (Some(inner), Some(limit)) => Some(Box::new(FrameBudget {
            inner,
            remaining: limit,
        }) as Box<dyn FrameSource>),
        (source, _) => source,
    };

    let mut session = PipelineCoordinator::new(cfg.pipeline_config(), source, detector)?;
    let handle = session.status();
    let line = Arc::new(Mutex::new(ui.status_line(&handle.render())));
    {
        let line = line.clone();
        session.on_status(move |status| {
            if let Ok(mut line) = line.lock() {
                line.update(status.as_str());
            }
        });
    }

    let state = match session.start()? {
        PipelineState::Running => session.run(&shutdown)?,
        other => other,
    };
    let stats = session.stats();
    drop(session);

    let summary = format!(
        "{} frames, {} checked, {} dropped busy, {} timeouts",
        stats.frames_seen, stats.results_processed, stats.dropped_busy, stats.timeouts
    );
    // The session dropped its observers on teardown, so this is the last reference.
    if let Ok(line) = Arc::try_unwrap(line) {
        line.into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .finish(&summary);
    }

    if state == PipelineState::Failed {
        return Err(anyhow!("monitoring session failed: {}", handle.render()));
    }
    log::info!("proctord exiting: {}", summary);
    Ok(())
}
