//! `dsp-viewer`: replay an S-DSP register capture through the sound viewer.
//!
//! Stepped mode runs one pass per capture frame as fast as possible.
//! Realtime mode feeds frames into shared registers from a separate thread
//! at the capture frame rate while the viewer polls on its own schedule,
//! the way it would sit next to a running emulator.

use anyhow::{ensure, Context, Result};
use clap::Parser;
use dsp_viewer::presentation::{CsvSink, PresentationSink, TextSink};
use dsp_viewer::transition_log::{MonitorTarget, NoteLog};
use dsp_viewer::{
    CaptureSource, Observer, RegisterCapture, SharedRegisters, SoundViewer, ViewerConfig,
};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "dsp-viewer", version)]
#[command(about = "Replay an S-DSP register capture through the sound viewer")]
struct Args {
    /// Register capture (sequence of 128-byte register dumps)
    capture: PathBuf,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Note log path
    #[arg(long)]
    log: Option<PathBuf>,

    /// Monitored voice and sample source
    #[arg(long, value_name = "VOICE:SAMPLE", value_parser = parse_monitor)]
    monitor: Option<MonitorTarget>,

    /// Disable note-transition logging
    #[arg(long, conflicts_with = "monitor")]
    no_log: bool,

    /// Delay between passes in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Write per-pass channel state as CSV instead of status lines
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Feed frames at --fps and poll on the viewer schedule
    #[arg(long)]
    realtime: bool,

    /// Capture frame rate for --realtime
    #[arg(long, default_value_t = 60.0)]
    fps: f64,
}

fn parse_monitor(value: &str) -> std::result::Result<MonitorTarget, String> {
    let (voice, sample) = value
        .split_once(':')
        .ok_or_else(|| format!("expected VOICE:SAMPLE, got '{value}'"))?;
    let voice: usize = voice
        .trim()
        .parse()
        .map_err(|e| format!("invalid voice '{voice}': {e}"))?;
    let sample: u8 = sample
        .trim()
        .parse()
        .map_err(|e| format!("invalid sample '{sample}': {e}"))?;
    let target = MonitorTarget::new(voice, sample);
    target.validate().map_err(|e| e.to_string())?;
    Ok(target)
}

fn build_config(args: &Args) -> Result<ViewerConfig> {
    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    if let Some(path) = &args.log {
        config = config.with_log_path(path);
    }
    if let Some(target) = args.monitor {
        config = config.with_monitor(Some(target));
    }
    if args.no_log {
        config = config.with_monitor(None);
    }
    if let Some(ms) = args.interval_ms {
        config = config.with_poll_interval_ms(ms);
    }
    config.validate()?;
    Ok(config)
}

fn replay_stepped<S: PresentationSink>(
    capture: RegisterCapture,
    sink: S,
    config: ViewerConfig,
) -> S {
    let mut viewer = SoundViewer::new(CaptureSource::new(capture), sink, config);
    while viewer.source_mut().advance() {
        viewer.run_pass();
    }
    log::info!("replayed {} passes", viewer.passes());
    viewer.into_parts().1
}

fn replay_realtime<S: PresentationSink>(
    capture: RegisterCapture,
    sink: S,
    config: ViewerConfig,
    fps: f64,
) -> S {
    let regs = SharedRegisters::new();
    let observer = Observer::new();
    let frame_time = Duration::from_secs_f64(1.0 / fps);

    let feeder = {
        let regs = regs.clone();
        let observer = observer.clone();
        thread::spawn(move || {
            for frame in capture.frames() {
                regs.load(frame);
                thread::sleep(frame_time);
            }
            observer.close();
        })
    };

    observer.set_visible(true);
    let mut viewer = SoundViewer::new(regs, sink, config);
    viewer.run(&observer);

    if feeder.join().is_err() {
        log::warn!("capture feeder thread panicked");
    }
    log::info!("ran {} passes", viewer.passes());
    viewer.into_parts().1
}

fn replay<S: PresentationSink>(
    capture: RegisterCapture,
    sink: S,
    config: ViewerConfig,
    args: &Args,
) -> S {
    if args.realtime {
        replay_realtime(capture, sink, config, args.fps)
    } else {
        replay_stepped(capture, sink, config)
    }
}

fn report_note_log(config: &ViewerConfig) {
    let Some(target) = config.monitor else {
        return;
    };
    match NoteLog::load(&config.log_path) {
        Ok(log) => {
            let notes: Vec<_> = log.notes_for(target.sample_source).collect();
            match log.note_span() {
                Some((lo, hi)) => log::info!(
                    "{}: {} transitions for sample {} (notes {}..={})",
                    config.log_path.display(),
                    notes.len(),
                    target.sample_source,
                    lo,
                    hi
                ),
                None => log::info!("{}: no transitions", config.log_path.display()),
            }
        }
        Err(e) => log::warn!("could not read back note log: {}", e),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    ensure!(
        args.fps.is_finite() && args.fps > 0.0,
        "--fps must be a positive number"
    );
    let config = build_config(&args)?;

    let capture = RegisterCapture::load(&args.capture)
        .with_context(|| format!("loading capture {}", args.capture.display()))?;
    log::info!(
        "loaded {} register frames from {}",
        capture.len(),
        args.capture.display()
    );

    match &args.csv {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating CSV output {}", path.display()))?;
            let sink = CsvSink::new(BufWriter::new(file));
            replay(capture, sink, config.clone(), &args).finish()?;
        }
        None => {
            let sink = if args.realtime {
                TextSink::redrawing(io::stdout())
            } else {
                TextSink::new(io::stdout())
            };
            replay(capture, sink, config.clone(), &args).finish()?;
        }
    }

    report_note_log(&config);
    Ok(())
}
