//! Sound viewer for emulated S-DSP audio chips
//!
//! Samples the register state of an 8-voice S-DSP at a fixed cadence and
//! derives per-voice signals for live inspection: a smoothed amplitude
//! envelope, left/right pan weights and the currently sounding note. Note
//! transitions of one monitored voice/sample pairing are appended to a
//! plain-text log for offline analysis of pitch behaviour across runs.
//!
//! # Features
//! - Exponentially smoothed per-voice envelope from the `OUTX` registers
//! - Instantaneous pan from master and voice volume registers
//! - Note detection from the 14-bit pitch register pair, gated on silence
//! - Idempotent, best-effort note-transition logging
//! - Soft real-time poll scheduler with no missed-tick replay
//! - Replay of raw register captures
//!
//! # Crate feature flags
//! - `visualization` (default): Terminal status-line sink (`presentation::TextSink`)
//! - `cli` (opt-in): The `dsp-viewer` capture replayer binary
//!
//! # Quick start
//! ```no_run
//! use dsp_viewer::{RegisterFile, SoundViewer, ViewerConfig, ViewerFrame};
//!
//! let mut regs = RegisterFile::new();
//! regs.write(0x0C, 0x7F); // MVOLL
//! regs.write(0x09, 0x40); // V0OUTX
//!
//! let sink = |frame: &ViewerFrame| println!("{:?}", frame.channels[0].note);
//! let mut viewer = SoundViewer::new(regs, sink, ViewerConfig::default());
//! viewer.show();
//! viewer.run_pass();
//! ```

#![warn(missing_docs)]

pub mod capture; // Register Capture Replay
pub mod channel_state; // Channel Sampler
pub mod config; // Viewer Configuration
pub mod dsp; // Register Source & Address Map
pub mod note; // Note Detector
pub mod presentation; // Presentation Sinks
pub mod scheduler; // Poll Scheduler
pub mod transition_log; // Note-Transition Logging
pub mod viewer; // Sampling Session

/// Error types for viewer operations
#[derive(thiserror::Error, Debug)]
pub enum DspViewerError {
    /// Error while parsing a capture or log file
    #[error("Parse error: {0}")]
    ParseError(String),

    /// IO error from filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Malformed JSON configuration
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV output error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for DspViewerError {
    /// Converts a String into `DspViewerError::Other`.
    ///
    /// Prefer the specific variants (`ParseError`, `ConfigError`) where the
    /// failure kind is known.
    fn from(msg: String) -> Self {
        DspViewerError::Other(msg)
    }
}

impl From<&str> for DspViewerError {
    /// Converts a string slice into `DspViewerError::Other`.
    fn from(msg: &str) -> Self {
        DspViewerError::Other(msg.to_string())
    }
}

/// Result type for viewer operations
pub type Result<T> = std::result::Result<T, DspViewerError>;

// Public API exports
pub use capture::{CaptureSource, RegisterCapture};
pub use channel_state::ChannelState;
pub use config::ViewerConfig;
pub use dsp::{RegisterFile, RegisterSource, SharedRegisters, VOICE_COUNT};
pub use note::{detect_note, pitch_to_note, Note};
pub use presentation::{FrameRecorder, PresentationSink};
pub use scheduler::{PollScheduler, SchedulerState};
pub use transition_log::{MonitorTarget, NoteLog, TransitionLogger};
pub use viewer::{Observer, SoundViewer, ViewerFrame};
