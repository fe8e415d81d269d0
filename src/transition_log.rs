//! Note-transition logging for one monitored voice/sample pairing.
//!
//! Every time the monitored voice is playing the monitored sample and its
//! note changes, one line is appended to a text log:
//!
//! ```text
//! READY
//! SAMPLE 14: 60
//! SAMPLE 14: 62
//! ```
//!
//! The file is opened, appended and closed for each record; nothing is held
//! open between passes. Write failures are reported through `log` and the
//! record is dropped; the next transition tries again.
//!
//! [`NoteLog`] reads such a file back for offline analysis.

use crate::dsp::{RegisterSource, VoiceRegister, VOICE_COUNT};
use crate::note::{self, Note};
use crate::{DspViewerError, Result};

use nom::bytes::complete::tag;
use nom::character::complete::{i32 as note_value, line_ending, u8 as sample_value};
use nom::combinator::{all_consuming, opt};
use nom::multi::many0;
use nom::sequence::{preceded, tuple};
use nom::IResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// First line of every note log.
pub const LOG_HEADER: &str = "READY";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "notes.log";

/// The voice/sample pairing whose note transitions are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorTarget {
    /// Voice index (0-7)
    pub voice: usize,
    /// Source (sample) number that must be playing on that voice
    pub sample_source: u8,
}

impl MonitorTarget {
    /// Create a new monitor target
    pub fn new(voice: usize, sample_source: u8) -> Self {
        Self {
            voice,
            sample_source,
        }
    }

    /// Check that the voice index exists on the chip
    pub fn validate(&self) -> Result<()> {
        if self.voice >= VOICE_COUNT {
            return Err(DspViewerError::ConfigError(format!(
                "monitored voice {} out of range (0-{})",
                self.voice,
                VOICE_COUNT - 1
            )));
        }
        Ok(())
    }
}

impl Default for MonitorTarget {
    fn default() -> Self {
        Self::new(0, 14)
    }
}

/// One persisted note transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord {
    /// Source (sample) number
    pub sample_source: u8,
    /// Note index, unclamped
    pub note: Note,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SAMPLE {}: {}", self.sample_source, self.note)
    }
}

/// Appends note transitions of the monitored voice to a log file
#[derive(Debug, Clone)]
pub struct TransitionLogger {
    target: MonitorTarget,
    path: PathBuf,
    previous_note: Option<Note>,
}

impl TransitionLogger {
    /// Create a logger writing to `path`. No file is touched yet.
    pub fn new(target: MonitorTarget, path: impl Into<PathBuf>) -> Self {
        Self {
            target,
            path: path.into(),
            previous_note: None,
        }
    }

    /// The monitored pairing
    pub fn target(&self) -> MonitorTarget {
        self.target
    }

    /// Log file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Note seen on the monitored voice at the last observation
    pub fn previous_note(&self) -> Option<Note> {
        self.previous_note
    }

    /// Create the log file with its header if it does not exist yet.
    ///
    /// Returns `true` if the file was created. Failures are logged, not
    /// returned.
    pub fn prepare(&self) -> bool {
        match OpenOptions::new().write(true).create_new(true).open(&self.path) {
            Ok(mut file) => match writeln!(file, "{LOG_HEADER}") {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("failed to write header to {}: {}", self.path.display(), e);
                    false
                }
            },
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => false,
            Err(e) => {
                log::warn!("failed to create note log {}: {}", self.path.display(), e);
                false
            }
        }
    }

    /// Observe the monitored voice on a register source.
    ///
    /// The note is derived from the pitch registers alone, without the
    /// silence gate applied to displayed notes. Returns `true` if a line
    /// was written.
    pub fn observe<R: RegisterSource + ?Sized>(&mut self, source: &R) -> bool {
        let voice = self.target.voice;
        let sample_source = source.read(VoiceRegister::SourceNumber.addr(voice));
        let note = note::pitch_to_note(note::read_pitch(source, voice));
        self.record(sample_source, note)
    }

    /// Apply one observation of the monitored voice.
    ///
    /// A line is written only when `sample_source` matches the target and
    /// `note` differs from the previous observation. The previous note is
    /// updated on every call, matching or not.
    pub fn record(&mut self, sample_source: u8, note: Option<Note>) -> bool {
        let mut written = false;
        if sample_source == self.target.sample_source && note != self.previous_note {
            if let Some(note) = note {
                let record = LogRecord {
                    sample_source,
                    note,
                };
                match self.append(&record) {
                    Ok(()) => {
                        log::debug!("{} -> {}", record, self.path.display());
                        written = true;
                    }
                    Err(e) => {
                        log::warn!("skipping note log write to {}: {}", self.path.display(), e);
                    }
                }
            }
        }
        self.previous_note = note;
        written
    }

    /// Open, append one record, close. The header is written first if the
    /// file is new or empty.
    fn append(&self, record: &LogRecord) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if file.metadata()?.len() == 0 {
            writeln!(file, "{LOG_HEADER}")?;
        }
        writeln!(file, "{record}")?;
        file.flush()
    }
}

/// Parsed contents of a note log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteLog {
    /// Records in file order
    pub records: Vec<LogRecord>,
}

impl NoteLog {
    /// Read and parse a log file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            DspViewerError::Other(format!(
                "Failed to read note log '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&text)
    }

    /// Parse log text. The `READY` header is required.
    pub fn parse(text: &str) -> Result<Self> {
        match all_consuming(log_file)(text) {
            Ok((_, records)) => Ok(Self { records }),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                let offset = text.len() - e.input.len();
                let line = text[..offset].matches('\n').count() + 1;
                Err(DspViewerError::ParseError(format!(
                    "malformed note log at line {line}"
                )))
            }
            Err(nom::Err::Incomplete(_)) => Err(DspViewerError::ParseError(
                "truncated note log".to_string(),
            )),
        }
    }

    /// Notes logged for one sample, in order
    pub fn notes_for(&self, sample_source: u8) -> impl Iterator<Item = Note> + '_ {
        self.records
            .iter()
            .filter(move |r| r.sample_source == sample_source)
            .map(|r| r.note)
    }

    /// Lowest and highest logged note
    pub fn note_span(&self) -> Option<(Note, Note)> {
        let min = self.records.iter().map(|r| r.note).min()?;
        let max = self.records.iter().map(|r| r.note).max()?;
        Some((min, max))
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn record(input: &str) -> IResult<&str, LogRecord> {
    let (input, (_, sample_source, _, note)) =
        tuple((tag("SAMPLE "), sample_value, tag(": "), note_value))(input)?;
    Ok((
        input,
        LogRecord {
            sample_source,
            note,
        },
    ))
}

fn log_file(input: &str) -> IResult<&str, Vec<LogRecord>> {
    let (input, _) = tag(LOG_HEADER)(input)?;
    let (input, records) = many0(preceded(line_ending, record))(input)?;
    let (input, _) = opt(line_ending)(input)?;
    Ok((input, records))
}
