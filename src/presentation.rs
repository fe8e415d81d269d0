//! Presentation sinks
//!
//! A sink receives one [`ViewerFrame`] per pass. Sinks run on the sampling
//! thread and must return quickly. Sinks that write somewhere keep the first
//! I/O error and report it from `finish`; presenting never fails.

use crate::viewer::ViewerFrame;
use crate::Result;
use serde::Serialize;
use std::io::Write;

#[cfg(feature = "visualization")]
pub use text::{create_volume_bar, format_channel_line, TextSink};

/// Consumer of per-pass channel state
pub trait PresentationSink {
    /// Receive the state of all voices after a pass
    fn present(&mut self, frame: &ViewerFrame);
}

impl<F> PresentationSink for F
where
    F: FnMut(&ViewerFrame),
{
    fn present(&mut self, frame: &ViewerFrame) {
        self(frame)
    }
}

/// Discards every frame
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn present(&mut self, _frame: &ViewerFrame) {}
}

/// Keeps every frame in memory
#[derive(Debug, Clone, Default)]
pub struct FrameRecorder {
    frames: Vec<ViewerFrame>,
}

impl FrameRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames received so far
    pub fn frames(&self) -> &[ViewerFrame] {
        &self.frames
    }

    /// Most recent frame
    pub fn last(&self) -> Option<&ViewerFrame> {
        self.frames.last()
    }

    /// Drop recorded frames
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

impl PresentationSink for FrameRecorder {
    fn present(&mut self, frame: &ViewerFrame) {
        self.frames.push(*frame);
    }
}

#[derive(Serialize)]
struct ChannelRow {
    pass: u64,
    channel: usize,
    amplitude: f64,
    pan_left: f64,
    pan_right: f64,
    note: Option<i32>,
    sample_source: u8,
    pitch: u16,
    echo: bool,
    noise: bool,
    pitch_mod: bool,
}

/// Writes one CSV row per voice per pass
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    error: Option<csv::Error>,
}

impl<W: Write> CsvSink<W> {
    /// Create a sink writing CSV with a header row
    pub fn new(out: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(out),
            error: None,
        }
    }

    /// Flush and return the writer, or the first error hit while presenting
    pub fn finish(self) -> Result<W> {
        if let Some(e) = self.error {
            return Err(e.into());
        }
        self.writer
            .into_inner()
            .map_err(|e| crate::DspViewerError::Io(e.into_error()))
    }
}

impl<W: Write> PresentationSink for CsvSink<W> {
    fn present(&mut self, frame: &ViewerFrame) {
        if self.error.is_some() {
            return;
        }
        for ch in &frame.channels {
            let row = ChannelRow {
                pass: frame.pass,
                channel: ch.channel,
                amplitude: ch.amplitude,
                pan_left: ch.pan_left,
                pan_right: ch.pan_right,
                note: ch.note,
                sample_source: ch.sample_source,
                pitch: ch.pitch,
                echo: ch.modes.echo,
                noise: ch.modes.noise,
                pitch_mod: ch.modes.pitch_mod,
            };
            if let Err(e) = self.writer.serialize(row) {
                log::warn!("csv output stopped: {}", e);
                self.error = Some(e);
                return;
            }
        }
    }
}

#[cfg(feature = "visualization")]
mod text {
    //! Terminal status lines

    use super::PresentationSink;
    use crate::channel_state::ChannelState;
    use crate::note;
    use crate::viewer::ViewerFrame;
    use crate::Result;
    use std::fmt::Write as _;
    use std::io::{self, Write};

    const BAR_LEN: usize = 10;

    /// Create a volume bar of `max_length` cells filled to `amplitude` (0.0-1.0)
    pub fn create_volume_bar(amplitude: f64, max_length: usize) -> String {
        let normalized = amplitude.clamp(0.0, 1.0);
        let block_count = (normalized * max_length as f64) as usize;
        let blocks = "█".repeat(block_count.min(max_length));
        let spaces = " ".repeat(max_length.saturating_sub(block_count));
        format!("{}{}", blocks, spaces)
    }

    /// One status line for a voice: enable, sample, modes, note and meters.
    ///
    /// The left meter is drawn right-to-left so both meters grow outward
    /// from the centre.
    pub fn format_channel_line(ch: &ChannelState) -> String {
        let mut line = String::with_capacity(80);

        let muted = matches!(ch.enabled, Some(false));
        write!(line, "Ch{}{} ", ch.channel, if muted { "(M)" } else { "   " }).ok();
        write!(line, "Sample #{:<3} ", ch.sample_source).ok();

        line.push(if ch.modes.echo { 'E' } else { '-' });
        line.push(if ch.modes.noise { 'N' } else { '-' });
        line.push(if ch.modes.pitch_mod { 'P' } else { '-' });

        let note_label = match ch.note {
            Some(n) if note::is_displayable(n) => note::note_name(n),
            Some(_) => "???".to_string(),
            None => "---".to_string(),
        };
        write!(line, " {:<4} ", note_label).ok();

        let left: String = create_volume_bar(ch.meter_left(), BAR_LEN)
            .chars()
            .rev()
            .collect();
        let right = create_volume_bar(ch.meter_right(), BAR_LEN);
        write!(line, "{}|{}", left, right).ok();

        line
    }

    /// Writes eight status lines per pass
    pub struct TextSink<W: Write> {
        out: W,
        redraw: bool,
        drawn: bool,
        error: Option<io::Error>,
    }

    impl<W: Write> TextSink<W> {
        /// Append lines for every pass
        pub fn new(out: W) -> Self {
            Self {
                out,
                redraw: false,
                drawn: false,
                error: None,
            }
        }

        /// Overwrite the previous block in place (ANSI cursor movement)
        pub fn redrawing(out: W) -> Self {
            Self {
                redraw: true,
                ..Self::new(out)
            }
        }

        /// Return the writer, or the first error hit while presenting
        pub fn finish(mut self) -> Result<W> {
            if let Some(e) = self.error.take() {
                return Err(e.into());
            }
            self.out.flush()?;
            Ok(self.out)
        }

        fn write_frame(&mut self, frame: &ViewerFrame) -> io::Result<()> {
            if self.redraw && self.drawn {
                write!(self.out, "\x1B[{}A", frame.channels.len() + 1)?;
            }
            let clear = if self.redraw { "\x1B[2K\r" } else { "" };
            writeln!(self.out, "{clear}[pass {}]", frame.pass)?;
            for ch in &frame.channels {
                writeln!(self.out, "{clear}{}", format_channel_line(ch))?;
            }
            self.out.flush()?;
            self.drawn = true;
            Ok(())
        }
    }

    impl<W: Write> PresentationSink for TextSink<W> {
        fn present(&mut self, frame: &ViewerFrame) {
            if self.error.is_some() {
                return;
            }
            if let Err(e) = self.write_frame(frame) {
                log::warn!("status output stopped: {}", e);
                self.error = Some(e);
            }
        }
    }

}
