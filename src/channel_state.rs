//! Channel state extraction from S-DSP registers.
//!
//! One [`ChannelState`] per voice is refreshed every pass. Amplitude is an
//! exponential moving average of the voice's output level; pan is read
//! straight from the volume registers with no smoothing.
//!
//! # Example
//!
//! ```
//! use dsp_viewer::{ChannelState, RegisterFile};
//! use dsp_viewer::dsp::GlobalModes;
//!
//! let mut regs = RegisterFile::new();
//! regs.write(0x09, 127); // V0OUTX
//!
//! let mut ch = ChannelState::new(0);
//! ch.update(&regs, &GlobalModes::read(&regs));
//! assert!((ch.amplitude - 0.25).abs() < 1e-9);
//! ```

use crate::dsp::{GlobalModes, GlobalRegister, RegisterSource, VoiceModes, VoiceRegister};
use crate::note::{self, Note};

/// Largest magnitude taken from a signed level register.
const LEVEL_MAX: u8 = 127;

/// Weight of the previous amplitude in the moving average (out of 4).
const AMPLITUDE_HISTORY_WEIGHT: f64 = 3.0;

/// Divisor for master volume (128) times voice volume (32).
///
/// Voice volumes are usually set low, so they are scaled down less than the
/// master volume.
const PAN_DIVISOR: f64 = 128.0 * 32.0;

/// Derived state of a single voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelState {
    /// Voice index (0-7).
    pub channel: usize,
    /// Smoothed envelope (0.0-1.0).
    pub amplitude: f64,
    /// Left pan weight (unsmoothed).
    pub pan_left: f64,
    /// Right pan weight (unsmoothed).
    pub pan_right: f64,
    /// Sounding note, or `None` when silent.
    pub note: Option<Note>,
    /// Source (sample) number the voice is playing.
    pub sample_source: u8,
    /// Raw pitch register value.
    pub pitch: u16,
    /// Echo/noise/pitch-mod switches.
    pub modes: VoiceModes,
    /// Emulator-side enable, when the source supports muting.
    pub enabled: Option<bool>,
}

impl ChannelState {
    /// Fresh state for a voice: silent, centred at zero.
    pub fn new(channel: usize) -> Self {
        Self {
            channel,
            amplitude: 0.0,
            pan_left: 0.0,
            pan_right: 0.0,
            note: None,
            sample_source: 0,
            pitch: 0,
            modes: VoiceModes::default(),
            enabled: None,
        }
    }

    /// Run the sampler and the note detector for one pass.
    pub fn update<R: RegisterSource + ?Sized>(&mut self, source: &R, globals: &GlobalModes) {
        self.sample(source);
        self.modes = globals.voice(self.channel);
        self.enabled = source.channel_enabled(self.channel);
        self.pitch = note::read_pitch(source, self.channel);
        self.note = note::detect_note(self.amplitude, self.pitch);
    }

    /// Refresh amplitude, pan and sample source from the registers.
    pub fn sample<R: RegisterSource + ?Sized>(&mut self, source: &R) {
        let ch = self.channel;

        let outx = level(source, VoiceRegister::Output.addr(ch));
        self.amplitude = smooth_amplitude(self.amplitude, outx);

        let mvol_l = level(source, GlobalRegister::MainVolumeLeft.addr());
        let mvol_r = level(source, GlobalRegister::MainVolumeRight.addr());
        let vvol_l = level(source, VoiceRegister::VolumeLeft.addr(ch));
        let vvol_r = level(source, VoiceRegister::VolumeRight.addr(ch));
        self.pan_left = pan_weight(mvol_l, vvol_l);
        self.pan_right = pan_weight(mvol_r, vvol_r);

        self.sample_source = source.read(VoiceRegister::SourceNumber.addr(ch));
    }

    /// Left meter length as a fraction: amplitude scaled by left pan.
    pub fn meter_left(&self) -> f64 {
        self.amplitude * self.pan_left
    }

    /// Right meter length as a fraction: amplitude scaled by right pan.
    pub fn meter_right(&self) -> f64 {
        self.amplitude * self.pan_right
    }

    /// `(octave, key)` of the sounding note if it is in display range.
    pub fn note_position(&self) -> Option<(u8, u8)> {
        self.note.and_then(note::note_position)
    }

    /// Whether the voice is above the silence threshold.
    pub fn is_audible(&self) -> bool {
        self.amplitude > note::SILENCE_THRESHOLD
    }
}

/// Magnitude of a signed level register, capped at 127.
fn level<R: RegisterSource + ?Sized>(source: &R, addr: u16) -> u8 {
    source.read_signed(addr).unsigned_abs().min(LEVEL_MAX)
}

/// One step of the envelope average: `(raw / 127 + 3 * previous) / 4`.
pub fn smooth_amplitude(previous: f64, raw: u8) -> f64 {
    (raw as f64 / LEVEL_MAX as f64 + AMPLITUDE_HISTORY_WEIGHT * previous)
        / (AMPLITUDE_HISTORY_WEIGHT + 1.0)
}

/// Pan weight from master and voice volume magnitudes.
pub fn pan_weight(master: u8, voice: u8) -> f64 {
    (master as f64 * voice as f64) / PAN_DIVISOR
}
