//! Note detection from the voice pitch registers.
//!
//! The 14-bit pitch value is a playback-rate multiplier where `0x1000`
//! plays a sample at its native rate. Twelve note indices span one doubling
//! of the pitch value, and [`OCTAVE_OFFSET`] aligns the scale so that the
//! native rate lands on note 60.

use crate::dsp::{RegisterSource, VoiceRegister};

/// Semitone index. Twelve indices span one octave.
pub type Note = i32;

/// Octave alignment between the pitch register scale and note 0.
pub const OCTAVE_OFFSET: f64 = 7.0;

/// Octaves covered by the displayable note range.
pub const NUM_OCTAVES: i32 = 8;

/// Notes in the displayable range `[0, DISPLAY_NOTES)`.
pub const DISPLAY_NOTES: Note = NUM_OCTAVES * 12;

/// Amplitude at or below which a voice is treated as silent.
pub const SILENCE_THRESHOLD: f64 = 0.01;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Read the pitch register pair of a voice as `low | high << 8`.
///
/// The two bytes are read separately, so they can straddle an emulator
/// write.
pub fn read_pitch<R: RegisterSource + ?Sized>(source: &R, voice: usize) -> u16 {
    let lo = source.read(VoiceRegister::PitchLow.addr(voice)) as u16;
    let hi = source.read(VoiceRegister::PitchHigh.addr(voice)) as u16;
    lo | (hi << 8)
}

/// Convert a pitch register value to a note index.
///
/// `note = round(12 * (log2(pitch) - 7))`. Results outside the display range
/// are returned as-is. A pitch of zero has no note.
pub fn pitch_to_note(pitch: u16) -> Option<Note> {
    if pitch == 0 {
        return None;
    }
    let octaves = (pitch as f64).log2() - OCTAVE_OFFSET;
    Some((octaves * 12.0).round() as Note)
}

/// Note currently sounding on a voice, or `None` when it is silent.
pub fn detect_note(amplitude: f64, pitch: u16) -> Option<Note> {
    if amplitude <= SILENCE_THRESHOLD {
        None
    } else {
        pitch_to_note(pitch)
    }
}

/// Whether a note falls inside the 8-octave display range.
pub fn is_displayable(note: Note) -> bool {
    (0..DISPLAY_NOTES).contains(&note)
}

/// Split a displayable note into `(octave, key)` with `key` in `0..12`.
pub fn note_position(note: Note) -> Option<(u8, u8)> {
    is_displayable(note).then(|| ((note / 12) as u8, (note % 12) as u8))
}

/// Human-readable name such as `"C5"` or `"A#3"`.
///
/// Out-of-range notes are named too; negative octaves are kept.
pub fn note_name(note: Note) -> String {
    let key = note.rem_euclid(12) as usize;
    let octave = note.div_euclid(12);
    format!("{}{}", NOTE_NAMES[key], octave)
}
