//! S-DSP Register Definitions
//!
//! The S-DSP exposes 128 byte registers. Voice registers live in the low
//! nibble of each 16-byte row (row = voice index); global registers sit in
//! columns `$C` and `$D` of every row.

use std::fmt;

/// Number of voices on the chip.
pub const VOICE_COUNT: usize = 8;

/// Size of the register space (`$00`-`$7F`).
pub const REGISTER_COUNT: usize = 128;

/// Compute the address of a per-voice register: `base + (voice << 4)`.
#[inline]
pub fn voice_register(base: u8, voice: usize) -> u16 {
    base as u16 + ((voice as u16) << 4)
}

/// Per-voice register, addressed relative to the voice's row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceRegister {
    /// Left volume (signed) - x0
    VolumeLeft = 0x00,
    /// Right volume (signed) - x1
    VolumeRight = 0x01,
    /// Pitch (low byte) - x2
    PitchLow = 0x02,
    /// Pitch (high byte) - x3
    PitchHigh = 0x03,
    /// Source (sample) number - x4
    SourceNumber = 0x04,
    /// Current envelope value - x8
    Envelope = 0x08,
    /// Current output sample (signed, upper 8 bits) - x9
    Output = 0x09,
}

impl VoiceRegister {
    /// Offset of the register inside a voice row
    pub fn offset(&self) -> u8 {
        *self as u8
    }

    /// Absolute address of this register for `voice`
    pub fn addr(&self, voice: usize) -> u16 {
        voice_register(self.offset(), voice)
    }
}

impl fmt::Display for VoiceRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceRegister::VolumeLeft => write!(f, "VOLL"),
            VoiceRegister::VolumeRight => write!(f, "VOLR"),
            VoiceRegister::PitchLow => write!(f, "PITCHL"),
            VoiceRegister::PitchHigh => write!(f, "PITCHH"),
            VoiceRegister::SourceNumber => write!(f, "SRCN"),
            VoiceRegister::Envelope => write!(f, "ENVX"),
            VoiceRegister::Output => write!(f, "OUTX"),
        }
    }
}

/// Global (channel-independent) register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalRegister {
    /// Main volume left (signed)
    MainVolumeLeft = 0x0C,
    /// Main volume right (signed)
    MainVolumeRight = 0x1C,
    /// Pitch modulation enable, one bit per voice
    PitchModulation = 0x2D,
    /// Noise enable, one bit per voice
    NoiseEnable = 0x3D,
    /// Echo enable, one bit per voice
    EchoEnable = 0x4D,
    /// Reset, mute, echo-write and noise clock
    Flags = 0x6C,
}

impl GlobalRegister {
    /// Absolute register address
    pub fn addr(&self) -> u16 {
        *self as u16
    }
}

impl fmt::Display for GlobalRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlobalRegister::MainVolumeLeft => write!(f, "MVOLL"),
            GlobalRegister::MainVolumeRight => write!(f, "MVOLR"),
            GlobalRegister::PitchModulation => write!(f, "PMON"),
            GlobalRegister::NoiseEnable => write!(f, "NON"),
            GlobalRegister::EchoEnable => write!(f, "EON"),
            GlobalRegister::Flags => write!(f, "FLG"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_register_addresses() {
        assert_eq!(VoiceRegister::Output.addr(0), 0x09);
        assert_eq!(VoiceRegister::Output.addr(3), 0x39);
        assert_eq!(VoiceRegister::SourceNumber.addr(7), 0x74);
        assert_eq!(VoiceRegister::PitchHigh.addr(1), 0x13);
    }

    #[test]
    fn test_global_registers_are_fixed() {
        assert_eq!(GlobalRegister::MainVolumeLeft.addr(), 0x0C);
        assert_eq!(GlobalRegister::MainVolumeRight.addr(), 0x1C);
        assert_eq!(GlobalRegister::Flags.addr(), 0x6C);
    }
}
