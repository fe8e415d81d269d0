//! Global flag registers
//!
//! `FLG` carries chip-wide switches; `EON`, `NON` and `PMON` carry one bit
//! per voice.

use super::registers::GlobalRegister;
use super::RegisterSource;
use bitflags::bitflags;

bitflags! {
    /// Flag Register (FLG) bitflags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DspFlags: u8 {
        /// Soft reset
        const RESET = 0x80;
        /// Mute all voices
        const MUTE = 0x40;
        /// Echo buffer writes disabled
        const ECHO_WRITE_DISABLE = 0x20;
    }
}

bitflags! {
    /// One bit per voice, as used by EON/NON/PMON
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct VoiceMask: u8 {
        /// Voice 0
        const V0 = 0x01;
        /// Voice 1
        const V1 = 0x02;
        /// Voice 2
        const V2 = 0x04;
        /// Voice 3
        const V3 = 0x08;
        /// Voice 4
        const V4 = 0x10;
        /// Voice 5
        const V5 = 0x20;
        /// Voice 6
        const V6 = 0x40;
        /// Voice 7
        const V7 = 0x80;
    }
}

impl DspFlags {
    /// Create flags from raw register value (noise clock bits are dropped)
    pub fn from_register(value: u8) -> Self {
        DspFlags::from_bits_truncate(value)
    }

    /// Check if echo output is live (echo writes not disabled)
    pub fn is_echo_enabled(&self) -> bool {
        !self.contains(DspFlags::ECHO_WRITE_DISABLE)
    }
}

impl VoiceMask {
    /// Check whether `voice` has its bit set
    pub fn has_voice(&self, voice: usize) -> bool {
        voice < 8 && self.bits() & (1 << voice) != 0
    }
}

/// Per-voice mode switches derived from the global flag registers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoiceModes {
    /// Voice feeds the echo buffer and echo is live
    pub echo: bool,
    /// Voice plays the noise generator instead of its sample
    pub noise: bool,
    /// Voice pitch is modulated by the previous voice's output
    pub pitch_mod: bool,
}

/// Snapshot of the global flag registers, read once per pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlobalModes {
    /// FLG
    pub flags: DspFlags,
    /// EON
    pub echo: VoiceMask,
    /// NON
    pub noise: VoiceMask,
    /// PMON
    pub pitch_mod: VoiceMask,
}

impl GlobalModes {
    /// Read FLG, EON, NON and PMON from a register source
    pub fn read<R: RegisterSource + ?Sized>(source: &R) -> Self {
        Self {
            flags: DspFlags::from_register(source.read(GlobalRegister::Flags.addr())),
            echo: VoiceMask::from_bits_retain(source.read(GlobalRegister::EchoEnable.addr())),
            noise: VoiceMask::from_bits_retain(source.read(GlobalRegister::NoiseEnable.addr())),
            pitch_mod: VoiceMask::from_bits_retain(
                source.read(GlobalRegister::PitchModulation.addr()),
            ),
        }
    }

    /// Mode switches for a single voice
    pub fn voice(&self, voice: usize) -> VoiceModes {
        VoiceModes {
            echo: self.echo.has_voice(voice) && self.flags.is_echo_enabled(),
            noise: self.noise.has_voice(voice),
            pitch_mod: self.pitch_mod.has_voice(voice),
        }
    }
}
