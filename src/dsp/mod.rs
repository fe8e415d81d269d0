//! S-DSP Register Access
//!
//! The viewer never models synthesis; it only reads the byte registers an
//! emulated S-DSP exposes. [`RegisterSource`] is that read contract.
//! [`RegisterFile`] is a plain in-memory register space, and
//! [`SharedRegisters`] wraps one so an emulation thread can keep writing
//! while the viewer samples. No cross-register atomicity is offered: each
//! read sees the byte as of that read.

pub mod flags;
pub mod registers;

pub use flags::{DspFlags, GlobalModes, VoiceMask, VoiceModes};
pub use registers::{
    voice_register, GlobalRegister, VoiceRegister, REGISTER_COUNT, VOICE_COUNT,
};

use parking_lot::RwLock;
use std::sync::Arc;

/// Readable byte-addressed chip state.
///
/// Reads never fail and never block for long; every address returns some
/// 8-bit value.
pub trait RegisterSource {
    /// Read one register byte
    fn read(&self, addr: u16) -> u8;

    /// Whether `voice` is enabled in the emulator's output.
    ///
    /// Returns `None` when the source has no notion of per-voice muting.
    fn channel_enabled(&self, _voice: usize) -> Option<bool> {
        None
    }

    /// Read a register and reinterpret it as signed
    fn read_signed(&self, addr: u16) -> i8 {
        self.read(addr) as i8
    }
}

impl<T: RegisterSource + ?Sized> RegisterSource for &T {
    fn read(&self, addr: u16) -> u8 {
        (**self).read(addr)
    }

    fn channel_enabled(&self, voice: usize) -> Option<bool> {
        (**self).channel_enabled(voice)
    }
}

impl<T: RegisterSource + ?Sized> RegisterSource for Box<T> {
    fn read(&self, addr: u16) -> u8 {
        (**self).read(addr)
    }

    fn channel_enabled(&self, voice: usize) -> Option<bool> {
        (**self).channel_enabled(voice)
    }
}

/// In-memory S-DSP register space with a per-voice enable mask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFile {
    regs: [u8; REGISTER_COUNT],
    channel_mask: u8,
}

impl RegisterFile {
    /// Create a zeroed register file with every voice enabled
    pub fn new() -> Self {
        Self {
            regs: [0; REGISTER_COUNT],
            channel_mask: 0xFF,
        }
    }

    /// Build a register file from a full register dump
    pub fn from_registers(regs: [u8; REGISTER_COUNT]) -> Self {
        Self {
            regs,
            channel_mask: 0xFF,
        }
    }

    /// Write one register. Addresses mirror every 128 bytes.
    pub fn write(&mut self, addr: u16, value: u8) {
        self.regs[addr as usize % REGISTER_COUNT] = value;
    }

    /// Replace the whole register space, keeping the enable mask
    pub fn load(&mut self, regs: &[u8; REGISTER_COUNT]) {
        self.regs = *regs;
    }

    /// Copy of the current register space
    pub fn dump_registers(&self) -> [u8; REGISTER_COUNT] {
        self.regs
    }

    /// Enable or mute a voice
    pub fn set_channel_enabled(&mut self, voice: usize, enabled: bool) {
        if voice >= VOICE_COUNT {
            return;
        }
        if enabled {
            self.channel_mask |= 1 << voice;
        } else {
            self.channel_mask &= !(1 << voice);
        }
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterSource for RegisterFile {
    fn read(&self, addr: u16) -> u8 {
        self.regs[addr as usize % REGISTER_COUNT]
    }

    fn channel_enabled(&self, voice: usize) -> Option<bool> {
        (voice < VOICE_COUNT).then(|| self.channel_mask & (1 << voice) != 0)
    }
}

/// Cloneable handle to a register file shared with an emulation thread
#[derive(Debug, Clone, Default)]
pub struct SharedRegisters {
    inner: Arc<RwLock<RegisterFile>>,
}

impl SharedRegisters {
    /// Create a zeroed shared register file
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing register file
    pub fn from_file(file: RegisterFile) -> Self {
        Self {
            inner: Arc::new(RwLock::new(file)),
        }
    }

    /// Write one register
    pub fn write(&self, addr: u16, value: u8) {
        self.inner.write().write(addr, value);
    }

    /// Replace the whole register space in one step
    pub fn load(&self, regs: &[u8; REGISTER_COUNT]) {
        self.inner.write().load(regs);
    }

    /// Enable or mute a voice
    pub fn set_channel_enabled(&self, voice: usize, enabled: bool) {
        self.inner.write().set_channel_enabled(voice, enabled);
    }

    /// Copy of the current register space
    pub fn dump_registers(&self) -> [u8; REGISTER_COUNT] {
        self.inner.read().dump_registers()
    }
}

impl RegisterSource for SharedRegisters {
    fn read(&self, addr: u16) -> u8 {
        self.inner.read().read(addr)
    }

    fn channel_enabled(&self, voice: usize) -> Option<bool> {
        self.inner.read().channel_enabled(voice)
    }
}
