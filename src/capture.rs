//! Raw Register Capture Format
//!
//! A capture is a flat sequence of 128-byte frames, each a full S-DSP
//! register dump (`$00`-`$7F`) taken at one instant. [`CaptureSource`]
//! replays a capture as a [`RegisterSource`], one frame at a time.

use crate::dsp::{RegisterFile, RegisterSource, REGISTER_COUNT};
use crate::{DspViewerError, Result};
use std::fs;
use std::path::Path;

/// One register dump
pub type RegisterFrame = [u8; REGISTER_COUNT];

/// Sequence of register dumps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterCapture {
    frames: Vec<RegisterFrame>,
}

impl RegisterCapture {
    /// Create an empty capture
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse raw register frames.
    /// Expects data as a sequence of 128-byte frames.
    pub fn parse_frames(data: &[u8]) -> Result<Self> {
        if data.len() % REGISTER_COUNT != 0 {
            return Err(DspViewerError::ParseError(format!(
                "Data length {} is not a multiple of {} (expected register frames)",
                data.len(),
                REGISTER_COUNT
            )));
        }

        let frames = data
            .chunks_exact(REGISTER_COUNT)
            .map(|chunk| {
                let mut frame = [0u8; REGISTER_COUNT];
                frame.copy_from_slice(chunk);
                frame
            })
            .collect();

        Ok(Self { frames })
    }

    /// Load a capture file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| {
            DspViewerError::Other(format!(
                "Failed to read capture '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse_frames(&data)
    }

    /// Append a frame, e.g. from [`RegisterFile::dump_registers`]
    pub fn push(&mut self, frame: RegisterFrame) {
        self.frames.push(frame);
    }

    /// Serialize back to the flat on-disk layout
    pub fn to_bytes(&self) -> Vec<u8> {
        self.frames.iter().flatten().copied().collect()
    }

    /// Write the capture to disk
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_bytes())?;
        Ok(())
    }

    /// All frames in order
    pub fn frames(&self) -> &[RegisterFrame] {
        &self.frames
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the capture holds no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Replays a capture frame by frame
#[derive(Debug, Clone)]
pub struct CaptureSource {
    capture: RegisterCapture,
    position: usize,
    regs: RegisterFile,
}

impl CaptureSource {
    /// Create a source positioned before the first frame. All registers read
    /// as zero until [`advance`](Self::advance) is called.
    pub fn new(capture: RegisterCapture) -> Self {
        Self {
            capture,
            position: 0,
            regs: RegisterFile::new(),
        }
    }

    /// Load the next frame. Returns `false` once the capture is exhausted,
    /// leaving the last frame in place.
    pub fn advance(&mut self) -> bool {
        match self.capture.frames.get(self.position) {
            Some(frame) => {
                self.regs.load(frame);
                self.position += 1;
                true
            }
            None => false,
        }
    }

    /// Number of frames loaded so far
    pub fn position(&self) -> usize {
        self.position
    }

    /// Frames not yet loaded
    pub fn remaining(&self) -> usize {
        self.capture.len() - self.position
    }

    /// Rewind to before the first frame
    pub fn rewind(&mut self) {
        self.position = 0;
        self.regs = RegisterFile::new();
    }

    /// Underlying capture
    pub fn capture(&self) -> &RegisterCapture {
        &self.capture
    }
}

impl RegisterSource for CaptureSource {
    fn read(&self, addr: u16) -> u8 {
        self.regs.read(addr)
    }

    fn channel_enabled(&self, voice: usize) -> Option<bool> {
        self.regs.channel_enabled(voice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_frame() {
        let data = vec![0u8; 128];
        let capture = RegisterCapture::parse_frames(&data).unwrap();
        assert_eq!(capture.len(), 1);
        assert_eq!(capture.frames()[0], [0u8; 128]);
    }

    #[test]
    fn test_parse_multiple_frames() {
        let data = vec![0u8; 384]; // 3 frames
        let capture = RegisterCapture::parse_frames(&data).unwrap();
        assert_eq!(capture.len(), 3);
    }

    #[test]
    fn test_parse_invalid_length() {
        let data = vec![0u8; 129];
        let result = RegisterCapture::parse_frames(&data);
        assert!(matches!(result, Err(DspViewerError::ParseError(_))));
    }

    #[test]
    fn test_bytes_layout() {
        let mut capture = RegisterCapture::new();
        let mut frame = [0u8; 128];
        frame[0x04] = 14;
        capture.push(frame);
        frame[0x04] = 3;
        capture.push(frame);

        let bytes = capture.to_bytes();
        assert_eq!(bytes.len(), 256);
        assert_eq!(bytes[0x04], 14);
        assert_eq!(bytes[128 + 0x04], 3);
    }

    #[test]
    fn test_source_steps_through_frames() {
        let mut capture = RegisterCapture::new();
        for n in 1..=3u8 {
            let mut frame = [0u8; 128];
            frame[0x0C] = n;
            capture.push(frame);
        }

        let mut source = CaptureSource::new(capture);
        assert_eq!(source.read(0x0C), 0);
        assert_eq!(source.remaining(), 3);

        for n in 1..=3u8 {
            assert!(source.advance());
            assert_eq!(source.read(0x0C), n);
        }
        assert!(!source.advance());
        assert_eq!(source.read(0x0C), 3);
        assert_eq!(source.position(), 3);

        source.rewind();
        assert_eq!(source.read(0x0C), 0);
    }
}
