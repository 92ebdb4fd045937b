//! Module: frame
//!
//! Purpose: PCM sample and frame types. A frame is the atomic unit the
//! filter works on: 256 signed 16-bit samples, 512 bytes on the wire.
//!
//! Architecture:
//! - Fixed length, no heap (frames live on the stack or inside the ring)
//! - Wire order is little-endian, matching the PCM16LE stream from the sender
//!
//! Safety: Safe. No unsafe blocks. Copy types only.

/// One PCM sample.
pub type Sample = i16;

/// Samples per frame. Also the transform size.
pub const FRAME_LEN: usize = 256;

/// Bytes per frame on the wire.
pub const FRAME_BYTES: usize = FRAME_LEN * core::mem::size_of::<Sample>();

/// A block of `FRAME_LEN` samples filtered as one unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    samples: [Sample; FRAME_LEN],
}

impl Frame {
    /// All-zero frame.
    pub const SILENT: Self = Self {
        samples: [0; FRAME_LEN],
    };

    /// Wrap an array of samples.
    pub const fn from_samples(samples: [Sample; FRAME_LEN]) -> Self {
        Self { samples }
    }

    /// Decode a frame from little-endian PCM bytes.
    pub fn from_le_bytes(bytes: &[u8; FRAME_BYTES]) -> Self {
        let mut samples = [0; FRAME_LEN];
        for (sample, pair) in samples.iter_mut().zip(bytes.chunks_exact(2)) {
            *sample = Sample::from_le_bytes([pair[0], pair[1]]);
        }
        Self { samples }
    }

    /// Encode into little-endian PCM bytes.
    pub fn write_le_bytes(&self, out: &mut [u8; FRAME_BYTES]) {
        for (pair, sample) in out.chunks_exact_mut(2).zip(self.samples.iter()) {
            pair.copy_from_slice(&sample.to_le_bytes());
        }
    }

    /// Encode into a new byte array.
    pub fn to_le_bytes(&self) -> [u8; FRAME_BYTES] {
        let mut out = [0u8; FRAME_BYTES];
        self.write_le_bytes(&mut out);
        out
    }

    pub fn samples(&self) -> &[Sample; FRAME_LEN] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [Sample; FRAME_LEN] {
        &mut self.samples
    }

    /// Arithmetic mean of the samples.
    pub fn mean(&self) -> f32 {
        let sum: i32 = self.samples.iter().map(|&s| s as i32).sum();
        sum as f32 / FRAME_LEN as f32
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> u16 {
        self.samples
            .iter()
            .map(|s| s.unsigned_abs())
            .max()
            .unwrap_or(0)
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::SILENT
    }
}

impl From<[Sample; FRAME_LEN]> for Frame {
    fn from(samples: [Sample; FRAME_LEN]) -> Self {
        Self::from_samples(samples)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_byte_size() {
        assert_eq!(FRAME_BYTES, 512);
    }

    #[test]
    fn test_le_decode_order() {
        let mut bytes = [0u8; FRAME_BYTES];
        bytes[0] = 0x34;
        bytes[1] = 0x12;
        bytes[2] = 0xFF;
        bytes[3] = 0xFF;
        bytes[FRAME_BYTES - 2] = 0x00;
        bytes[FRAME_BYTES - 1] = 0x80;

        let frame = Frame::from_le_bytes(&bytes);
        assert_eq!(frame.samples()[0], 0x1234);
        assert_eq!(frame.samples()[1], -1);
        assert_eq!(frame.samples()[FRAME_LEN - 1], i16::MIN);
        assert_eq!(frame.to_le_bytes(), bytes);
    }

    #[test]
    fn test_mean_and_peak() {
        let mut frame = Frame::SILENT;
        assert_eq!(frame.mean(), 0.0);
        assert_eq!(frame.peak(), 0);

        frame.samples_mut()[0] = i16::MIN;
        frame.samples_mut()[1] = 100;
        assert_eq!(frame.peak(), 32768);

        let constant = Frame::from_samples([512; FRAME_LEN]);
        assert_eq!(constant.mean(), 512.0);
    }
}
