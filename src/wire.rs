//! Output framing.
//!
//! Every filtered frame leaves the device as:
//!
//! ```text
//! [0xAA][512 payload bytes, PCM16LE][0xBB]
//! ```
//!
//! Delimiter values are not escaped inside the payload. The encoder keeps
//! that wire format as is. [`FrameDecoder`] (receiving side) counts payload
//! bytes instead of scanning for `0xBB`, so a sample byte equal to a
//! delimiter cannot cut a frame short; it only matters while hunting for a
//! start byte after a resync.

use crate::frame::{Frame, FRAME_BYTES};

/// Start-of-frame byte.
pub const START_DELIMITER: u8 = 0xAA;

/// End-of-frame byte.
pub const END_DELIMITER: u8 = 0xBB;

/// Bytes per framed frame on the wire.
pub const WIRE_FRAME_BYTES: usize = FRAME_BYTES + 2;

/// Encode `frame` with its delimiters into `out`.
#[inline]
pub fn encode_frame(frame: &Frame, out: &mut [u8; WIRE_FRAME_BYTES]) {
    out[0] = START_DELIMITER;
    for (pair, sample) in out[1..=FRAME_BYTES]
        .chunks_exact_mut(2)
        .zip(frame.samples().iter())
    {
        pair.copy_from_slice(&sample.to_le_bytes());
    }
    out[WIRE_FRAME_BYTES - 1] = END_DELIMITER;
}

/// Decoder state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Looking for a start delimiter.
    Hunt,
    /// Collecting payload bytes.
    Payload,
    /// Payload complete, expecting the end delimiter.
    End,
}

/// Byte-at-a-time decoder for the framed output stream.
///
/// Used on the receiving host and in tests. Malformed frames (wrong end
/// byte) are discarded and counted, and the decoder hunts for the next
/// start byte.
pub struct FrameDecoder {
    state: State,
    payload: [u8; FRAME_BYTES],
    filled: usize,
    resyncs: u32,
}

impl FrameDecoder {
    pub const fn new() -> Self {
        Self {
            state: State::Hunt,
            payload: [0; FRAME_BYTES],
            filled: 0,
            resyncs: 0,
        }
    }

    /// Feed one byte. Returns a frame when one completes.
    pub fn push(&mut self, byte: u8) -> Option<Frame> {
        match self.state {
            State::Hunt => {
                if byte == START_DELIMITER {
                    self.filled = 0;
                    self.state = State::Payload;
                }
                None
            }
            State::Payload => {
                self.payload[self.filled] = byte;
                self.filled += 1;
                if self.filled == FRAME_BYTES {
                    self.state = State::End;
                }
                None
            }
            State::End => {
                self.state = State::Hunt;
                if byte == END_DELIMITER {
                    Some(Frame::from_le_bytes(&self.payload))
                } else {
                    self.resyncs = self.resyncs.saturating_add(1);
                    // The stray byte may itself open the next frame
                    if byte == START_DELIMITER {
                        self.filled = 0;
                        self.state = State::Payload;
                    }
                    None
                }
            }
        }
    }

    /// Feed a slice, calling `on_frame` for every completed frame.
    pub fn push_slice(&mut self, bytes: &[u8], mut on_frame: impl FnMut(Frame)) {
        for &byte in bytes {
            if let Some(frame) = self.push(byte) {
                on_frame(frame);
            }
        }
    }

    /// Frames discarded because the end delimiter was missing.
    pub fn resyncs(&self) -> u32 {
        self.resyncs
    }

    /// True while no frame is partially decoded.
    pub fn is_idle(&self) -> bool {
        self.state == State::Hunt
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FRAME_LEN;

    #[test]
    fn test_encode_layout() {
        let frame = Frame::from_samples([0x0102; FRAME_LEN]);
        let mut out = [0u8; WIRE_FRAME_BYTES];
        encode_frame(&frame, &mut out);

        assert_eq!(out[0], START_DELIMITER);
        assert_eq!(out[1], 0x02);
        assert_eq!(out[2], 0x01);
        assert_eq!(out[WIRE_FRAME_BYTES - 1], END_DELIMITER);
    }

    #[test]
    fn test_decoder_skips_leading_noise() {
        let frame = Frame::from_samples([-7; FRAME_LEN]);
        let mut wire = [0u8; WIRE_FRAME_BYTES];
        encode_frame(&frame, &mut wire);

        let mut decoder = FrameDecoder::new();
        let mut got = None;
        decoder.push_slice(&[0x00, 0x13, 0xBB], |f| got = Some(f));
        assert!(got.is_none());
        decoder.push_slice(&wire, |f| got = Some(f));
        assert_eq!(got, Some(frame));
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_decoder_tolerates_delimiter_valued_payload() {
        // 0xBBAA little-endian puts both delimiter values inside the payload
        let frame = Frame::from_samples([0xBBAAu16 as i16; FRAME_LEN]);
        let mut wire = [0u8; WIRE_FRAME_BYTES];
        encode_frame(&frame, &mut wire);

        let mut decoder = FrameDecoder::new();
        let mut count = 0;
        decoder.push_slice(&wire, |f| {
            assert_eq!(f, frame);
            count += 1;
        });
        assert_eq!(count, 1);
        assert_eq!(decoder.resyncs(), 0);
    }

    #[test]
    fn test_decoder_resyncs_on_bad_end() {
        let frame = Frame::from_samples([1; FRAME_LEN]);
        let mut wire = [0u8; WIRE_FRAME_BYTES];
        encode_frame(&frame, &mut wire);

        let mut corrupted = wire;
        corrupted[WIRE_FRAME_BYTES - 1] = 0x00;

        let mut decoder = FrameDecoder::new();
        let mut frames = 0;
        decoder.push_slice(&corrupted, |_| frames += 1);
        decoder.push_slice(&wire, |_| frames += 1);

        assert_eq!(frames, 1);
        assert_eq!(decoder.resyncs(), 1);
    }
}
