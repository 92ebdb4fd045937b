//! Frame filter pipeline.
//!
//! ```text
//! Frame ──▶ widen ──▶ FFT ──▶ mask ──▶ inverse DFT ──▶ narrow ──▶ Frame
//! ```
//!
//! Pure function of the input frame and the configuration. All scratch
//! (one spectrum, one float block) lives on the stack, about 3 KiB for a
//! 256-sample frame.

use crate::config::FilterConfig;
use crate::error::ConfigError;
use crate::frame::{Frame, FRAME_LEN};

use super::fft::{Fft, ZERO};
use super::idft;
use super::mask::BandPassMask;

/// Band-pass filter for one frame at a time.
#[derive(Clone, Copy, Debug)]
pub struct FrameFilter {
    fft: Fft<FRAME_LEN>,
    mask: BandPassMask,
}

impl FrameFilter {
    /// Build a filter, rejecting invalid cutoffs.
    pub fn new(config: &FilterConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mask = BandPassMask::new(
            config.sample_rate_hz,
            config.low_cutoff_hz,
            config.high_cutoff_hz,
            FRAME_LEN,
            config.mask_mode,
        );

        Ok(Self {
            fft: Fft::new(),
            mask,
        })
    }

    pub fn mask(&self) -> &BandPassMask {
        &self.mask
    }

    /// Filter one frame.
    pub fn filter_frame(&self, input: &Frame) -> Frame {
        let mut output = Frame::SILENT;
        self.filter_into(input, &mut output);
        output
    }

    /// Filter `input` into `output`.
    pub fn filter_into(&self, input: &Frame, output: &mut Frame) {
        let mut block = [0f32; FRAME_LEN];
        for (x, &s) in block.iter_mut().zip(input.samples().iter()) {
            *x = s as f32;
        }

        let mut spectrum = [ZERO; FRAME_LEN];
        self.fft.forward(&block, &mut spectrum);
        self.mask.apply(&mut spectrum);
        idft::inverse(&spectrum, &mut block);

        // `as` truncates toward zero and saturates at the i16 limits
        for (s, &x) in output.samples_mut().iter_mut().zip(block.iter()) {
            *s = x as i16;
        }
    }
}
