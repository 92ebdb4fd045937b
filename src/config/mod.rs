//! Module: config
//!
//! Purpose: Configuration for the band-pass filter and its pipeline.
//!
//! Architecture:
//! - Compile-time constants: frame geometry, ring sizing, retry policy
//! - `FilterConfig`: cutoffs and sample rate, validated once at startup
//! - Serial settings live with the drivers (`hal::uart`)
//!
//! The sample rate is fixed at 16 kHz. The bin math depends on it, so a
//! sender streaming at any other rate is filtered at the wrong cutoffs
//! without any error being raised.
//!
//! Safety: Safe. Immutable values only.

use crate::dsp::MaskMode;
use crate::error::ConfigError;

pub use crate::frame::{FRAME_BYTES, FRAME_LEN};

/// PCM sample rate of the incoming stream.
pub const SAMPLE_RATE_HZ: u32 = 16_000;

/// Content below this is suppressed.
pub const LOW_CUTOFF_HZ: u32 = 300;

/// Content above this is suppressed. Above Nyquist at 16 kHz, so the high
/// edge of the default band is Nyquist itself.
pub const HIGH_CUTOFF_HZ: u32 = 10_000;

/// Ingestion ring size in bytes (128 frames).
pub const RING_CAPACITY: usize = 65_536;

/// Bytes requested from the transport per read.
pub const BURST_LEN: usize = 512;

/// Commit attempts before the producer reports backpressure.
pub const MAX_COMMIT_ATTEMPTS: u32 = 10;

/// Delay between commit attempts.
pub const COMMIT_RETRY_DELAY_MS: u32 = 2;

/// Consumer poll interval while no frame is ready.
pub const CONSUMER_POLL_DELAY_MS: u32 = 1;

/// Filter parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterConfig {
    pub sample_rate_hz: u32,
    pub low_cutoff_hz: u32,
    pub high_cutoff_hz: u32,
    pub mask_mode: MaskMode,
}

impl FilterConfig {
    /// Default band: 300 Hz up to Nyquist at 16 kHz, mirrored mask.
    pub const DEFAULT: Self = Self::new(SAMPLE_RATE_HZ, LOW_CUTOFF_HZ, HIGH_CUTOFF_HZ);

    pub const fn new(sample_rate_hz: u32, low_cutoff_hz: u32, high_cutoff_hz: u32) -> Self {
        Self {
            sample_rate_hz,
            low_cutoff_hz,
            high_cutoff_hz,
            mask_mode: MaskMode::Mirrored,
        }
    }

    /// Same band with a different mask mode.
    pub const fn with_mask_mode(mut self, mode: MaskMode) -> Self {
        self.mask_mode = mode;
        self
    }

    /// Check the cutoffs against the sample rate.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.low_cutoff_hz >= self.high_cutoff_hz {
            return Err(ConfigError::InvertedBand);
        }
        // Compare 2·low against the rate to avoid the integer halving
        if self.low_cutoff_hz as u64 * 2 >= self.sample_rate_hz as u64 {
            return Err(ConfigError::LowCutoffAboveNyquist);
        }
        Ok(())
    }

    /// Width of one spectrum bin in Hz.
    pub fn bin_width_hz(&self) -> f32 {
        self.sample_rate_hz as f32 / FRAME_LEN as f32
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// Default configuration must validate
const _: () = assert!(matches!(FilterConfig::DEFAULT.validate(), Ok(())));
const _: () = assert!(BURST_LEN % FRAME_BYTES == 0 || FRAME_BYTES % BURST_LEN == 0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FilterConfig::default();
        assert_eq!(config.sample_rate_hz, 16_000);
        assert_eq!(config.low_cutoff_hz, 300);
        assert_eq!(config.high_cutoff_hz, 10_000);
        assert_eq!(config.mask_mode, MaskMode::Mirrored);
        assert_eq!(config.bin_width_hz(), 62.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert_eq!(
            FilterConfig::new(0, 300, 8_000).validate(),
            Err(ConfigError::ZeroSampleRate)
        );
        assert_eq!(
            FilterConfig::new(16_000, 8_000, 300).validate(),
            Err(ConfigError::InvertedBand)
        );
        assert_eq!(
            FilterConfig::new(16_000, 300, 300).validate(),
            Err(ConfigError::InvertedBand)
        );
        assert_eq!(
            FilterConfig::new(16_000, 8_000, 9_000).validate(),
            Err(ConfigError::LowCutoffAboveNyquist)
        );
    }

    #[test]
    fn test_with_mask_mode() {
        let config = FilterConfig::DEFAULT.with_mask_mode(MaskMode::OneSided);
        assert_eq!(config.mask_mode, MaskMode::OneSided);
        assert_eq!(config.low_cutoff_hz, LOW_CUTOFF_HZ);
    }
}
