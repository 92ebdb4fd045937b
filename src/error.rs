//! Configuration error types

/// Filter configuration error with code and message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// C01: Sample rate is zero
    ZeroSampleRate,
    /// C02: Low cutoff is not below high cutoff
    InvertedBand,
    /// C03: Low cutoff at or above Nyquist, nothing would pass
    LowCutoffAboveNyquist,
}

impl ConfigError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ZeroSampleRate => "C01",
            Self::InvertedBand => "C02",
            Self::LowCutoffAboveNyquist => "C03",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::ZeroSampleRate => "sample rate must be non-zero",
            Self::InvertedBand => "low cutoff must be below high cutoff",
            Self::LowCutoffAboveNyquist => "low cutoff at or above Nyquist",
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl core::error::Error for ConfigError {}
