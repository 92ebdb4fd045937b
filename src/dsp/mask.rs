//! Rectangular spectral band-pass mask.
//!
//! Bins outside `[k_min, k_max]` are zeroed, with
//! `bin_width = sample_rate / N`, `k_min = floor(low / bin_width)` and
//! `k_max = floor(high / bin_width)`. Hard edges, no window and no taper:
//! expect ringing on transients.

use super::fft::{Spectrum, ZERO};

/// How bins above N/2 (negative frequencies) are treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskMode {
    /// `i < k_min || i > k_max` on the raw index.
    ///
    /// Negative-frequency bins above `k_max` are dropped together with
    /// the high band, so a real pass-band tone comes back at half
    /// amplitude.
    OneSided,
    /// The same rule on the bin's frequency index `min(i, N - i)`.
    ///
    /// Each negative-frequency bin follows its positive twin, so the
    /// spectrum stays Hermitian and pass-band tones keep their amplitude.
    Mirrored,
}

impl Default for MaskMode {
    fn default() -> Self {
        MaskMode::Mirrored
    }
}

/// Band-pass mask for an `len`-point spectrum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BandPassMask {
    len: usize,
    k_min: usize,
    k_max: usize,
    mode: MaskMode,
}

impl BandPassMask {
    /// Compute the bin range for the given cutoffs.
    pub fn new(sample_rate_hz: u32, low_cutoff_hz: u32, high_cutoff_hz: u32, len: usize, mode: MaskMode) -> Self {
        let bin_width = sample_rate_hz as f32 / len as f32;

        // Cutoffs are non-negative, so truncation is floor
        let k_min = (low_cutoff_hz as f32 / bin_width) as usize;
        let k_max = (high_cutoff_hz as f32 / bin_width) as usize;

        Self {
            len,
            k_min,
            k_max,
            mode,
        }
    }

    /// Lowest kept bin.
    #[inline]
    pub fn k_min(&self) -> usize {
        self.k_min
    }

    /// Highest kept bin (may exceed N/2 when the cutoff is above Nyquist).
    #[inline]
    pub fn k_max(&self) -> usize {
        self.k_max
    }

    /// How negative-frequency bins are masked.
    #[inline]
    pub fn mode(&self) -> MaskMode {
        self.mode
    }

    /// Spectrum length this mask was built for.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether bin `i` survives the mask.
    #[inline]
    pub fn passes(&self, i: usize) -> bool {
        let k = match self.mode {
            MaskMode::OneSided => i,
            MaskMode::Mirrored => i.min(self.len - i),
        };
        k >= self.k_min && k <= self.k_max
    }

    /// Zero every bin outside the pass-band, in place.
    pub fn apply<const N: usize>(&self, spectrum: &mut Spectrum<N>) {
        debug_assert_eq!(N, self.len, "mask built for a different spectrum length");

        for (i, bin) in spectrum.iter_mut().enumerate() {
            if !self.passes(i) {
                *bin = ZERO;
            }
        }
    }

    /// Number of bins that survive.
    pub fn pass_count(&self) -> usize {
        (0..self.len).filter(|&i| self.passes(i)).count()
    }
}
