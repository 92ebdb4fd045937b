//! Iterative radix-2 decimation-in-time FFT.
//!
//! ```text
//! samples ──▶ widen (im = 0) ──▶ bit-reverse ──▶ log2(N) butterfly stages ──▶ spectrum
//! ```
//!
//! One trig evaluation per stage: the per-position twiddle `w` is advanced
//! by complex multiplication with the stage root `wm`. Output is in
//! natural order. No allocation, no state between calls.

use core::f32::consts::TAU;

use num_complex::Complex32;

use super::trig;

/// Frequency-domain representation of an `N`-sample block.
pub type Spectrum<const N: usize> = [Complex32; N];

/// Zero value for spectrum initialisation.
pub const ZERO: Complex32 = Complex32::new(0.0, 0.0);

/// Forward transform of size `N`.
///
/// `N` must be a power of two. This is checked when the transform is
/// constructed, at compile time.
#[derive(Clone, Copy, Debug)]
pub struct Fft<const N: usize> {
    stages: u32,
}

impl<const N: usize> Fft<N> {
    /// Create a transform.
    ///
    /// # Panics
    ///
    /// Panics at compile time if N is not a power of 2.
    pub const fn new() -> Self {
        const { assert!(N.is_power_of_two(), "FFT size must be power of 2") };

        Self {
            stages: N.trailing_zeros(),
        }
    }

    /// Transform size.
    #[inline]
    pub const fn size(&self) -> usize {
        N
    }

    /// Number of butterfly stages, log2(N).
    #[inline]
    pub const fn stages(&self) -> u32 {
        self.stages
    }

    /// Forward transform of a real block into `out`.
    pub fn forward(&self, input: &[f32; N], out: &mut Spectrum<N>) {
        for (bin, &x) in out.iter_mut().zip(input.iter()) {
            *bin = Complex32::new(x, 0.0);
        }

        bit_reverse(out);

        for s in 1..=self.stages {
            let m = 1usize << s;
            let half = m / 2;

            let angle = -TAU / m as f32;
            let wm = Complex32::new(trig::cosine(angle), trig::sine(angle));

            for k in (0..N).step_by(m) {
                let mut w = Complex32::new(1.0, 0.0);
                for j in 0..half {
                    let t = w * out[k + j + half];
                    let u = out[k + j];

                    out[k + j] = u + t;
                    out[k + j + half] = u - t;

                    w *= wm;
                }
            }
        }
    }

    /// Forward transform of PCM samples.
    pub fn transform(&self, samples: &[i16; N]) -> Spectrum<N> {
        let mut widened = [0f32; N];
        for (w, &s) in widened.iter_mut().zip(samples.iter()) {
            *w = s as f32;
        }

        let mut spectrum = [ZERO; N];
        self.forward(&widened, &mut spectrum);
        spectrum
    }
}

impl<const N: usize> Default for Fft<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// In-place bit-reversal permutation (Gold–Rader).
///
/// `j` is the bit-mirrored counterpart of `i`, maintained incrementally
/// by a reversed-carry add. Each pair is swapped once, when `i < j`.
fn bit_reverse<T>(x: &mut [T]) {
    let n = x.len();
    let mut j = 0;

    for i in 0..n {
        if i < j {
            x.swap(i, j);
        }

        let mut m = n >> 1;
        while m >= 1 && j >= m {
            j -= m;
            m >>= 1;
        }
        j += m;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_reverse_permutation() {
        let mut idx: [usize; 8] = [0, 1, 2, 3, 4, 5, 6, 7];
        bit_reverse(&mut idx);
        assert_eq!(idx, [0, 4, 2, 6, 1, 5, 3, 7]);

        // Applying twice restores natural order
        bit_reverse(&mut idx);
        assert_eq!(idx, [0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_stage_count() {
        assert_eq!(Fft::<256>::new().stages(), 8);
        assert_eq!(Fft::<8>::new().stages(), 3);
        assert_eq!(Fft::<1>::new().stages(), 0);
    }

    #[test]
    fn test_eight_point_against_direct_dft() {
        let input = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let mut out = [ZERO; 8];
        Fft::<8>::new().forward(&input, &mut out);

        for (k, bin) in out.iter().enumerate() {
            let mut re = 0.0f64;
            let mut im = 0.0f64;
            for (n, &x) in input.iter().enumerate() {
                let a = -core::f64::consts::TAU * (k * n) as f64 / 8.0;
                re += x as f64 * a.cos();
                im += x as f64 * a.sin();
            }
            assert!((bin.re as f64 - re).abs() < 1e-3, "bin {} re {} vs {}", k, bin.re, re);
            assert!((bin.im as f64 - im).abs() < 1e-3, "bin {} im {} vs {}", k, bin.im, im);
        }
    }

    #[test]
    fn test_impulse_is_flat() {
        let mut samples = [0i16; 16];
        samples[0] = 100;
        let spectrum = Fft::<16>::new().transform(&samples);

        for bin in spectrum.iter() {
            assert!((bin.re - 100.0).abs() < 1e-3);
            assert!(bin.im.abs() < 1e-3);
        }
    }
}
