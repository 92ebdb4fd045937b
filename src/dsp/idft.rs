//! Direct inverse DFT, real part only.
//!
//! `out[n] = (1/N) Σ_k (re[k]·cos(2πkn/N) − im[k]·sin(2πkn/N))`
//!
//! O(N²) summation over the table-driven trig functions. The imaginary
//! part of the result is never formed: callers hand in spectra of real
//! signals with a symmetric mask applied, whose inverse is real up to
//! rounding.

use core::f32::consts::TAU;

use super::fft::Spectrum;
use super::trig;

/// Reconstruct a real block from `spectrum` into `out`.
pub fn inverse<const N: usize>(spectrum: &Spectrum<N>, out: &mut [f32; N]) {
    let step = TAU / N as f32;

    for (n, sample) in out.iter_mut().enumerate() {
        let mut acc = 0.0f32;

        for (k, bin) in spectrum.iter().enumerate() {
            // Masked bins contribute exactly zero
            if bin.re == 0.0 && bin.im == 0.0 {
                continue;
            }

            // kn mod N gives the same angle with less float error
            let angle = step * ((k * n) % N) as f32;
            acc += bin.re * trig::cosine(angle) - bin.im * trig::sine(angle);
        }

        *sample = acc / N as f32;
    }
}
