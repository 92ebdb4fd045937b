//! Signal processing: table trig, forward FFT, band-pass mask, inverse DFT.
//!
//! ```text
//! trig ◀── fft ◀──┐
//!   ▲             ├── filter
//!   └──── idft ◀──┤
//!          mask ◀─┘
//! ```
//!
//! No allocation, no shared mutable state. The cosine table is the only
//! static data.

pub mod fft;
pub mod filter;
pub mod idft;
pub mod mask;
pub mod trig;

pub use fft::{Fft, Spectrum};
pub use filter::FrameFilter;
pub use mask::{BandPassMask, MaskMode};
