//! Cosine lookup table and table-driven sine/cosine.
//!
//! 360-entry table, one entry per degree over a full revolution.
//! Values between entries are linearly interpolated. Worst-case absolute
//! error is about 4e-5, well inside the 0.005 the transforms need.

use core::f32::consts::{FRAC_PI_2, TAU};

/// Number of entries in the cosine table (one per degree).
pub const TABLE_SIZE: usize = 360;

const INV_TAU: f32 = 1.0 / TAU;

/// Pre-computed cosine table
///
/// Index i holds cos(i°). Index 0 = 1.0, 90 = 0.0, 180 = -1.0, 270 = 0.0.
/// Built at compile time, read-only for the life of the program.
pub static COSINE_TABLE: [f32; TABLE_SIZE] = {
    let mut table = [0f32; TABLE_SIZE];
    let mut i = 0;
    while i < TABLE_SIZE {
        let angle = (i as f64) * core::f64::consts::TAU / (TABLE_SIZE as f64);
        // Series lands a hair off zero at the quarter turns
        table[i] = if i == 90 || i == 270 { 0.0 } else { const_cos(angle) as f32 };
        i += 1;
    }
    table
};

/// Const-compatible cosine for angles in [0, 2π)
///
/// Folds into [0, π/2] by symmetry, then a Taylor series through x¹⁴
/// (truncation error below 1e-8 on that interval).
const fn const_cos(x: f64) -> f64 {
    use core::f64::consts::{FRAC_PI_2, PI, TAU};

    // cos(x) = cos(2π - x)
    let mut x = x;
    if x > PI {
        x = TAU - x;
    }

    // cos(x) = -cos(π - x)
    let mut sign = 1.0;
    if x > FRAC_PI_2 {
        x = PI - x;
        sign = -1.0;
    }

    let x2 = x * x;
    let mut term = 1.0;
    let mut sum = 1.0;
    let mut n = 1;
    while n <= 7 {
        // term *= -x² / ((2n-1)(2n))
        term = -term * x2 / (((2 * n - 1) * (2 * n)) as f64);
        sum += term;
        n += 1;
    }

    sign * sum
}

/// Table-driven cosine.
///
/// The absolute value of the angle is wrapped into [0, 2π) and mapped to a
/// fractional degree index `(angle / 2π) * 360`, interpolating between that
/// entry and the next (wrapping 359 → 0).
#[inline]
pub fn cosine(angle: f32) -> f32 {
    let mut angle = if angle < 0.0 { -angle } else { angle };

    if angle >= TAU {
        let turns = (angle * INV_TAU) as u32;
        angle -= TAU * turns as f32;
        // Rounding can overshoot by one turn; cos is even
        if angle < 0.0 {
            angle = -angle;
        }
    }

    let index_f = angle * INV_TAU * TABLE_SIZE as f32;
    let whole = index_f as usize;
    let frac = index_f - whole as f32;

    let index = whole % TABLE_SIZE;
    let next = if index == TABLE_SIZE - 1 { 0 } else { index + 1 };

    COSINE_TABLE[index] * (1.0 - frac) + COSINE_TABLE[next] * frac
}

/// Table-driven sine via sin(θ) = cos(π/2 − θ).
///
/// Negative angles (`-0.0` included) are handled as -sin(|θ|): only the
/// sign flips, the phase is not mirrored.
#[inline]
pub fn sine(angle: f32) -> f32 {
    let (sign, angle) = if angle.is_sign_negative() {
        (-1.0, -angle)
    } else {
        (1.0, angle)
    };

    let mut shifted = FRAC_PI_2 - angle;
    if shifted < 0.0 {
        shifted += TAU;
    }

    sign * cosine(shifted)
}

/// Both values at once, `(sin, cos)`.
#[inline]
pub fn sin_cos(angle: f32) -> (f32, f32) {
    (sine(angle), cosine(angle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_cardinal_points() {
        assert!((COSINE_TABLE[0] - 1.0).abs() < 1e-7);
        assert_eq!(COSINE_TABLE[90], 0.0);
        assert!((COSINE_TABLE[180] + 1.0).abs() < 1e-7);
        assert_eq!(COSINE_TABLE[270], 0.0);
    }

    #[test]
    fn test_table_matches_std() {
        for (i, &v) in COSINE_TABLE.iter().enumerate() {
            let exact = (i as f64).to_radians().cos() as f32;
            assert!((v - exact).abs() < 1e-6, "entry {} = {}, expected {}", i, v, exact);
        }
    }

    #[test]
    fn test_negative_zero_flips_sign() {
        assert_eq!(sine(-0.0), -sine(0.0));
        assert!(sine(0.0).abs() < 1e-6);
    }

    #[test]
    fn test_last_entry_wraps_to_first() {
        // Between 359° and 360° the interpolation must use entry 0
        let angle = 359.5f32.to_radians();
        let expected = angle.cos();
        assert!((cosine(angle) - expected).abs() < 1e-4);
    }
}
