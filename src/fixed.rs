//! Fixed-Point Value Types for Level Arithmetic
//!
//! ## Overview
//!
//! All level math in this crate is integer fixed-point. Two formats appear:
//!
//! - **Q8.8** ([`Q8F8`]): per-sensor scale factors. `256` is `1.0`, so a
//!   factor linearly rescales one sensor's dynamic range to match the rest
//!   of the array without leaving integer arithmetic.
//! - **Q24.8** ([`Q24F8`]): physical heights, levels, and percentages in
//!   millimetres (or percent) with 8 fractional bits.
//!
//! ## Rounding Semantics
//!
//! The whole pipeline depends on one rounding rule: dropping fraction bits
//! uses an *arithmetic* right shift, i.e. truncation toward negative
//! infinity. `(5 * 128) >> 8` is `2`, `(-5 * 128) >> 8` is `-3`. That rule
//! is what makes the boundary-rounding compensation in the aggregator
//! necessary and sufficient, so it is encapsulated here rather than spread
//! across the crate as raw shifts.
//!
//! ## Overflow
//!
//! Multiplications widen to `i64` before shifting and saturate when
//! narrowing back to `i32`. Saturation is defined behavior, never an error:
//! a reading large enough to saturate reads as "submerged" downstream, which
//! is the correct failure mode for a shorted sensor channel.

use core::fmt;
use core::ops::{Add, Sub};

/// Signed Q8.8 fixed-point scale factor.
///
/// Stored in an `i16`; [`Q8F8::ONE`] (`0x0100`) is the identity transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Q8F8(i16);

impl Q8F8 {
    /// The identity scale factor, `1.0`.
    pub const ONE: Q8F8 = Q8F8(0x0100);

    /// Construct from raw Q8.8 bits.
    pub const fn from_bits(bits: i16) -> Self {
        Q8F8(bits)
    }

    /// Raw Q8.8 bit pattern.
    pub const fn to_bits(self) -> i16 {
        self.0
    }

    /// Rescale a raw sensor count.
    ///
    /// Computes `(count * scale) >> 8` in `i64`, truncating toward negative
    /// infinity, then saturates to `i32`. With `Q8F8::ONE` this is the
    /// identity on any `i32`.
    pub fn apply(self, count: i32) -> i32 {
        let wide = (count as i64 * self.0 as i64) >> 8;
        saturate(wide)
    }
}

/// Signed Q24.8 fixed-point quantity (millimetres or percent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Q24F8(i32);

impl Q24F8 {
    /// Zero.
    pub const ZERO: Q24F8 = Q24F8(0);

    /// Construct from a whole number of units (no fractional part).
    pub const fn from_int(value: i32) -> Self {
        Q24F8(value << 8)
    }

    /// Construct from raw Q24.8 bits.
    pub const fn from_bits(bits: i32) -> Self {
        Q24F8(bits)
    }

    /// Raw Q24.8 bit pattern.
    pub const fn to_bits(self) -> i32 {
        self.0
    }

    /// Whole-unit part, floored (arithmetic shift).
    pub const fn to_int(self) -> i32 {
        self.0 >> 8
    }

    /// Half this quantity, truncating toward negative infinity.
    pub const fn halved(self) -> Self {
        Q24F8(self.0 >> 1)
    }

    /// A quarter of this quantity, truncating toward negative infinity.
    pub const fn quartered(self) -> Self {
        Q24F8(self.0 >> 2)
    }

    /// Multiply by an integer count, saturating.
    pub fn saturating_mul_int(self, n: i32) -> Self {
        Q24F8(saturate(self.0 as i64 * n as i64))
    }

    /// Rescale by a Q8.8 factor (`(bits * scale) >> 8`), saturating.
    pub fn scaled_by(self, scale: Q8F8) -> Self {
        Q24F8(saturate((self.0 as i64 * scale.to_bits() as i64) >> 8))
    }

    /// This quantity as a percentage of `whole` (given in whole units).
    ///
    /// Integer division on the Q24.8 numerator, so the result keeps 8
    /// fractional bits of percent. A zero `whole` yields zero rather than
    /// trapping; the configuration layer rejects zero-capacity tanks.
    pub fn percent_of(self, whole: i32) -> Q24F8 {
        if whole == 0 {
            return Q24F8::ZERO;
        }
        Q24F8(saturate(self.0 as i64 * 100 / whole as i64))
    }
}

impl Add for Q24F8 {
    type Output = Q24F8;

    fn add(self, rhs: Q24F8) -> Q24F8 {
        Q24F8(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Q24F8 {
    type Output = Q24F8;

    fn sub(self, rhs: Q24F8) -> Q24F8 {
        Q24F8(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Q24F8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        let whole = abs >> 8;
        let frac = (abs & 0xFF) * 100 / 256;
        if self.0 < 0 {
            write!(f, "-")?;
        }
        write!(f, "{}.{:02}", whole, frac)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Q24F8 {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}/256", self.0);
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Q8F8 {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}/256", self.0);
    }
}

fn saturate(wide: i64) -> i32 {
    wide.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
