//! Fixed-point arithmetic for the simulation core.
//!
//! Every pressure, density, and condition value is a `Fixed`. Floats are
//! kept out of sim logic entirely; x87/SSE/FMA differences would break
//! cross-platform replay of checksummed states.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Scaled i64 with 4 decimal digits: 1.0 is stored as 10_000.
///
/// i64 leaves headroom for the large aggregates the front model produces
/// (personnel totals times posture multipliers, accumulated pressure).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Fixed(pub i64);

impl Fixed {
    pub const SCALE: i64 = 10000;

    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(10000);
    pub const HALF: Fixed = Fixed(5000);

    /// Wrap an already-scaled value.
    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Fixed(raw)
    }

    /// Scale up a whole number (5 becomes 50_000 raw).
    #[inline]
    pub const fn from_int(v: i64) -> Self {
        Fixed(v * Self::SCALE)
    }

    /// Exact ratio of two integers (e.g., personnel / AoR size).
    ///
    /// Returns ZERO when the denominator is zero.
    #[inline]
    pub fn from_ratio(num: i64, den: i64) -> Self {
        if den == 0 {
            return Fixed::ZERO;
        }
        Fixed((num as i128 * Self::SCALE as i128 / den as i128) as i64)
    }

    /// Convert from f32 at the parse/config boundary only, never inside a
    /// stage. NaN and infinities collapse to zero; out-of-range saturates.
    #[inline]
    pub fn from_f32(v: f32) -> Self {
        if !v.is_finite() {
            return Fixed::ZERO;
        }

        let scaled = v * Self::SCALE as f32;

        if scaled > i64::MAX as f32 {
            return Fixed(i64::MAX);
        }
        if scaled < i64::MIN as f32 {
            return Fixed(i64::MIN);
        }

        Fixed(scaled.round() as i64)
    }

    /// Lossy f32 view for display and logs.
    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / Self::SCALE as f32
    }

    /// The underlying scaled value.
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Truncate toward zero.
    #[inline]
    pub const fn to_int(self) -> i64 {
        self.0 / Self::SCALE
    }

    /// Round to nearest integer, halves away from zero.
    ///
    /// Used when integrating a Fixed delta into an integer accumulator.
    #[inline]
    pub const fn round_to_int(self) -> i64 {
        let half = Self::SCALE / 2;
        if self.0 >= 0 {
            (self.0 + half) / Self::SCALE
        } else {
            (self.0 - half) / Self::SCALE
        }
    }

    #[inline]
    pub fn min(self, other: Fixed) -> Fixed {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    #[inline]
    pub fn max(self, other: Fixed) -> Fixed {
        if self.0 >= other.0 {
            self
        } else {
            other
        }
    }

    /// Clamp into `[lo, hi]`.
    #[inline]
    pub fn clamp(self, lo: Fixed, hi: Fixed) -> Fixed {
        self.max(lo).min(hi)
    }

    /// Absolute value, saturating on `i64::MIN`.
    #[inline]
    pub const fn abs(self) -> Fixed {
        Fixed(self.0.saturating_abs())
    }

    #[inline]
    pub fn saturating_add(self, other: Fixed) -> Fixed {
        Fixed(self.0.saturating_add(other.0))
    }

    #[inline]
    pub fn saturating_sub(self, other: Fixed) -> Fixed {
        Fixed(self.0.saturating_sub(other.0))
    }
}

impl Add for Fixed {
    type Output = Fixed;
    #[inline]
    fn add(self, other: Fixed) -> Fixed {
        Fixed(self.0 + other.0)
    }
}

impl AddAssign for Fixed {
    #[inline]
    fn add_assign(&mut self, other: Fixed) {
        self.0 += other.0;
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    #[inline]
    fn sub(self, other: Fixed) -> Fixed {
        Fixed(self.0 - other.0)
    }
}

impl SubAssign for Fixed {
    #[inline]
    fn sub_assign(&mut self, other: Fixed) {
        self.0 -= other.0;
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    #[inline]
    fn neg(self) -> Fixed {
        Fixed(-self.0)
    }
}

impl Mul for Fixed {
    type Output = Fixed;
    #[inline]
    fn mul(self, other: Fixed) -> Fixed {
        Fixed((self.0 as i128 * other.0 as i128 / Fixed::SCALE as i128) as i64)
    }
}

impl MulAssign for Fixed {
    #[inline]
    fn mul_assign(&mut self, other: Fixed) {
        *self = *self * other;
    }
}

impl Div for Fixed {
    type Output = Fixed;
    #[inline]
    fn div(self, other: Fixed) -> Fixed {
        // Division by zero yields zero rather than a panic mid-turn.
        if other.0 == 0 {
            return Fixed::ZERO;
        }
        Fixed((self.0 as i128 * Fixed::SCALE as i128 / other.0 as i128) as i64)
    }
}

impl DivAssign for Fixed {
    #[inline]
    fn div_assign(&mut self, other: Fixed) {
        *self = *self / other;
    }
}

impl std::fmt::Debug for Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fixed({} = {})", self.0, self.to_f32())
    }
}

impl std::fmt::Display for Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.to_f32())
    }
}
