use core::fmt;

use primitive_types::U256;

use crate::{
    constants::stable_pool::TOKEN_TARGET_PRECISION,
    math::{mul_div, to_u128, MathError, Rounding},
};

/// Non-negative decimal number with 18 fractional digits, stored as
/// `value * 10^18`.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, scale::Encode, scale::Decode,
)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
pub struct FixedPoint(u128);

impl FixedPoint {
    pub const ZERO: FixedPoint = FixedPoint(0);
    pub const ONE: FixedPoint = FixedPoint(TOKEN_TARGET_PRECISION);

    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    pub fn from_integer(value: u128) -> Result<Self, MathError> {
        value
            .checked_mul(TOKEN_TARGET_PRECISION)
            .map(Self)
            .ok_or(MathError::MulOverflow(40))
    }

    pub const fn raw(self) -> u128 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Result<Self, MathError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(MathError::AddOverflow(40))
    }

    pub fn checked_sub(self, other: Self) -> Result<Self, MathError> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(MathError::SubUnderflow(40))
    }

    pub fn abs_diff(self, other: Self) -> Self {
        Self(self.0.abs_diff(other.0))
    }

    /// `1 - self`, or zero when `self >= 1`.
    pub fn complement(self) -> Self {
        Self(TOKEN_TARGET_PRECISION.saturating_sub(self.0))
    }

    pub fn mul_down(self, other: Self) -> Result<Self, MathError> {
        self.mul(other, Rounding::Down)
    }

    pub fn mul_up(self, other: Self) -> Result<Self, MathError> {
        self.mul(other, Rounding::Up)
    }

    pub fn div_down(self, other: Self) -> Result<Self, MathError> {
        self.div(other, Rounding::Down)
    }

    pub fn div_up(self, other: Self) -> Result<Self, MathError> {
        self.div(other, Rounding::Up)
    }

    /// `self^exponent`, every intermediate product rounded down.
    pub fn powi_down(self, exponent: u32) -> Result<Self, MathError> {
        self.powi(exponent, Rounding::Down)
    }

    /// `self^exponent`, every intermediate product rounded up.
    pub fn powi_up(self, exponent: u32) -> Result<Self, MathError> {
        self.powi(exponent, Rounding::Up)
    }

    fn mul(self, other: Self, rounding: Rounding) -> Result<Self, MathError> {
        let product = mul_div(
            self.0.into(),
            other.0.into(),
            TOKEN_TARGET_PRECISION.into(),
            rounding,
        )?;
        to_u128(product)
            .map(Self)
            .map_err(|_| MathError::MulOverflow(41))
    }

    fn div(self, other: Self, rounding: Rounding) -> Result<Self, MathError> {
        if other.is_zero() {
            return Err(MathError::DivByZero(40));
        }
        let quotient = mul_div(
            self.0.into(),
            TOKEN_TARGET_PRECISION.into(),
            U256::from(other.0),
            rounding,
        )?;
        to_u128(quotient)
            .map(Self)
            .map_err(|_| MathError::MulOverflow(42))
    }

    // square-and-multiply
    fn powi(self, mut exponent: u32, rounding: Rounding) -> Result<Self, MathError> {
        let mut result = Self::ONE;
        let mut base = self;
        while exponent > 0 {
            if exponent & 1 == 1 {
                result = result.mul(base, rounding)?;
            }
            exponent >>= 1;
            if exponent > 0 {
                base = base.mul(base, rounding)?;
            }
        }
        Ok(result)
    }
}

impl From<FixedPoint> for U256 {
    fn from(value: FixedPoint) -> Self {
        U256::from(value.0)
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:018}",
            self.0 / TOKEN_TARGET_PRECISION,
            self.0 % TOKEN_TARGET_PRECISION
        )
    }
}
