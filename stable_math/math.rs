use primitive_types::{U256, U512};

/// Arithmetic failure. The `u8` identifies the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode, thiserror::Error)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
pub enum MathError {
    #[error("addition overflow ({0})")]
    AddOverflow(u8),
    #[error("cast overflow ({0})")]
    CastOverflow(u8),
    #[error("division by zero ({0})")]
    DivByZero(u8),
    #[error("multiplication overflow ({0})")]
    MulOverflow(u8),
    #[error("subtraction underflow ({0})")]
    SubUnderflow(u8),
}

impl MathError {
    /// Result does not fit in the representable range.
    pub fn is_overflow(&self) -> bool {
        matches!(
            self,
            MathError::AddOverflow(_) | MathError::CastOverflow(_) | MathError::MulOverflow(_)
        )
    }

    /// Result would be negative.
    pub fn is_underflow(&self) -> bool {
        matches!(self, MathError::SubUnderflow(_))
    }
}

/// Direction in which a non-exact quotient is rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

pub fn casted_mul(a: u128, b: u128) -> U256 {
    U256::from(a) * U256::from(b)
}

/// Computes `a * b / c` with a 512-bit intermediate product.
pub fn mul_div(a: U256, b: U256, c: U256, rounding: Rounding) -> Result<U256, MathError> {
    if c.is_zero() {
        return Err(MathError::DivByZero(1));
    }
    let product: U512 = a.full_mul(b);
    let c = U512::from(c);
    let mut quotient = product / c;
    if rounding == Rounding::Up && !(product % c).is_zero() {
        quotient = quotient
            .checked_add(U512::one())
            .ok_or(MathError::AddOverflow(1))?;
    }
    U256::try_from(quotient).map_err(|_| MathError::CastOverflow(1))
}

/// Computes `numerator / denominator` of a 512-bit numerator.
pub fn wide_div(numerator: U512, denominator: U256, rounding: Rounding) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivByZero(2));
    }
    let denominator = U512::from(denominator);
    let mut quotient = numerator / denominator;
    if rounding == Rounding::Up && !(numerator % denominator).is_zero() {
        quotient = quotient
            .checked_add(U512::one())
            .ok_or(MathError::AddOverflow(2))?;
    }
    U256::try_from(quotient).map_err(|_| MathError::CastOverflow(2))
}

pub fn to_u128(value: U256) -> Result<u128, MathError> {
    value.try_into().map_err(|_| MathError::CastOverflow(3))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_rounds_in_requested_direction() {
        let a = U256::from(10);
        let b = U256::from(7);
        let c = U256::from(3);
        assert_eq!(mul_div(a, b, c, Rounding::Down), Ok(U256::from(23)));
        assert_eq!(mul_div(a, b, c, Rounding::Up), Ok(U256::from(24)));
        // exact quotient is not bumped
        assert_eq!(mul_div(a, c, c, Rounding::Up), Ok(a));
    }

    #[test]
    fn mul_div_survives_wide_product() {
        let max = U256::MAX;
        assert_eq!(mul_div(max, max, max, Rounding::Down), Ok(max));
        assert_eq!(
            mul_div(max, U256::from(2), U256::one(), Rounding::Down),
            Err(MathError::CastOverflow(1))
        );
    }

    #[test]
    fn division_by_zero_is_reported() {
        assert_eq!(
            mul_div(U256::one(), U256::one(), U256::zero(), Rounding::Down),
            Err(MathError::DivByZero(1))
        );
        assert_eq!(
            wide_div(U512::one(), U256::zero(), Rounding::Up),
            Err(MathError::DivByZero(2))
        );
    }

    #[test]
    fn error_classification() {
        assert!(MathError::MulOverflow(1).is_overflow());
        assert!(MathError::CastOverflow(1).is_overflow());
        assert!(!MathError::SubUnderflow(1).is_overflow());
        assert!(MathError::SubUnderflow(1).is_underflow());
        assert_eq!(to_u128(U256::from(u128::MAX)), Ok(u128::MAX));
        assert_eq!(
            to_u128(U256::from(u128::MAX) + 1),
            Err(MathError::CastOverflow(3))
        );
    }
}
