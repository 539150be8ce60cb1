use crate::math::MathError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode, thiserror::Error)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
pub enum StableMathError {
    #[error("math error: {0}")]
    MathError(MathError),
    /// Newton–Raphson did not settle within `MAX_ITERATIONS`.
    #[error("solver did not converge")]
    ConvergenceError,
    /// Trade would drive a balance to or below zero.
    #[error("insufficient liquidity")]
    InsufficientLiquidity,
    #[error("invalid input: {0}")]
    InvalidInput(InputError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode, thiserror::Error)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
pub enum InputError {
    #[error("incorrect token count: {0}")]
    IncorrectTokenCount(u32),
    #[error("token index out of bounds: {0}")]
    InvalidTokenIndex(u32),
    #[error("identical token index")]
    IdenticalTokenIndex,
    #[error("amounts count differs from token count")]
    IncorrectAmountsCount,
    #[error("amplification coefficient too high")]
    AmpCoefTooHigh,
    #[error("fee rate outside [0, 1)")]
    InvalidFeeRate,
    #[error("pool supply is zero")]
    ZeroPoolSupply,
}

impl From<MathError> for StableMathError {
    fn from(error: MathError) -> Self {
        StableMathError::MathError(error)
    }
}

impl From<InputError> for StableMathError {
    fn from(error: InputError) -> Self {
        StableMathError::InvalidInput(error)
    }
}
