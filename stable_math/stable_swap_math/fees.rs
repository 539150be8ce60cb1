use tracing::trace;

use crate::{
    ensure,
    error::{InputError, StableMathError},
    fixed_point::FixedPoint,
    math::MathError,
};

use super::balance_given_invariant;

/// Fee rates as fixed-point fractions in `[0, 1)`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
pub struct Fees {
    pub swap_fee: FixedPoint,
    pub protocol_fee: FixedPoint,
}

pub(crate) fn validate_fee_rate(rate: FixedPoint) -> Result<(), StableMathError> {
    ensure!(rate < FixedPoint::ONE, InputError::InvalidFeeRate);
    Ok(())
}

impl Fees {
    pub fn new(swap_fee: FixedPoint, protocol_fee: FixedPoint) -> Result<Self, StableMathError> {
        validate_fee_rate(swap_fee)?;
        validate_fee_rate(protocol_fee)?;
        Ok(Self {
            swap_fee,
            protocol_fee,
        })
    }

    pub fn zero() -> Self {
        Self {
            swap_fee: FixedPoint::ZERO,
            protocol_fee: FixedPoint::ZERO,
        }
    }

    /// Fee contained in a gross `amount`.
    pub fn swap_fee_from_gross(&self, amount: FixedPoint) -> Result<FixedPoint, MathError> {
        amount.mul_up(self.swap_fee)
    }

    /// Fee to add on top of a net `amount`.
    pub fn swap_fee_from_net(&self, amount: FixedPoint) -> Result<FixedPoint, MathError> {
        amount
            .div_up(self.swap_fee.complement())?
            .checked_sub(amount)
    }

    /// Part of a collected swap fee that belongs to the protocol.
    pub fn protocol_share(&self, fee: FixedPoint) -> Result<FixedPoint, MathError> {
        fee.mul_down(self.protocol_fee)
    }

    /// Used to normalize fee applied on difference amount with ideal balance, This logic is from
    /// https://github.com/ref-finance/ref-contracts/blob/main/ref-exchange/src/stable_swap/math.rs#L48
    /// https://github.com/saber-hq/stable-swap/blob/5db776fb0a41a0d1a23d46b99ef412ca7ccc5bf6/stable-swap-program/program/src/fees.rs#L73
    /// https://github.com/curvefi/curve-contract/blob/e5fb8c0e0bcd2fe2e03634135806c0f36b245511/tests/simulation.py#L124
    pub fn normalized_swap_fee(
        &self,
        num_coins: u32,
        amount: FixedPoint,
    ) -> Result<FixedPoint, MathError> {
        // swap_fee * n / (4 * (n - 1))
        let denominator = num_coins
            .checked_sub(1)
            .ok_or(MathError::SubUnderflow(60))?
            .checked_mul(4)
            .ok_or(MathError::MulOverflow(60))?;
        let adjusted_swap_fee = self
            .swap_fee
            .mul_down(FixedPoint::from_integer(num_coins.into())?)?
            .div_down(FixedPoint::from_integer(denominator.into())?)?;
        amount.mul_down(adjusted_swap_fee)
    }
}

/// Protocol share of the swap fees accrued by `token_index` since
/// `last_invariant` was recorded.
///
/// The balance `token_index` would have on the `last_invariant` curve (all
/// other balances as they are now) separates fee-driven growth from
/// deposits and withdrawals, which move the pool along proportional scaling
/// and are not taxed.
pub fn due_protocol_fee(
    balances: &[FixedPoint],
    amp: FixedPoint,
    last_invariant: FixedPoint,
    token_index: usize,
    protocol_fee_rate: FixedPoint,
) -> Result<FixedPoint, StableMathError> {
    validate_fee_rate(protocol_fee_rate)?;
    let curve_balance = balance_given_invariant(balances, amp, last_invariant, token_index)?;
    let balance = balances[token_index];
    let accumulated = if balance > curve_balance {
        balance.checked_sub(curve_balance)?
    } else {
        FixedPoint::ZERO
    };
    let fee = accumulated.mul_down(protocol_fee_rate)?;
    trace!(token_index, ?accumulated, ?fee, "due protocol fee");
    Ok(fee)
}
