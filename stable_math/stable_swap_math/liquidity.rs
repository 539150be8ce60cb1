//! Pool share arithmetic over the invariant.
//!
//! Shares are minted and burned in proportion to the change of D. When
//! `fees` are given, each token's deviation from the ideal (proportional)
//! balance is charged the normalized swap fee before measuring D, so an
//! imbalanced deposit or withdrawal costs the same as the swaps it replaces.

use ink::prelude::vec::Vec;
use primitive_types::U256;

use crate::{
    ensure,
    error::{InputError, StableMathError},
    fixed_point::FixedPoint,
    math::{mul_div, to_u128, MathError, Rounding},
};

use super::{amp_times_n_pow_n, compute_d, fees::Fees, validate_balances};

fn shares(
    supply: U256,
    d_delta: U256,
    d_0: U256,
    rounding: Rounding,
) -> Result<FixedPoint, StableMathError> {
    let amount = mul_div(supply, d_delta, d_0, rounding)?;
    Ok(FixedPoint::from_raw(to_u128(amount)?))
}

/// Charges the normalized fee on each balance's deviation from
/// `old_balance * d_1 / d_0`.
fn charge_imbalance_fees(
    new_balances: &mut [FixedPoint],
    old_balances: &[FixedPoint],
    d_0: U256,
    d_1: U256,
    fees: &Fees,
) -> Result<(), StableMathError> {
    let n = old_balances.len() as u32;
    for (new_balance, &old_balance) in new_balances.iter_mut().zip(old_balances) {
        let ideal_balance = FixedPoint::from_raw(to_u128(mul_div(
            d_1,
            old_balance.into(),
            d_0,
            Rounding::Down,
        )?)?);
        let difference = ideal_balance.abs_diff(*new_balance);
        let fee = fees.normalized_swap_fee(n, difference)?;
        *new_balance = new_balance.checked_sub(fee)?;
    }
    Ok(())
}

/// Compute the amount of LP tokens to mint after a deposit
/// return <lp_amount_to_mint, lp_fees_part>
pub fn lp_amount_for_deposit(
    deposit_amounts: &[FixedPoint],
    old_balances: &[FixedPoint],
    pool_supply: FixedPoint,
    fees: Option<&Fees>,
    amp: FixedPoint,
) -> Result<(FixedPoint, FixedPoint), StableMathError> {
    let n = validate_balances(old_balances)?;
    ensure!(
        deposit_amounts.len() == old_balances.len(),
        InputError::IncorrectAmountsCount
    );
    let ann = amp_times_n_pow_n(amp, n)?;
    if pool_supply.is_zero() {
        ensure!(
            !deposit_amounts.contains(&FixedPoint::ZERO),
            StableMathError::InsufficientLiquidity
        );
        let d = compute_d(deposit_amounts, ann)?;
        return Ok((FixedPoint::from_raw(to_u128(d)?), FixedPoint::ZERO));
    }
    // Initial invariant
    let d_0 = compute_d(old_balances, ann)?;
    ensure!(!d_0.is_zero(), StableMathError::InsufficientLiquidity);
    let mut new_balances = old_balances
        .iter()
        .zip(deposit_amounts)
        .map(|(balance, &amount)| balance.checked_add(amount))
        .collect::<Result<Vec<FixedPoint>, MathError>>()?;
    // Invariant after change
    let d_1 = compute_d(&new_balances, ann)?;
    let supply: U256 = pool_supply.into();
    let diff_shares = shares(
        supply,
        d_1.checked_sub(d_0).ok_or(MathError::SubUnderflow(20))?,
        d_0,
        Rounding::Down,
    )?;
    match fees {
        Some(fees) => {
            charge_imbalance_fees(&mut new_balances, old_balances, d_0, d_1, fees)?;
            let d_2 = compute_d(&new_balances, ann)?;
            let mint_shares = shares(
                supply,
                d_2.checked_sub(d_0).ok_or(MathError::SubUnderflow(21))?,
                d_0,
                Rounding::Down,
            )?;
            // d1 > d2 > d0,
            // (d2-d0) => mint_shares (charged fee),
            // (d1-d0) => diff_shares (without fee),
            // (d1-d2) => fee part,
            // diff_shares = mint_shares + fee part
            Ok((mint_shares, diff_shares.checked_sub(mint_shares)?))
        }
        None => Ok((diff_shares, FixedPoint::ZERO)),
    }
}

/// Compute the amount of LP tokens to burn for a withdrawal of `withdraw_amounts`
/// return <lp_amount_to_burn, lp_fees_part>
pub fn lp_amount_for_withdraw(
    withdraw_amounts: &[FixedPoint],
    old_balances: &[FixedPoint],
    pool_supply: FixedPoint,
    fees: Option<&Fees>,
    amp: FixedPoint,
) -> Result<(FixedPoint, FixedPoint), StableMathError> {
    let n = validate_balances(old_balances)?;
    ensure!(
        withdraw_amounts.len() == old_balances.len(),
        InputError::IncorrectAmountsCount
    );
    ensure!(!pool_supply.is_zero(), InputError::ZeroPoolSupply);
    let ann = amp_times_n_pow_n(amp, n)?;
    // Initial invariant, D0
    let d_0 = compute_d(old_balances, ann)?;
    ensure!(!d_0.is_zero(), StableMathError::InsufficientLiquidity);
    // real invariant after withdraw, D1
    let mut new_balances = old_balances
        .iter()
        .zip(withdraw_amounts)
        .map(|(balance, &amount)| {
            balance
                .checked_sub(amount)
                .map_err(|_| StableMathError::InsufficientLiquidity)
        })
        .collect::<Result<Vec<FixedPoint>, StableMathError>>()?;
    let d_1 = compute_d(&new_balances, ann)?;
    let supply: U256 = pool_supply.into();
    let diff_shares = shares(
        supply,
        d_0.checked_sub(d_1).ok_or(MathError::SubUnderflow(22))?,
        d_0,
        Rounding::Up,
    )?;
    match fees {
        Some(fees) => {
            charge_imbalance_fees(&mut new_balances, old_balances, d_0, d_1, fees)?;
            let d_2 = compute_d(&new_balances, ann)?;
            // d0 > d1 > d2,
            // (d0-d2) => burn_shares (plus fee),
            // (d0-d1) => diff_shares (without fee),
            // (d1-d2) => fee part,
            // burn_shares = diff_shares + fee part
            let burn_shares = shares(
                supply,
                d_0.checked_sub(d_2).ok_or(MathError::SubUnderflow(23))?,
                d_0,
                Rounding::Up,
            )?;
            Ok((burn_shares, burn_shares.checked_sub(diff_shares)?))
        }
        None => Ok((diff_shares, FixedPoint::ZERO)),
    }
}

/// Compute the ideal amounts of deposits for lp mint, rounded up
/// return <deposit_amounts, new_balances>
pub fn amounts_for_lp_deposit(
    lp_amount: FixedPoint,
    old_balances: &[FixedPoint],
    pool_supply: FixedPoint,
) -> Result<(Vec<FixedPoint>, Vec<FixedPoint>), StableMathError> {
    proportional_amounts(lp_amount, old_balances, pool_supply, Rounding::Up)
}

/// Compute amounts to withdraw for lp burn (no fee), rounded down
/// returns <withdraw_amounts, new_balances>
pub fn amounts_for_lp_withdraw(
    lp_amount: FixedPoint,
    old_balances: &[FixedPoint],
    pool_supply: FixedPoint,
) -> Result<(Vec<FixedPoint>, Vec<FixedPoint>), StableMathError> {
    proportional_amounts(lp_amount, old_balances, pool_supply, Rounding::Down)
}

fn proportional_amounts(
    lp_amount: FixedPoint,
    old_balances: &[FixedPoint],
    pool_supply: FixedPoint,
    rounding: Rounding,
) -> Result<(Vec<FixedPoint>, Vec<FixedPoint>), StableMathError> {
    validate_balances(old_balances)?;
    ensure!(!pool_supply.is_zero(), InputError::ZeroPoolSupply);
    let mut amounts = Vec::with_capacity(old_balances.len());
    let mut new_balances = Vec::with_capacity(old_balances.len());
    for &balance in old_balances {
        let amount = FixedPoint::from_raw(to_u128(mul_div(
            balance.into(),
            lp_amount.into(),
            pool_supply.into(),
            rounding,
        )?)?);
        let new_balance = match rounding {
            Rounding::Up => balance.checked_add(amount)?,
            Rounding::Down => balance
                .checked_sub(amount)
                .map_err(|_| StableMathError::InsufficientLiquidity)?,
        };
        amounts.push(amount);
        new_balances.push(new_balance);
    }
    Ok((amounts, new_balances))
}
