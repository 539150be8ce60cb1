pub mod fees;
pub mod liquidity;

use ink::prelude::vec::Vec;
use primitive_types::{U256, U512};
use tracing::{debug, trace, warn};

use crate::{
    constants::{
        solver::{CONVERGENCE_TOLERANCE, MAX_ITERATIONS},
        stable_pool::{MAX_AMP, MAX_TOKENS, MIN_TOKENS, TOKEN_TARGET_PRECISION},
    },
    ensure,
    error::{InputError, StableMathError},
    fixed_point::FixedPoint,
    math::{casted_mul, mul_div, to_u128, wide_div, MathError, Rounding},
};

use fees::Fees;

/// Checks the token count and returns it as `n`.
pub(crate) fn validate_balances(balances: &[FixedPoint]) -> Result<u32, StableMathError> {
    let n = balances.len();
    ensure!(
        (MIN_TOKENS..=MAX_TOKENS).contains(&n),
        InputError::IncorrectTokenCount(n as u32)
    );
    Ok(n as u32)
}

fn validate_index(n: u32, index: usize) -> Result<(), StableMathError> {
    ensure!(
        index < n as usize,
        InputError::InvalidTokenIndex(index as u32)
    );
    Ok(())
}

fn validate_pair(n: u32, index_in: usize, index_out: usize) -> Result<(), StableMathError> {
    validate_index(n, index_in)?;
    validate_index(n, index_out)?;
    ensure!(index_in != index_out, InputError::IdenticalTokenIndex);
    Ok(())
}

/// A * n^n, raw fixed-point (scaled by 10^18).
pub(crate) fn amp_times_n_pow_n(amp: FixedPoint, n: u32) -> Result<U256, StableMathError> {
    ensure!(
        amp <= FixedPoint::from_integer(MAX_AMP)?,
        InputError::AmpCoefTooHigh
    );
    let nn = FixedPoint::from_integer(n.into())?.powi_down(n)?;
    Ok(amp.mul_down(nn)?.into())
}

fn converged(next: U256, prev: U256) -> bool {
    let delta = if next > prev { next - prev } else { prev - next };
    delta <= CONVERGENCE_TOLERANCE.into()
}

/// Applies `step` from `start` until two successive values are within
/// `CONVERGENCE_TOLERANCE` and returns the last value with the number of steps
/// taken. Fails with `ConvergenceError` after `max_iterations` steps.
fn newton_iterate<F>(
    start: U256,
    max_iterations: u8,
    mut step: F,
) -> Result<(U256, u8), StableMathError>
where
    F: FnMut(U256) -> Result<U256, StableMathError>,
{
    let mut value = start;
    for iteration in 0..max_iterations {
        let next = step(value)?;
        if converged(next, value) {
            return Ok((next, iteration + 1));
        }
        value = next;
    }
    warn!(last = ?value, max_iterations, "newton iteration did not converge");
    Err(StableMathError::ConvergenceError)
}

/// Computes stable swap invariant (D)
///
/// Solves `A·n^n·Σx_i + D = A·D·n^n + D^(n+1) / (n^n·Πx_i)` for `D`, starting
/// from `Σx_i`. Returns zero if any balance is zero.
pub fn compute_invariant(
    balances: &[FixedPoint],
    amp: FixedPoint,
) -> Result<FixedPoint, StableMathError> {
    let n = validate_balances(balances)?;
    let ann = amp_times_n_pow_n(amp, n)?;
    let d = compute_d(balances, ann)?;
    Ok(FixedPoint::from_raw(to_u128(d)?))
}

/// `ann` is A * n^n scaled by 10^18. Token count must already be validated.
pub(crate) fn compute_d(balances: &[FixedPoint], ann: U256) -> Result<U256, StableMathError> {
    if balances.iter().any(|balance| balance.is_zero()) {
        return Ok(U256::zero());
    }
    // SUM{x_i}
    let amount_sum = balances
        .iter()
        .try_fold(U256::zero(), |acc, &balance| {
            acc.checked_add(balance.into())
                .ok_or(MathError::AddOverflow(1))
        })?;
    let n = balances.len() as u32;
    let one = U256::from(TOKEN_TARGET_PRECISION);
    // A * n^n * SUM{x_i}
    let ann_sum = ann
        .checked_mul(amount_sum)
        .ok_or(MathError::MulOverflow(1))?;
    let (d, iterations) = newton_iterate(amount_sum, MAX_ITERATIONS, |d| {
        compute_d_next(d, n, balances, ann, ann_sum, one)
    })?;
    debug!(tokens = n, iterations, invariant = ?d, "invariant converged");
    Ok(d)
}

fn compute_d_next(
    d_prev: U256,
    n: u32,
    balances: &[FixedPoint],
    ann: U256,
    ann_sum: U256,
    one: U256,
) -> Result<U256, StableMathError> {
    let mut d_prod = d_prev;
    // d_prod = ... * [d_prev / (x_(i) * n)] * ...
    // where i in (0,n)
    for balance in balances {
        d_prod = mul_div(
            d_prod,
            d_prev,
            casted_mul(balance.raw(), n.into()),
            Rounding::Down,
        )?;
    }
    // A * n^n * SUM{x_i} + n * d_prod
    let numerator = d_prod
        .checked_mul(n.into())
        .and_then(|v| v.checked_mul(one))
        .ok_or(MathError::MulOverflow(2))?
        .checked_add(ann_sum)
        .ok_or(MathError::AddOverflow(2))?;
    // (A * n^n - 1) * d_prev + (n + 1) * d_prod
    let denominator = ann
        .checked_mul(d_prev)
        .ok_or(MathError::MulOverflow(3))?
        .checked_add(
            d_prod
                .checked_mul((n + 1).into())
                .and_then(|v| v.checked_mul(one))
                .ok_or(MathError::MulOverflow(4))?,
        )
        .ok_or(MathError::AddOverflow(3))?
        .checked_sub(d_prev.checked_mul(one).ok_or(MathError::MulOverflow(5))?)
        .ok_or(MathError::SubUnderflow(1))?;
    Ok(mul_div(d_prev, numerator, denominator, Rounding::Down)?)
}

/// Returns the balance of `token_index` that puts the pool on the curve
/// defined by `invariant`, holding every other balance fixed.
/// The value of `balances[token_index]` is ignored.
pub fn balance_given_invariant(
    balances: &[FixedPoint],
    amp: FixedPoint,
    invariant: FixedPoint,
    token_index: usize,
) -> Result<FixedPoint, StableMathError> {
    let n = validate_balances(balances)?;
    validate_index(n, token_index)?;
    let ann = amp_times_n_pow_n(amp, n)?;
    if invariant.is_zero() {
        return Ok(FixedPoint::ZERO);
    }
    let y = compute_y(balances, ann, invariant.into(), token_index)?;
    Ok(FixedPoint::from_raw(to_u128(y)?))
}

/// Newton–Raphson on `A·n^n·y² + (A·n^n·(S' - D) + D)·y = D^(n+1) / (n^n·P')`
/// where `S'` and `P'` are the sum and product of the other balances.
/// The result is rounded up.
fn compute_y(
    balances: &[FixedPoint],
    ann: U256,
    d: U256,
    token_index: usize,
) -> Result<U256, StableMathError> {
    let n = balances.len() as u32;
    let one = U256::from(TOKEN_TARGET_PRECISION);

    let mut c = d;
    let mut other_sum = U256::zero();
    // other_sum = ... + x_(i') + ...
    // c = ... * d / (x_(i') * n) * ...
    // where i' in (0,n) AND i' != token_index
    for (idx, &balance) in balances.iter().enumerate() {
        if idx != token_index {
            ensure!(!balance.is_zero(), StableMathError::InsufficientLiquidity);
            other_sum = other_sum
                .checked_add(balance.into())
                .ok_or(MathError::AddOverflow(4))?;
            c = mul_div(
                c,
                d,
                casted_mul(balance.raw(), n.into()),
                Rounding::Up,
            )?;
        }
    }
    // c = d^(n+1) / (n^n * PROD{x_(i')})
    c = mul_div(c, d, n.into(), Rounding::Up)?;
    let c_scaled: U512 = c.full_mul(one);
    // A * n^n * other_sum + d
    let b = ann
        .checked_mul(other_sum)
        .ok_or(MathError::MulOverflow(6))?
        .checked_add(d.checked_mul(one).ok_or(MathError::MulOverflow(7))?)
        .ok_or(MathError::AddOverflow(5))?;
    let ann_d = ann.checked_mul(d).ok_or(MathError::MulOverflow(8))?;

    let (y, iterations) = newton_iterate(d, MAX_ITERATIONS, |y| {
        compute_y_next(y, ann, b, ann_d, c_scaled)
    })?;
    debug!(tokens = n, token_index, iterations, balance = ?y, "balance converged");
    Ok(y)
}

fn compute_y_next(
    y_prev: U256,
    ann: U256,
    b: U256,
    ann_d: U256,
    c_scaled: U512,
) -> Result<U256, StableMathError> {
    let ann_y = ann.checked_mul(y_prev).ok_or(MathError::MulOverflow(9))?;
    // A * n^n * y^2 + c
    let numerator = ann_y
        .full_mul(y_prev)
        .checked_add(c_scaled)
        .ok_or(MathError::AddOverflow(6))?;
    // 2 * A * n^n * y + b - A * n^n * d
    let denominator = ann_y
        .checked_mul(2.into())
        .ok_or(MathError::MulOverflow(10))?
        .checked_add(b)
        .ok_or(MathError::AddOverflow(7))?
        .checked_sub(ann_d)
        .ok_or(MathError::SubUnderflow(2))?;
    Ok(wide_div(numerator, denominator, Rounding::Up)?)
}

/// Amount of `index_out` token received for `amount_in` of `index_in` token.
/// Rounded down.
pub fn out_given_in(
    balances: &[FixedPoint],
    amp: FixedPoint,
    index_in: usize,
    index_out: usize,
    amount_in: FixedPoint,
) -> Result<FixedPoint, StableMathError> {
    let invariant = compute_invariant(balances, amp)?;
    out_given_in_with_invariant(balances, amp, invariant, index_in, index_out, amount_in)
}

/// Same as [`out_given_in`] with the pre-trade invariant already known.
pub fn out_given_in_with_invariant(
    balances: &[FixedPoint],
    amp: FixedPoint,
    invariant: FixedPoint,
    index_in: usize,
    index_out: usize,
    amount_in: FixedPoint,
) -> Result<FixedPoint, StableMathError> {
    let n = validate_balances(balances)?;
    validate_pair(n, index_in, index_out)?;
    let ann = amp_times_n_pow_n(amp, n)?;
    ensure!(!invariant.is_zero(), StableMathError::InsufficientLiquidity);

    let mut new_balances: Vec<FixedPoint> = balances.iter().copied().collect();
    new_balances[index_in] = balances[index_in].checked_add(amount_in)?;
    let y = to_u128(compute_y(&new_balances, ann, invariant.into(), index_out)?)?;
    ensure!(y > 0, StableMathError::InsufficientLiquidity);
    // sub 1 in case there are any rounding errors
    // https://github.com/curvefi/curve-contract/blob/b0bbf77f8f93c9c5f4e415bce9cd71f0cdee960e/contracts/pool-templates/base/SwapTemplateBase.vy#L466
    let amount_out = FixedPoint::from_raw(
        balances[index_out]
            .raw()
            .saturating_sub(y)
            .saturating_sub(1),
    );
    trace!(index_in, index_out, ?amount_in, ?amount_out, "out given in");
    Ok(amount_out)
}

/// Amount of `index_in` token required to receive `amount_out` of `index_out`
/// token. Rounded up.
pub fn in_given_out(
    balances: &[FixedPoint],
    amp: FixedPoint,
    index_in: usize,
    index_out: usize,
    amount_out: FixedPoint,
) -> Result<FixedPoint, StableMathError> {
    let invariant = compute_invariant(balances, amp)?;
    in_given_out_with_invariant(balances, amp, invariant, index_in, index_out, amount_out)
}

/// Same as [`in_given_out`] with the pre-trade invariant already known.
pub fn in_given_out_with_invariant(
    balances: &[FixedPoint],
    amp: FixedPoint,
    invariant: FixedPoint,
    index_in: usize,
    index_out: usize,
    amount_out: FixedPoint,
) -> Result<FixedPoint, StableMathError> {
    let n = validate_balances(balances)?;
    validate_pair(n, index_in, index_out)?;
    let ann = amp_times_n_pow_n(amp, n)?;
    ensure!(!invariant.is_zero(), StableMathError::InsufficientLiquidity);
    ensure!(
        amount_out < balances[index_out],
        StableMathError::InsufficientLiquidity
    );

    let mut new_balances: Vec<FixedPoint> = balances.iter().copied().collect();
    new_balances[index_out] = balances[index_out].checked_sub(amount_out)?;
    let y = to_u128(compute_y(&new_balances, ann, invariant.into(), index_in)?)?;
    // add 1 in case there are any rounding errors
    let amount_in = FixedPoint::from_raw(
        y.saturating_sub(balances[index_in].raw())
            .checked_add(1)
            .ok_or(MathError::AddOverflow(8))?,
    );
    trace!(index_in, index_out, ?amount_in, ?amount_out, "in given out");
    Ok(amount_in)
}

/// Swaps exact `amount_in`. The swap fee is taken from the input token.
/// Returns (amount_out, fee_amount)
pub fn swap_to(
    balances: &[FixedPoint],
    amp: FixedPoint,
    fees: &Fees,
    index_in: usize,
    index_out: usize,
    amount_in: FixedPoint,
) -> Result<(FixedPoint, FixedPoint), StableMathError> {
    let fee = fees.swap_fee_from_gross(amount_in)?;
    let net_amount_in = amount_in.checked_sub(fee)?;
    let amount_out = out_given_in(balances, amp, index_in, index_out, net_amount_in)?;
    Ok((amount_out, fee))
}

/// Swaps for exact `amount_out`. The swap fee is added to the input token.
/// Returns (amount_in, fee_amount)
pub fn swap_from(
    balances: &[FixedPoint],
    amp: FixedPoint,
    fees: &Fees,
    index_in: usize,
    index_out: usize,
    amount_out: FixedPoint,
) -> Result<(FixedPoint, FixedPoint), StableMathError> {
    let net_amount_in = in_given_out(balances, amp, index_in, index_out, amount_out)?;
    let fee = fees.swap_fee_from_net(net_amount_in)?;
    Ok((net_amount_in.checked_add(fee)?, fee))
}
