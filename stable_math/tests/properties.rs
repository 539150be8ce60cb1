//! Property-based tests for the stable swap curve.
//!
//! 1. **Convergence**: the invariant is a root of the curve equation to within
//!    one raw unit and stays between the constant-product and constant-sum
//!    invariants.
//! 2. **Swap reversibility**: exact-in then exact-out recovers the input.
//! 3. **Monotonicity**: more input, strictly more output.
//! 4. **Conservation**: a trade never lowers the invariant.
//! 5. **Protocol fee**: zero on the curve, never above the balance growth.

use std::cmp::Ordering;

use primitive_types::U512;
use proptest::prelude::*;
use stable_math::{
    compute_invariant,
    constants::stable_pool::{MAX_RELATIVE_ERROR, TOKEN_TARGET_PRECISION},
    due_protocol_fee, in_given_out, out_given_in, FixedPoint,
};

const ONE: u128 = TOKEN_TARGET_PRECISION;

fn balance(min_units: u128, max_units: u128) -> impl Strategy<Value = FixedPoint> {
    (min_units..=max_units, 0..ONE)
        .prop_map(|(units, frac)| FixedPoint::from_raw(units * ONE + frac))
}

fn amp() -> impl Strategy<Value = FixedPoint> {
    (0u128..=5_000).prop_map(|units| FixedPoint::from_raw(units * ONE))
}

fn pool(min_units: u128, max_units: u128) -> impl Strategy<Value = Vec<FixedPoint>> {
    prop::collection::vec(balance(min_units, max_units), 2..=4)
}

fn apply_trade(
    balances: &[FixedPoint],
    amount_in: FixedPoint,
    amount_out: FixedPoint,
) -> Vec<FixedPoint> {
    let mut after = balances.to_vec();
    after[0] = FixedPoint::from_raw(after[0].raw() + amount_in.raw());
    after[1] = FixedPoint::from_raw(after[1].raw() - amount_out.raw());
    after
}

/// Sign of `(A·n^n·S + D - A·n^n·D)·n^n·P - D^(n+1)` over raw values,
/// with both sides scaled by 10^18 so `A` stays an integer.
fn curve_residual_sign(balances: &[FixedPoint], amp: FixedPoint, d: U512) -> Ordering {
    let n = balances.len() as u32;
    let one = U512::from(ONE);
    let nn = U512::from(n).pow(U512::from(n));
    let ann = U512::from(amp.raw()) * nn;
    let sum = balances
        .iter()
        .fold(U512::zero(), |acc, b| acc + U512::from(b.raw()));
    let product = balances
        .iter()
        .fold(U512::one(), |acc, b| acc * U512::from(b.raw()));
    let lhs = (ann * sum + d * one) * nn * product;
    let rhs = ann * d * nn * product + one * d.pow(U512::from(n + 1));
    lhs.cmp(&rhs)
}

proptest! {
    #[test]
    fn invariant_is_root_of_curve(balances in pool(1, 1_000_000), amp in amp()) {
        let Ok(d) = compute_invariant(&balances, amp) else {
            panic!("invariant should converge");
        };
        let d = U512::from(d.raw());
        let below = curve_residual_sign(&balances, amp, d - U512::one());
        let above = curve_residual_sign(&balances, amp, d + U512::one());
        prop_assert!(
            below != above || below == Ordering::Equal,
            "no root between D - 1 and D + 1 for D = {d}"
        );
    }

    #[test]
    fn invariant_between_product_and_sum(balances in pool(1, 1_000_000), amp in amp()) {
        let Ok(d) = compute_invariant(&balances, amp) else {
            panic!("invariant should converge");
        };
        let sum: u128 = balances.iter().map(|b| b.raw()).sum();
        prop_assert!(d.raw() <= sum + balances.len() as u128);
        // n * geometric mean <= D, compared in log space to stay in range
        let n = balances.len() as f64;
        let log_product: f64 = balances.iter().map(|b| (b.raw() as f64).ln()).sum();
        let log_d = (d.raw() as f64).ln();
        prop_assert!(log_d >= n.ln() + log_product / n - 1e-9);
    }

    #[test]
    fn swap_round_trip(
        balances in pool(1_000, 10_000),
        amp in amp(),
        amount_in in (ONE / 1_000)..(100 * ONE),
    ) {
        let amount_in = FixedPoint::from_raw(amount_in);
        let Ok(amount_out) = out_given_in(&balances, amp, 0, 1, amount_in) else {
            panic!("out given in should succeed");
        };
        let Ok(recovered) = in_given_out(&balances, amp, 0, 1, amount_out) else {
            panic!("in given out should succeed");
        };
        let error = recovered.raw().abs_diff(amount_in.raw());
        let max_error = amount_in.raw() * MAX_RELATIVE_ERROR / ONE;
        prop_assert!(error <= max_error, "in {amount_in}, recovered {recovered}");
    }

    #[test]
    fn out_given_in_is_monotonic(
        balances in pool(1_000, 10_000),
        amp in amp(),
        amount_in in (ONE / 1_000)..(100 * ONE),
        delta in (ONE / 1_000)..(100 * ONE),
    ) {
        let small = out_given_in(&balances, amp, 0, 1, FixedPoint::from_raw(amount_in));
        let large = out_given_in(&balances, amp, 0, 1, FixedPoint::from_raw(amount_in + delta));
        let (Ok(small), Ok(large)) = (small, large) else {
            panic!("swaps should succeed");
        };
        prop_assert!(large > small);
    }

    #[test]
    fn trade_never_lowers_invariant(
        balances in pool(1_000, 10_000),
        amp in amp(),
        amount_in in (ONE / 1_000)..(100 * ONE),
    ) {
        let amount_in = FixedPoint::from_raw(amount_in);
        let Ok(amount_out) = out_given_in(&balances, amp, 0, 1, amount_in) else {
            panic!("out given in should succeed");
        };
        let after = apply_trade(&balances, amount_in, amount_out);
        let before_d = compute_invariant(&balances, amp);
        let after_d = compute_invariant(&after, amp);
        let (Ok(before_d), Ok(after_d)) = (before_d, after_d) else {
            panic!("invariant should converge");
        };
        prop_assert!(after_d >= before_d);
    }

    #[test]
    fn protocol_fee_bounded_by_growth(
        balances in pool(1_000, 10_000),
        amp in amp(),
        amount_in in (ONE / 1_000)..(100 * ONE),
        rate in 0..ONE,
    ) {
        let rate = FixedPoint::from_raw(rate);
        let Ok(last_invariant) = compute_invariant(&balances, amp) else {
            panic!("invariant should converge");
        };
        for token_index in 0..balances.len() {
            let on_curve = due_protocol_fee(&balances, amp, last_invariant, token_index, rate);
            prop_assert_eq!(on_curve, Ok(FixedPoint::ZERO));
        }

        // a donation to token 0 is pure growth beyond the curve
        let amount_in = FixedPoint::from_raw(amount_in);
        let grown = apply_trade(&balances, amount_in, FixedPoint::ZERO);
        let Ok(fee) = due_protocol_fee(&grown, amp, last_invariant, 0, rate) else {
            panic!("fee should compute");
        };
        let Ok(cap) = amount_in.mul_down(rate) else {
            panic!("cap should compute");
        };
        prop_assert!(fee <= cap, "fee {fee} above {cap}");
    }
}
