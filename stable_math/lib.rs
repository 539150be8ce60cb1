#![cfg_attr(not(feature = "std"), no_std)]

//! Fixed-point stable swap math.
//!
//! Computes the stable swap invariant (D), swap quantities and protocol fee
//! accrual for pools of 2 to [`constants::stable_pool::MAX_TOKENS`] tokens.
//! Every function is pure: balances, amplification and fee rates come in,
//! a number or a [`StableMathError`] comes out.

pub mod constants;
pub mod error;
pub mod fixed_point;
pub mod math;
pub mod stable_swap_math;

pub use error::{InputError, StableMathError};
pub use fixed_point::FixedPoint;
pub use math::{MathError, Rounding};
pub use stable_swap_math::{
    compute_invariant, fees::due_protocol_fee, fees::Fees, in_given_out, out_given_in, swap_from,
    swap_to,
};

#[macro_export]
macro_rules! ensure {
    ( $condition:expr, $error:expr $(,)? ) => {{
        if !$condition {
            return ::core::result::Result::Err(::core::convert::Into::into($error));
        }
    }};
}
