pub mod stable_pool {
    // Balances, amplification and fee rates are fixed-point numbers
    // with TOKEN_TARGET_DECIMALS decimal places.
    pub const TOKEN_TARGET_DECIMALS: u8 = 18;
    pub const TOKEN_TARGET_PRECISION: u128 = 10u128.pow(TOKEN_TARGET_DECIMALS as u32);

    /// Min number of tokens in a pool.
    pub const MIN_TOKENS: usize = 2;
    /// Max number of tokens in a pool.
    pub const MAX_TOKENS: usize = 8;

    /// Max amplification coefficient, in whole units.
    pub const MAX_AMP: u128 = 1_000_000;

    /// Max relative error between an exact-in and exact-out swap of the same trade (0.1%).
    pub const MAX_RELATIVE_ERROR: u128 = TOKEN_TARGET_PRECISION / 1_000;
}

pub mod solver {
    /// Max number of iterations for curve computation using Newton–Raphson method
    pub const MAX_ITERATIONS: u8 = 255;
    /// Successive iterates closer than this (in raw units) are considered converged.
    pub const CONVERGENCE_TOLERANCE: u128 = 1;
}
