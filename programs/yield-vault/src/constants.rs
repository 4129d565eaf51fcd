pub const VAULT_SEED: &[u8] = b"vault";
pub const SHARES_MINT_SEED: &[u8] = b"shares";

pub const MAX_DECIMALS: u8 = 9;
pub const SHARES_DECIMALS: u8 = 9;

/// Largest virtual-share exponent accepted at initialization.
pub const MAX_VIRTUAL_OFFSET: u8 = 12;

/// Fee rates are expressed in basis points out of 10_000.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Hard cap on the reward fee (30%).
pub const MAX_REWARD_FEE_BPS: u16 = 3_000;
