use anchor_lang::prelude::*;

#[event]
pub struct VaultInitialized {
    pub vault: Pubkey,
    pub authority: Pubkey,
    pub asset_mint: Pubkey,
    pub shares_mint: Pubkey,
    pub target_program: Pubkey,
    pub vault_id: u64,
}

#[event]
pub struct Deposit {
    pub vault: Pubkey,
    pub caller: Pubkey,
    pub owner: Pubkey,
    pub assets: u64,
    pub shares: u64,
}

#[event]
pub struct Withdraw {
    pub vault: Pubkey,
    pub caller: Pubkey,
    pub receiver: Pubkey,
    pub owner: Pubkey,
    pub assets: u64,
    pub shares: u64,
}

#[event]
pub struct FeesHarvested {
    pub vault: Pubkey,
    pub profit: u64,
    pub fee_value: u64,
    pub fee_shares: u64,
    pub new_high_water_mark: u64,
}

#[event]
pub struct RewardFeeUpdated {
    pub vault: Pubkey,
    pub previous_bps: u16,
    pub new_bps: u16,
}

#[event]
pub struct MinFirstDepositUpdated {
    pub vault: Pubkey,
    pub previous_amount: u64,
    pub new_amount: u64,
}

#[event]
pub struct EmergencyActivated {
    pub vault: Pubkey,
    pub authority: Pubkey,
    pub recovered: u64,
}

#[event]
pub struct EmergencyWithdrawal {
    pub vault: Pubkey,
    pub recovered: u64,
}

#[event]
pub struct RecoveryActivated {
    pub vault: Pubkey,
    pub recovery_assets: u64,
    pub recovery_supply: u64,
}

#[event]
pub struct RecoveryRedeem {
    pub vault: Pubkey,
    pub owner: Pubkey,
    pub receiver: Pubkey,
    pub shares: u64,
    pub assets: u64,
}

#[event]
pub struct UnallocatedAssetsDeposited {
    pub vault: Pubkey,
    pub swept: u64,
    pub remaining_idle: u64,
}

#[event]
pub struct TokenRecovered {
    pub vault: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
}
