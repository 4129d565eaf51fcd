use anchor_lang::prelude::*;

pub mod constants;
pub mod error;
pub mod events;
pub mod instructions;
pub mod math;
pub mod state;
pub mod target;

use instructions::*;

declare_id!("Bv8aVSQ3KpXw9C2TqQZRZgrNvVTh8TjfpwpoeR1ckDMC");

#[program]
pub mod yield_vault {
    use super::*;

    /// Initialize a new vault for the given asset and yield target
    pub fn initialize(
        ctx: Context<Initialize>,
        vault_id: u64,
        decimals_offset: u8,
        min_first_deposit: u64,
        reward_fee_bps: u16,
        treasury: Pubkey,
        manager: Pubkey,
    ) -> Result<()> {
        instructions::initialize::handler(
            ctx,
            vault_id,
            decimals_offset,
            min_first_deposit,
            reward_fee_bps,
            treasury,
            manager,
        )
    }

    /// Deposit assets and receive shares (floor rounding - favors vault).
    /// Harvests fees first; the principal is routed into the yield target.
    pub fn deposit<'info>(ctx: Context<'_, '_, '_, 'info, Deposit<'info>>, assets: u64, min_shares_out: u64) -> Result<()> {
        instructions::deposit::handler(ctx, assets, min_shares_out)
    }

    /// Mint exact shares by depositing required assets
    /// Pays assets (ceiling rounding - favors vault)
    pub fn mint_shares<'info>(ctx: Context<'_, '_, '_, 'info, MintShares<'info>>, shares: u64, max_assets_in: u64) -> Result<()> {
        instructions::mint::handler(ctx, shares, max_assets_in)
    }

    /// Withdraw exact assets by burning required shares
    /// Burns shares (ceiling rounding - favors vault)
    pub fn withdraw<'info>(ctx: Context<'_, '_, '_, 'info, Withdraw<'info>>, assets: u64, max_shares_in: u64) -> Result<()> {
        instructions::withdraw::handler(ctx, assets, max_shares_in)
    }

    /// Redeem shares for assets (floor rounding - favors vault).
    /// In recovery mode, pays out at the frozen recovery ratio instead.
    pub fn redeem<'info>(ctx: Context<'_, '_, '_, 'info, Redeem<'info>>, shares: u64, min_assets_out: u64) -> Result<()> {
        instructions::redeem::handler(ctx, shares, min_assets_out)
    }

    /// Harvest the performance fee on profit above the high-water mark.
    /// Callable by anyone; a no-op when there is no profit.
    pub fn harvest_fees<'info>(ctx: Context<'_, '_, '_, 'info, HarvestFees<'info>>) -> Result<()> {
        instructions::harvest::handler(ctx)
    }

    /// Update the reward fee rate (harvests at the old rate first)
    pub fn set_reward_fee<'info>(ctx: Context<'_, '_, '_, 'info, SetRewardFee<'info>>, bps: u16) -> Result<()> {
        instructions::admin::set_reward_fee(ctx, bps)
    }

    /// Update the minimum size of the very first deposit
    pub fn set_min_first_deposit(ctx: Context<UpdateConfig>, amount: u64) -> Result<()> {
        instructions::admin::set_min_first_deposit(ctx, amount)
    }

    /// Irreversibly halt normal operation and liquidate the target position
    pub fn activate_emergency_mode<'info>(ctx: Context<'_, '_, '_, 'info, ActivateEmergency<'info>>) -> Result<()> {
        instructions::emergency::activate_emergency_mode(ctx)
    }

    /// Continue draining the target after emergency activation (repeatable)
    pub fn emergency_withdraw<'info>(ctx: Context<'_, '_, '_, 'info, EmergencyWithdraw<'info>>) -> Result<()> {
        instructions::emergency::emergency_withdraw(ctx)
    }

    /// Freeze the recovery ratio from the vault's own ledger (requires
    /// emergency mode; one-way)
    pub fn activate_recovery(ctx: Context<ActivateRecovery>) -> Result<()> {
        instructions::recovery::handler(ctx)
    }

    /// Sweep idle asset balance into the yield target, clamped to the
    /// target's remaining capacity (repeatable)
    pub fn deposit_unallocated_assets<'info>(ctx: Context<'_, '_, '_, 'info, DepositUnallocatedAssets<'info>>) -> Result<()> {
        instructions::sweep::handler(ctx)
    }

    /// Rescue stray tokens; refuses anything the engine accounts for
    pub fn recover_token(ctx: Context<RecoverToken>, amount: u64) -> Result<()> {
        instructions::admin::recover_token(ctx, amount)
    }

    // ============ View Functions (CPI composable) ============

    /// Preview shares for deposit (floor rounding)
    pub fn preview_deposit<'info>(ctx: Context<'_, '_, '_, 'info, VaultView<'info>>, assets: u64) -> Result<()> {
        instructions::view::preview_deposit(ctx, assets)
    }

    /// Preview assets required for mint (ceiling rounding)
    pub fn preview_mint<'info>(ctx: Context<'_, '_, '_, 'info, VaultView<'info>>, shares: u64) -> Result<()> {
        instructions::view::preview_mint(ctx, shares)
    }

    /// Preview shares to burn for withdraw (ceiling rounding)
    pub fn preview_withdraw<'info>(ctx: Context<'_, '_, '_, 'info, VaultView<'info>>, assets: u64) -> Result<()> {
        instructions::view::preview_withdraw(ctx, assets)
    }

    /// Preview assets for redeem (floor rounding; frozen ratio in recovery)
    pub fn preview_redeem<'info>(ctx: Context<'_, '_, '_, 'info, VaultView<'info>>, shares: u64) -> Result<()> {
        instructions::view::preview_redeem(ctx, shares)
    }

    /// Convert assets to shares (floor rounding)
    pub fn convert_to_shares<'info>(ctx: Context<'_, '_, '_, 'info, VaultView<'info>>, assets: u64) -> Result<()> {
        instructions::view::convert_to_shares_view(ctx, assets)
    }

    /// Convert shares to assets (floor rounding)
    pub fn convert_to_assets<'info>(ctx: Context<'_, '_, '_, 'info, VaultView<'info>>, shares: u64) -> Result<()> {
        instructions::view::convert_to_assets_view(ctx, shares)
    }

    /// Get total assets backing outstanding shares
    pub fn total_assets<'info>(ctx: Context<'_, '_, '_, 'info, VaultView<'info>>) -> Result<()> {
        instructions::view::get_total_assets(ctx)
    }

    /// Max assets depositable (u64::MAX in normal mode, else 0)
    pub fn max_deposit(ctx: Context<VaultView>) -> Result<()> {
        instructions::view::max_deposit(ctx)
    }

    /// Max shares mintable (u64::MAX in normal mode, else 0)
    pub fn max_mint(ctx: Context<VaultView>) -> Result<()> {
        instructions::view::max_mint(ctx)
    }

    /// Max assets owner can withdraw
    pub fn max_withdraw<'info>(ctx: Context<'_, '_, '_, 'info, VaultViewWithOwner<'info>>) -> Result<()> {
        instructions::view::max_withdraw(ctx)
    }

    /// Max shares owner can redeem
    pub fn max_redeem(ctx: Context<VaultViewWithOwner>) -> Result<()> {
        instructions::view::max_redeem(ctx)
    }
}
