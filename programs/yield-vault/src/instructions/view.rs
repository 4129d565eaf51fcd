use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::set_return_data;
use anchor_spl::token_interface::{Mint, TokenAccount};

use crate::{
    math::{convert_to_assets, convert_to_shares, mul_div, Rounding},
    state::{Vault, VaultMode},
    target::{position_value, CpiTarget, TargetAdapter},
};

#[derive(Accounts)]
pub struct VaultView<'info> {
    pub vault: Account<'info, Vault>,

    #[account(constraint = shares_mint.key() == vault.shares_mint)]
    pub shares_mint: InterfaceAccount<'info, Mint>,

    #[account(constraint = asset_vault.key() == vault.asset_vault)]
    pub asset_vault: InterfaceAccount<'info, TokenAccount>,

    /// CHECK: Validated against the address recorded at initialization
    #[account(constraint = target_program.key() == vault.target_program)]
    pub target_program: UncheckedAccount<'info>,

    #[account(constraint = target_shares_account.key() == vault.target_shares_account)]
    pub target_shares_account: InterfaceAccount<'info, TokenAccount>,
}

#[derive(Accounts)]
pub struct VaultViewWithOwner<'info> {
    pub vault: Account<'info, Vault>,

    #[account(constraint = shares_mint.key() == vault.shares_mint)]
    pub shares_mint: InterfaceAccount<'info, Mint>,

    #[account(constraint = asset_vault.key() == vault.asset_vault)]
    pub asset_vault: InterfaceAccount<'info, TokenAccount>,

    /// CHECK: Validated against the address recorded at initialization
    #[account(constraint = target_program.key() == vault.target_program)]
    pub target_program: UncheckedAccount<'info>,

    #[account(constraint = target_shares_account.key() == vault.target_shares_account)]
    pub target_shares_account: InterfaceAccount<'info, TokenAccount>,

    #[account(
        constraint = owner_shares_account.mint == vault.shares_mint,
    )]
    pub owner_shares_account: InterfaceAccount<'info, TokenAccount>,
}

fn adapter<'a, 'info>(
    target_program: &UncheckedAccount<'info>,
    remaining_accounts: &'a [AccountInfo<'info>],
    vault_key: Pubkey,
    target_shares_balance: u64,
) -> CpiTarget<'a, 'info> {
    // View CPIs need no vault signature
    CpiTarget::new(
        target_program.to_account_info(),
        remaining_accounts,
        vault_key,
        target_shares_balance,
        &[],
    )
}

/// Live position value plus the post-harvest share supply, so previews
/// price exactly like the mutating call they mirror (which harvests first).
fn totals_after_harvest(
    vault: &Vault,
    supply: u64,
    target: &impl TargetAdapter,
) -> Result<(u64, u64)> {
    let current_total = position_value(target)?;
    let outcome = vault.preview_harvest(current_total, supply)?;
    Ok((current_total, outcome.supply_after(supply)?))
}

/// Preview how many shares would be minted for given assets (floor rounding)
pub fn preview_deposit<'info>(ctx: Context<'_, '_, '_, 'info, VaultView<'info>>, assets: u64) -> Result<()> {
    let vault = &ctx.accounts.vault;

    let shares = if vault.is_normal() {
        let target = adapter(
            &ctx.accounts.target_program,
            ctx.remaining_accounts,
            vault.key(),
            ctx.accounts.target_shares_account.amount,
        );
        let (current_total, total_shares) =
            totals_after_harvest(vault, ctx.accounts.shares_mint.supply, &target)?;
        convert_to_shares(
            assets,
            current_total,
            total_shares,
            vault.decimals_offset,
            Rounding::Floor,
        )?
    } else {
        0
    };

    set_return_data(&shares.to_le_bytes());
    Ok(())
}

/// Preview how many assets are required to mint exact shares (ceiling rounding)
pub fn preview_mint<'info>(ctx: Context<'_, '_, '_, 'info, VaultView<'info>>, shares: u64) -> Result<()> {
    let vault = &ctx.accounts.vault;

    let assets = if vault.is_normal() {
        let target = adapter(
            &ctx.accounts.target_program,
            ctx.remaining_accounts,
            vault.key(),
            ctx.accounts.target_shares_account.amount,
        );
        let (current_total, total_shares) =
            totals_after_harvest(vault, ctx.accounts.shares_mint.supply, &target)?;
        convert_to_assets(
            shares,
            current_total,
            total_shares,
            vault.decimals_offset,
            Rounding::Ceiling,
        )?
    } else {
        0
    };

    set_return_data(&assets.to_le_bytes());
    Ok(())
}

/// Preview how many shares must be burned to withdraw exact assets (ceiling rounding)
pub fn preview_withdraw<'info>(ctx: Context<'_, '_, '_, 'info, VaultView<'info>>, assets: u64) -> Result<()> {
    let vault = &ctx.accounts.vault;

    let shares = if vault.is_normal() {
        let target = adapter(
            &ctx.accounts.target_program,
            ctx.remaining_accounts,
            vault.key(),
            ctx.accounts.target_shares_account.amount,
        );
        let (current_total, total_shares) =
            totals_after_harvest(vault, ctx.accounts.shares_mint.supply, &target)?;
        convert_to_shares(
            assets,
            current_total,
            total_shares,
            vault.decimals_offset,
            Rounding::Ceiling,
        )?
    } else {
        0
    };

    set_return_data(&shares.to_le_bytes());
    Ok(())
}

/// Preview how many assets would be received for redeeming shares.
/// Normal mode: floor at the live ratio. Recovery mode: the frozen ratio.
pub fn preview_redeem<'info>(ctx: Context<'_, '_, '_, 'info, VaultView<'info>>, shares: u64) -> Result<()> {
    let vault = &ctx.accounts.vault;

    let assets = match vault.mode {
        VaultMode::Normal => {
            let target = adapter(
                &ctx.accounts.target_program,
                ctx.remaining_accounts,
                vault.key(),
                ctx.accounts.target_shares_account.amount,
            );
            let (current_total, total_shares) =
                totals_after_harvest(vault, ctx.accounts.shares_mint.supply, &target)?;
            convert_to_assets(
                shares,
                current_total,
                total_shares,
                vault.decimals_offset,
                Rounding::Floor,
            )?
        }
        VaultMode::Emergency => 0,
        VaultMode::Recovery => {
            if vault.recovery_supply == 0 {
                0
            } else {
                mul_div(
                    shares,
                    vault.recovery_assets,
                    vault.recovery_supply,
                    Rounding::Floor,
                )?
            }
        }
    };

    set_return_data(&assets.to_le_bytes());
    Ok(())
}

/// Convert assets to shares at the current ratio (floor rounding)
pub fn convert_to_shares_view<'info>(ctx: Context<'_, '_, '_, 'info, VaultView<'info>>, assets: u64) -> Result<()> {
    let vault = &ctx.accounts.vault;

    let shares = match vault.mode {
        VaultMode::Normal => {
            let target = adapter(
                &ctx.accounts.target_program,
                ctx.remaining_accounts,
                vault.key(),
                ctx.accounts.target_shares_account.amount,
            );
            convert_to_shares(
                assets,
                position_value(&target)?,
                ctx.accounts.shares_mint.supply,
                vault.decimals_offset,
                Rounding::Floor,
            )?
        }
        VaultMode::Emergency => convert_to_shares(
            assets,
            ctx.accounts.asset_vault.amount,
            ctx.accounts.shares_mint.supply,
            vault.decimals_offset,
            Rounding::Floor,
        )?,
        VaultMode::Recovery => {
            if vault.recovery_assets == 0 {
                0
            } else {
                mul_div(
                    assets,
                    vault.recovery_supply,
                    vault.recovery_assets,
                    Rounding::Floor,
                )?
            }
        }
    };

    set_return_data(&shares.to_le_bytes());
    Ok(())
}

/// Convert shares to assets at the current ratio (floor rounding)
pub fn convert_to_assets_view<'info>(ctx: Context<'_, '_, '_, 'info, VaultView<'info>>, shares: u64) -> Result<()> {
    let vault = &ctx.accounts.vault;

    let assets = match vault.mode {
        VaultMode::Normal => {
            let target = adapter(
                &ctx.accounts.target_program,
                ctx.remaining_accounts,
                vault.key(),
                ctx.accounts.target_shares_account.amount,
            );
            convert_to_assets(
                shares,
                position_value(&target)?,
                ctx.accounts.shares_mint.supply,
                vault.decimals_offset,
                Rounding::Floor,
            )?
        }
        VaultMode::Emergency => convert_to_assets(
            shares,
            ctx.accounts.asset_vault.amount,
            ctx.accounts.shares_mint.supply,
            vault.decimals_offset,
            Rounding::Floor,
        )?,
        VaultMode::Recovery => {
            if vault.recovery_supply == 0 {
                0
            } else {
                mul_div(
                    shares,
                    vault.recovery_assets,
                    vault.recovery_supply,
                    Rounding::Floor,
                )?
            }
        }
    };

    set_return_data(&assets.to_le_bytes());
    Ok(())
}

/// Total assets backing outstanding shares. In normal mode the idle
/// balance is excluded until explicitly swept; in degraded modes only the
/// vault's own ledger is consulted.
pub fn get_total_assets<'info>(ctx: Context<'_, '_, '_, 'info, VaultView<'info>>) -> Result<()> {
    let vault = &ctx.accounts.vault;

    let total = match vault.mode {
        VaultMode::Normal => {
            let target = adapter(
                &ctx.accounts.target_program,
                ctx.remaining_accounts,
                vault.key(),
                ctx.accounts.target_shares_account.amount,
            );
            position_value(&target)?
        }
        VaultMode::Emergency => ctx.accounts.asset_vault.amount,
        VaultMode::Recovery => vault.recovery_assets,
    };

    set_return_data(&total.to_le_bytes());
    Ok(())
}

/// Maximum assets that can be deposited (u64::MAX in normal mode, else 0)
pub fn max_deposit(ctx: Context<VaultView>) -> Result<()> {
    let max = if ctx.accounts.vault.is_normal() {
        u64::MAX
    } else {
        0u64
    };
    set_return_data(&max.to_le_bytes());
    Ok(())
}

/// Maximum shares that can be minted (u64::MAX in normal mode, else 0)
pub fn max_mint(ctx: Context<VaultView>) -> Result<()> {
    let max = if ctx.accounts.vault.is_normal() {
        u64::MAX
    } else {
        0u64
    };
    set_return_data(&max.to_le_bytes());
    Ok(())
}

/// Maximum assets that owner can withdraw (limited by their shares and the
/// position value)
pub fn max_withdraw<'info>(ctx: Context<'_, '_, '_, 'info, VaultViewWithOwner<'info>>) -> Result<()> {
    let vault = &ctx.accounts.vault;

    if !vault.is_normal() {
        set_return_data(&0u64.to_le_bytes());
        return Ok(());
    }

    let target = adapter(
        &ctx.accounts.target_program,
        ctx.remaining_accounts,
        vault.key(),
        ctx.accounts.target_shares_account.amount,
    );
    let (current_total, total_shares) =
        totals_after_harvest(vault, ctx.accounts.shares_mint.supply, &target)?;

    let max_assets = convert_to_assets(
        ctx.accounts.owner_shares_account.amount,
        current_total,
        total_shares,
        vault.decimals_offset,
        Rounding::Floor,
    )?;

    let max = max_assets.min(current_total);
    set_return_data(&max.to_le_bytes());
    Ok(())
}

/// Maximum shares that owner can redeem (their balance; 0 while redeem is
/// disabled in emergency mode)
pub fn max_redeem(ctx: Context<VaultViewWithOwner>) -> Result<()> {
    let max = match ctx.accounts.vault.mode {
        VaultMode::Emergency => 0,
        VaultMode::Normal | VaultMode::Recovery => ctx.accounts.owner_shares_account.amount,
    };
    set_return_data(&max.to_le_bytes());
    Ok(())
}
