use anchor_lang::prelude::*;
use anchor_spl::token_interface::TokenAccount;

use crate::{
    constants::VAULT_SEED,
    error::VaultError,
    events::UnallocatedAssetsDeposited,
    state::Vault,
    target::{CpiTarget, TargetAdapter},
};

#[derive(Accounts)]
pub struct DepositUnallocatedAssets<'info> {
    #[account(
        constraint = manager.key() == vault.manager @ VaultError::Unauthorized,
    )]
    pub manager: Signer<'info>,

    #[account(mut)]
    pub vault: Account<'info, Vault>,

    #[account(
        mut,
        constraint = asset_vault.key() == vault.asset_vault,
    )]
    pub asset_vault: InterfaceAccount<'info, TokenAccount>,

    /// CHECK: Validated against the address recorded at initialization
    #[account(constraint = target_program.key() == vault.target_program)]
    pub target_program: UncheckedAccount<'info>,

    #[account(constraint = target_shares_account.key() == vault.target_shares_account)]
    pub target_shares_account: InterfaceAccount<'info, TokenAccount>,
}

/// Deploy idle asset balance (donations, reward distributions, anything
/// that bypassed `deposit`) into the yield target, clamped to the target's
/// remaining capacity. Repeatable.
///
/// Deliberately skips the harvest and leaves the high-water mark alone:
/// the swept amount surfaces as profit at the next harvest, alongside any
/// organic yield accrued in the meantime.
pub fn handler<'info>(ctx: Context<'_, '_, '_, 'info, DepositUnallocatedAssets<'info>>) -> Result<()> {
    ctx.accounts.vault.assert_normal()?;

    let asset_mint_key = ctx.accounts.vault.asset_mint;
    let vault_id_bytes = ctx.accounts.vault.vault_id.to_le_bytes();
    let bump = ctx.accounts.vault.bump;
    let signer_seeds: &[&[&[u8]]] = &[&[
        VAULT_SEED,
        asset_mint_key.as_ref(),
        vault_id_bytes.as_ref(),
        &[bump],
    ]];

    let adapter = CpiTarget::new(
        ctx.accounts.target_program.to_account_info(),
        ctx.remaining_accounts,
        ctx.accounts.vault.key(),
        ctx.accounts.target_shares_account.amount,
        signer_seeds,
    );

    let idle_balance = ctx.accounts.asset_vault.amount;
    let remaining_capacity = adapter.remaining_capacity()?;
    let amount = Vault::sweep_amount(idle_balance, remaining_capacity);
    require!(amount > 0, VaultError::TargetDepositFailed);

    adapter.deposit(amount)?;

    emit!(UnallocatedAssetsDeposited {
        vault: ctx.accounts.vault.key(),
        swept: amount,
        remaining_idle: idle_balance - amount,
    });

    Ok(())
}
