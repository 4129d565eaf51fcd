use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount};

use crate::{
    error::VaultError,
    events::RecoveryActivated,
    state::Vault,
};

/// Deliberately takes no target accounts: the snapshot must be obtainable
/// even when every call into the target reverts.
#[derive(Accounts)]
pub struct ActivateRecovery<'info> {
    #[account(
        constraint = authority.key() == vault.authority @ VaultError::Unauthorized,
    )]
    pub authority: Signer<'info>,

    #[account(mut)]
    pub vault: Account<'info, Vault>,

    #[account(
        constraint = asset_vault.key() == vault.asset_vault,
    )]
    pub asset_vault: InterfaceAccount<'info, TokenAccount>,

    #[account(
        constraint = shares_mint.key() == vault.shares_mint,
    )]
    pub shares_mint: InterfaceAccount<'info, Mint>,
}

/// Freeze the redeemable-assets/outstanding-supply ratio from the vault's
/// own ledger. Requires emergency mode; one-way.
pub fn handler(ctx: Context<ActivateRecovery>) -> Result<()> {
    let idle_balance = ctx.accounts.asset_vault.amount;
    let total_shares = ctx.accounts.shares_mint.supply;

    let vault = &mut ctx.accounts.vault;
    vault.freeze_recovery(idle_balance, total_shares)?;

    msg!(
        "recovery activated: {} assets / {} shares",
        idle_balance,
        total_shares
    );
    emit!(RecoveryActivated {
        vault: vault.key(),
        recovery_assets: idle_balance,
        recovery_supply: total_shares,
    });

    Ok(())
}
