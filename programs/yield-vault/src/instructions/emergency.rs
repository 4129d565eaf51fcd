use anchor_lang::prelude::*;
use anchor_spl::{
    token_2022::Token2022,
    token_interface::{Mint, TokenAccount},
};

use crate::{
    constants::VAULT_SEED,
    error::VaultError,
    events::{EmergencyActivated, EmergencyWithdrawal},
    instructions::harvest::settle_harvest,
    state::{Vault, VaultMode},
    target::{position_value, CpiTarget, TargetAdapter},
};

/// Pull whatever liquidity the target will release right now into the
/// vault's own asset account. Partial liquidity is not an error: the clamp
/// takes what it can and leaves the rest for a follow-up call.
fn drain(adapter: &impl TargetAdapter) -> Result<u64> {
    let value = position_value(adapter)?;
    if value == 0 {
        return Ok(0);
    }

    let max_withdrawable = adapter.max_withdrawable()?;
    let amount = Vault::emergency_drain_amount(value, max_withdrawable);
    if amount == 0 {
        return Ok(0);
    }

    adapter.withdraw(amount)?;
    Ok(amount)
}

#[derive(Accounts)]
pub struct ActivateEmergency<'info> {
    #[account(
        constraint = authority.key() == vault.authority @ VaultError::Unauthorized,
    )]
    pub authority: Signer<'info>,

    #[account(mut)]
    pub vault: Account<'info, Vault>,

    #[account(
        mut,
        constraint = shares_mint.key() == vault.shares_mint,
    )]
    pub shares_mint: InterfaceAccount<'info, Mint>,

    #[account(
        mut,
        constraint = treasury_shares_account.mint == vault.shares_mint,
        constraint = treasury_shares_account.owner == vault.treasury,
    )]
    pub treasury_shares_account: InterfaceAccount<'info, TokenAccount>,

    /// CHECK: Validated against the address recorded at initialization
    #[account(constraint = target_program.key() == vault.target_program)]
    pub target_program: UncheckedAccount<'info>,

    #[account(constraint = target_shares_account.key() == vault.target_shares_account)]
    pub target_shares_account: InterfaceAccount<'info, TokenAccount>,

    pub token_2022_program: Program<'info, Token2022>,
}

/// Irreversibly leave normal operation and liquidate the target position.
///
/// When the target is still responsive the caller forwards its accounts and
/// the handler harvests the final fee and drains available liquidity in the
/// same transaction. Against a bricked target the caller passes no
/// remaining accounts: the transition must never depend on a call that can
/// revert, so the flag flips on the vault's own ledger alone.
pub fn activate_emergency_mode<'info>(ctx: Context<'_, '_, '_, 'info, ActivateEmergency<'info>>) -> Result<()> {
    require!(
        ctx.accounts.vault.mode.can_transition_to(VaultMode::Emergency),
        VaultError::InvalidModeTransition
    );

    let asset_mint_key = ctx.accounts.vault.asset_mint;
    let vault_id_bytes = ctx.accounts.vault.vault_id.to_le_bytes();
    let bump = ctx.accounts.vault.bump;
    let signer_seeds: &[&[&[u8]]] = &[&[
        VAULT_SEED,
        asset_mint_key.as_ref(),
        vault_id_bytes.as_ref(),
        &[bump],
    ]];

    let mut recovered = 0u64;
    if !ctx.remaining_accounts.is_empty() {
        let adapter = CpiTarget::new(
            ctx.accounts.target_program.to_account_info(),
            ctx.remaining_accounts,
            ctx.accounts.vault.key(),
            ctx.accounts.target_shares_account.amount,
            signer_seeds,
        );

        // Final harvest: profit up to this point is still fairly attributed
        let total_shares = ctx.accounts.shares_mint.supply;
        settle_harvest(
            &mut ctx.accounts.vault,
            &adapter,
            total_shares,
            ctx.accounts.shares_mint.to_account_info(),
            ctx.accounts.treasury_shares_account.to_account_info(),
            ctx.accounts.token_2022_program.to_account_info(),
            signer_seeds,
        )?;

        recovered = drain(&adapter)?;
    }

    let vault = &mut ctx.accounts.vault;
    vault.transition(VaultMode::Emergency)?;
    // Liquidation drives the target position toward zero; the mark resets
    // with it.
    vault.last_total_assets = 0;

    msg!("emergency mode activated, recovered {}", recovered);
    emit!(EmergencyActivated {
        vault: ctx.accounts.vault.key(),
        authority: ctx.accounts.authority.key(),
        recovered,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct EmergencyWithdraw<'info> {
    #[account(
        constraint = authority.key() == vault.authority @ VaultError::Unauthorized,
    )]
    pub authority: Signer<'info>,

    #[account(mut)]
    pub vault: Account<'info, Vault>,

    /// CHECK: Validated against the address recorded at initialization
    #[account(constraint = target_program.key() == vault.target_program)]
    pub target_program: UncheckedAccount<'info>,

    #[account(constraint = target_shares_account.key() == vault.target_shares_account)]
    pub target_shares_account: InterfaceAccount<'info, TokenAccount>,
}

/// Continue draining the target after emergency activation. Repeatable:
/// each call takes min(position value, reported withdrawable liquidity)
/// and recovering nothing is a success, not an error.
pub fn emergency_withdraw<'info>(ctx: Context<'_, '_, '_, 'info, EmergencyWithdraw<'info>>) -> Result<()> {
    match ctx.accounts.vault.mode {
        VaultMode::Normal => return err!(VaultError::NotInEmergencyMode),
        // The recovery snapshot is frozen; late-arriving liquidity could no
        // longer be attributed to holders.
        VaultMode::Recovery => return err!(VaultError::DisabledDuringRecoveryMode),
        VaultMode::Emergency => {}
    }

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

    let recovered = drain(&adapter)?;

    emit!(EmergencyWithdrawal {
        vault: ctx.accounts.vault.key(),
        recovered,
    });

    Ok(())
}
