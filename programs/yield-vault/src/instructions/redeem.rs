use anchor_lang::prelude::*;
use anchor_spl::{
    token_2022::{self, Burn, Token2022},
    token_interface::{transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked},
};

use crate::{
    constants::VAULT_SEED,
    error::VaultError,
    events::{RecoveryRedeem, Withdraw as WithdrawEvent},
    instructions::harvest::settle_harvest,
    math::{convert_to_assets, Rounding},
    state::{Vault, VaultMode},
    target::{CpiTarget, TargetAdapter},
};

#[derive(Accounts)]
pub struct Redeem<'info> {
    #[account(mut)]
    pub user: Signer<'info>,

    #[account(mut)]
    pub vault: Account<'info, Vault>,

    #[account(
        constraint = asset_mint.key() == vault.asset_mint,
    )]
    pub asset_mint: InterfaceAccount<'info, Mint>,

    /// Assets are paid out here; any account of the asset mint
    #[account(
        mut,
        constraint = receiver_asset_account.mint == vault.asset_mint,
    )]
    pub receiver_asset_account: InterfaceAccount<'info, TokenAccount>,

    #[account(
        mut,
        constraint = asset_vault.key() == vault.asset_vault,
    )]
    pub asset_vault: InterfaceAccount<'info, TokenAccount>,

    #[account(
        mut,
        constraint = shares_mint.key() == vault.shares_mint,
    )]
    pub shares_mint: InterfaceAccount<'info, Mint>,

    #[account(
        mut,
        constraint = user_shares_account.mint == vault.shares_mint,
        constraint = user_shares_account.owner == user.key(),
    )]
    pub user_shares_account: InterfaceAccount<'info, TokenAccount>,

    #[account(
        mut,
        constraint = treasury_shares_account.mint == vault.shares_mint,
        constraint = treasury_shares_account.owner == vault.treasury,
    )]
    pub treasury_shares_account: InterfaceAccount<'info, TokenAccount>,

    /// CHECK: Validated against the address recorded at initialization.
    /// Never invoked in recovery mode, so a bricked target cannot block exits.
    #[account(constraint = target_program.key() == vault.target_program)]
    pub target_program: UncheckedAccount<'info>,

    #[account(constraint = target_shares_account.key() == vault.target_shares_account)]
    pub target_shares_account: InterfaceAccount<'info, TokenAccount>,

    pub asset_token_program: Interface<'info, TokenInterface>,
    pub token_2022_program: Program<'info, Token2022>,
}

/// Redeem shares for assets.
///
/// Normal mode prices at the live ratio (floor rounding - protects vault)
/// after a harvest. Recovery mode prices at the frozen recovery ratio and
/// touches nothing but the vault's own accounts.
pub fn handler<'info>(ctx: Context<'_, '_, '_, 'info, Redeem<'info>>, shares: u64, min_assets_out: u64) -> Result<()> {
    require!(shares > 0, VaultError::ZeroAmount);
    require!(
        ctx.accounts.user_shares_account.amount >= shares,
        VaultError::InsufficientShares
    );

    match ctx.accounts.vault.mode {
        VaultMode::Normal => redeem_normal(ctx, shares, min_assets_out),
        VaultMode::Emergency => err!(VaultError::DisabledDuringEmergencyMode),
        VaultMode::Recovery => redeem_recovery(ctx, shares, min_assets_out),
    }
}

fn redeem_normal<'info>(ctx: Context<'_, '_, '_, 'info, Redeem<'info>>, shares: u64, min_assets_out: u64) -> Result<()> {
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

    let total_shares = ctx.accounts.shares_mint.supply;
    let outcome = settle_harvest(
        &mut ctx.accounts.vault,
        &adapter,
        total_shares,
        ctx.accounts.shares_mint.to_account_info(),
        ctx.accounts.treasury_shares_account.to_account_info(),
        ctx.accounts.token_2022_program.to_account_info(),
        signer_seeds,
    )?;
    let total_shares = outcome.supply_after(total_shares)?;

    // Calculate assets to receive (floor rounding - user gets less)
    let assets = convert_to_assets(
        shares,
        outcome.current_total,
        total_shares,
        ctx.accounts.vault.decimals_offset,
        Rounding::Floor,
    )?;

    // Slippage check
    require!(assets >= min_assets_out, VaultError::SlippageExceeded);
    require!(
        assets <= outcome.current_total,
        VaultError::InsufficientAssets
    );

    // Pull assets out of the yield target into the vault
    if assets > 0 {
        adapter.withdraw(assets)?;
    }

    // Burn shares from user
    token_2022::burn(
        CpiContext::new(
            ctx.accounts.token_2022_program.to_account_info(),
            Burn {
                mint: ctx.accounts.shares_mint.to_account_info(),
                from: ctx.accounts.user_shares_account.to_account_info(),
                authority: ctx.accounts.user.to_account_info(),
            },
        ),
        shares,
    )?;

    if assets > 0 {
        transfer_checked(
            CpiContext::new_with_signer(
                ctx.accounts.asset_token_program.to_account_info(),
                TransferChecked {
                    from: ctx.accounts.asset_vault.to_account_info(),
                    to: ctx.accounts.receiver_asset_account.to_account_info(),
                    mint: ctx.accounts.asset_mint.to_account_info(),
                    authority: ctx.accounts.vault.to_account_info(),
                },
                signer_seeds,
            ),
            assets,
            ctx.accounts.asset_mint.decimals,
        )?;
    }

    let vault = &mut ctx.accounts.vault;
    vault.note_assets_removed(assets)?;

    emit!(WithdrawEvent {
        vault: ctx.accounts.vault.key(),
        caller: ctx.accounts.user.key(),
        receiver: ctx.accounts.receiver_asset_account.owner,
        owner: ctx.accounts.user.key(),
        assets,
        shares,
    });

    Ok(())
}

/// Frozen-ratio exit: no harvest, no target calls, only the vault's own
/// token accounts and the snapshot taken at recovery activation.
fn redeem_recovery<'info>(ctx: Context<'_, '_, '_, 'info, Redeem<'info>>, shares: u64, min_assets_out: u64) -> Result<()> {
    let assets = ctx.accounts.vault.recovery_redeem(shares)?;
    require!(assets >= min_assets_out, VaultError::SlippageExceeded);

    // Burn shares from user
    token_2022::burn(
        CpiContext::new(
            ctx.accounts.token_2022_program.to_account_info(),
            Burn {
                mint: ctx.accounts.shares_mint.to_account_info(),
                from: ctx.accounts.user_shares_account.to_account_info(),
                authority: ctx.accounts.user.to_account_info(),
            },
        ),
        shares,
    )?;

    if assets > 0 {
        let asset_mint_key = ctx.accounts.vault.asset_mint;
        let vault_id_bytes = ctx.accounts.vault.vault_id.to_le_bytes();
        let bump = ctx.accounts.vault.bump;
        let signer_seeds: &[&[&[u8]]] = &[&[
            VAULT_SEED,
            asset_mint_key.as_ref(),
            vault_id_bytes.as_ref(),
            &[bump],
        ]];

        transfer_checked(
            CpiContext::new_with_signer(
                ctx.accounts.asset_token_program.to_account_info(),
                TransferChecked {
                    from: ctx.accounts.asset_vault.to_account_info(),
                    to: ctx.accounts.receiver_asset_account.to_account_info(),
                    mint: ctx.accounts.asset_mint.to_account_info(),
                    authority: ctx.accounts.vault.to_account_info(),
                },
                signer_seeds,
            ),
            assets,
            ctx.accounts.asset_mint.decimals,
        )?;
    }

    emit!(RecoveryRedeem {
        vault: ctx.accounts.vault.key(),
        owner: ctx.accounts.user.key(),
        receiver: ctx.accounts.receiver_asset_account.owner,
        shares,
        assets,
    });

    Ok(())
}
