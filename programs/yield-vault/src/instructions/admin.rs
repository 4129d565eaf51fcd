use anchor_lang::prelude::*;
use anchor_spl::{
    token_2022::Token2022,
    token_interface::{
        transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked,
    },
};

use crate::{
    constants::{MAX_REWARD_FEE_BPS, VAULT_SEED},
    error::VaultError,
    events::{MinFirstDepositUpdated, RewardFeeUpdated, TokenRecovered},
    instructions::harvest::settle_harvest,
    state::Vault,
    target::CpiTarget,
};

#[derive(Accounts)]
pub struct SetRewardFee<'info> {
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

/// Change the reward fee rate. Profit accrued so far is harvested at the
/// old rate first, so a rate change can never re-price history.
pub fn set_reward_fee<'info>(ctx: Context<'_, '_, '_, 'info, SetRewardFee<'info>>, bps: u16) -> Result<()> {
    require!(bps <= MAX_REWARD_FEE_BPS, VaultError::InvalidFee);

    if ctx.accounts.vault.is_normal() {
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
        settle_harvest(
            &mut ctx.accounts.vault,
            &adapter,
            total_shares,
            ctx.accounts.shares_mint.to_account_info(),
            ctx.accounts.treasury_shares_account.to_account_info(),
            ctx.accounts.token_2022_program.to_account_info(),
            signer_seeds,
        )?;
    }

    let vault = &mut ctx.accounts.vault;
    let previous_bps = vault.reward_fee_bps;
    vault.reward_fee_bps = bps;

    emit!(RewardFeeUpdated {
        vault: vault.key(),
        previous_bps,
        new_bps: bps,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct UpdateConfig<'info> {
    #[account(
        constraint = authority.key() == vault.authority @ VaultError::Unauthorized,
    )]
    pub authority: Signer<'info>,

    #[account(mut)]
    pub vault: Account<'info, Vault>,
}

pub fn set_min_first_deposit(ctx: Context<UpdateConfig>, amount: u64) -> Result<()> {
    let vault = &mut ctx.accounts.vault;
    let previous_amount = vault.min_first_deposit;
    vault.min_first_deposit = amount;

    emit!(MinFirstDepositUpdated {
        vault: vault.key(),
        previous_amount,
        new_amount: amount,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct RecoverToken<'info> {
    #[account(
        constraint = authority.key() == vault.authority @ VaultError::Unauthorized,
    )]
    pub authority: Signer<'info>,

    pub vault: Account<'info, Vault>,

    pub token_mint: InterfaceAccount<'info, Mint>,

    /// Stray token account owned by the vault PDA. The target's claim
    /// token backs every holder's exit and must stay; the vault's own
    /// asset and share tokens are accounted ledger state.
    #[account(
        mut,
        constraint = recover_from.owner == vault.key(),
        constraint = recover_from.key() != vault.target_shares_account
            @ VaultError::CannotRecoverForeignTargetShares,
        constraint = recover_from.mint != vault.asset_mint
            @ VaultError::CannotRecoverVaultAssets,
        constraint = recover_from.mint != vault.shares_mint
            @ VaultError::CannotRecoverVaultAssets,
        constraint = recover_from.mint == token_mint.key(),
    )]
    pub recover_from: InterfaceAccount<'info, TokenAccount>,

    #[account(
        mut,
        constraint = destination.mint == token_mint.key(),
    )]
    pub destination: InterfaceAccount<'info, TokenAccount>,

    pub token_program: Interface<'info, TokenInterface>,
}

/// Move tokens that were sent to the vault by mistake. Refuses anything
/// the engine accounts for.
pub fn recover_token(ctx: Context<RecoverToken>, amount: u64) -> Result<()> {
    require!(amount > 0, VaultError::ZeroAmount);

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
            ctx.accounts.token_program.to_account_info(),
            TransferChecked {
                from: ctx.accounts.recover_from.to_account_info(),
                to: ctx.accounts.destination.to_account_info(),
                mint: ctx.accounts.token_mint.to_account_info(),
                authority: ctx.accounts.vault.to_account_info(),
            },
            signer_seeds,
        ),
        amount,
        ctx.accounts.token_mint.decimals,
    )?;

    emit!(TokenRecovered {
        vault: ctx.accounts.vault.key(),
        mint: ctx.accounts.token_mint.key(),
        amount,
    });

    Ok(())
}
