use anchor_lang::prelude::*;
use anchor_spl::{
    token_2022::{self, MintTo, Token2022},
    token_interface::{Mint, TokenAccount},
};

use crate::{
    constants::VAULT_SEED,
    events::FeesHarvested,
    state::{HarvestOutcome, Vault},
    target::{position_value, CpiTarget, TargetAdapter},
};

/// Price and settle a fee harvest: read the target position, compute the
/// profit over the high-water mark, mint fee shares to the treasury at the
/// pre-mint ratio, and advance the mark.
///
/// Every supply-changing operation runs this before pricing itself, so
/// profit is attributed exactly once even across fee-rate changes.
pub(crate) fn settle_harvest<'info>(
    vault: &mut Account<'info, Vault>,
    adapter: &impl TargetAdapter,
    total_shares: u64,
    shares_mint: AccountInfo<'info>,
    treasury_shares_account: AccountInfo<'info>,
    token_2022_program: AccountInfo<'info>,
    signer_seeds: &[&[&[u8]]],
) -> Result<HarvestOutcome> {
    let current_total = position_value(adapter)?;
    let outcome = vault.preview_harvest(current_total, total_shares)?;

    if outcome.fee_shares > 0 {
        token_2022::mint_to(
            CpiContext::new_with_signer(
                token_2022_program,
                MintTo {
                    mint: shares_mint,
                    to: treasury_shares_account,
                    authority: vault.to_account_info(),
                },
                signer_seeds,
            ),
            outcome.fee_shares,
        )?;
    }

    vault.apply_harvest(&outcome);

    if outcome.profit > 0 {
        emit!(FeesHarvested {
            vault: vault.key(),
            profit: outcome.profit,
            fee_value: outcome.fee_value,
            fee_shares: outcome.fee_shares,
            new_high_water_mark: outcome.current_total,
        });
    }

    Ok(outcome)
}

#[derive(Accounts)]
pub struct HarvestFees<'info> {
    pub caller: Signer<'info>,

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

/// Harvest fees on demand. Callable by anyone; a no-op when there is no
/// profit over the high-water mark.
pub fn handler<'info>(ctx: Context<'_, '_, '_, 'info, HarvestFees<'info>>) -> Result<()> {
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

    Ok(())
}
