use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token_2022::{self, MintTo, Token2022},
    token_interface::{transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked},
};

use crate::{
    constants::VAULT_SEED,
    error::VaultError,
    events::Deposit as DepositEvent,
    instructions::harvest::settle_harvest,
    math::{convert_to_shares, Rounding},
    state::Vault,
    target::{CpiTarget, TargetAdapter},
};

#[derive(Accounts)]
pub struct Deposit<'info> {
    #[account(mut)]
    pub user: Signer<'info>,

    #[account(mut)]
    pub vault: Account<'info, Vault>,

    #[account(
        constraint = asset_mint.key() == vault.asset_mint,
    )]
    pub asset_mint: InterfaceAccount<'info, Mint>,

    #[account(
        mut,
        constraint = user_asset_account.mint == vault.asset_mint,
        constraint = user_asset_account.owner == user.key(),
    )]
    pub user_asset_account: InterfaceAccount<'info, TokenAccount>,

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
        init_if_needed,
        payer = user,
        associated_token::mint = shares_mint,
        associated_token::authority = user,
        associated_token::token_program = token_2022_program,
    )]
    pub user_shares_account: InterfaceAccount<'info, TokenAccount>,

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

    pub asset_token_program: Interface<'info, TokenInterface>,
    pub token_2022_program: Program<'info, Token2022>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

/// Deposit assets, receive shares (floor rounding - protects vault)
pub fn handler<'info>(ctx: Context<'_, '_, '_, 'info, Deposit<'info>>, assets: u64, min_shares_out: u64) -> Result<()> {
    require!(assets > 0, VaultError::ZeroAmount);
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

    // Harvest first: profit accrued until now is attributed at the old rate.
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

    let vault = &ctx.accounts.vault;
    if total_shares == 0 {
        require!(
            assets >= vault.min_first_deposit,
            VaultError::FirstDepositTooSmall
        );
    }

    // Calculate shares to mint (floor rounding - user gets less)
    let shares = convert_to_shares(
        assets,
        outcome.current_total,
        total_shares,
        vault.decimals_offset,
        Rounding::Floor,
    )?;
    require!(shares > 0, VaultError::ZeroAmount);

    // Slippage check
    require!(shares >= min_shares_out, VaultError::SlippageExceeded);

    // Transfer assets from user to vault
    transfer_checked(
        CpiContext::new(
            ctx.accounts.asset_token_program.to_account_info(),
            TransferChecked {
                from: ctx.accounts.user_asset_account.to_account_info(),
                to: ctx.accounts.asset_vault.to_account_info(),
                mint: ctx.accounts.asset_mint.to_account_info(),
                authority: ctx.accounts.user.to_account_info(),
            },
        ),
        assets,
        ctx.accounts.asset_mint.decimals,
    )?;

    // Route the fresh principal into the yield target
    adapter.deposit(assets)?;

    // Mint shares to user (vault PDA is mint authority)
    token_2022::mint_to(
        CpiContext::new_with_signer(
            ctx.accounts.token_2022_program.to_account_info(),
            MintTo {
                mint: ctx.accounts.shares_mint.to_account_info(),
                to: ctx.accounts.user_shares_account.to_account_info(),
                authority: ctx.accounts.vault.to_account_info(),
            },
            signer_seeds,
        ),
        shares,
    )?;

    // Principal moved into the target is not profit for the next harvest
    let vault = &mut ctx.accounts.vault;
    vault.note_assets_added(assets)?;

    emit!(DepositEvent {
        vault: ctx.accounts.vault.key(),
        caller: ctx.accounts.user.key(),
        owner: ctx.accounts.user.key(),
        assets,
        shares,
    });

    Ok(())
}
