use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::invoke_signed;
use anchor_spl::{
    associated_token::AssociatedToken,
    token_2022::{
        spl_token_2022::{
            extension::ExtensionType, instruction::initialize_mint2, state::Mint as SplMint,
        },
        Token2022,
    },
    token_interface::{Mint, TokenAccount, TokenInterface},
};

use crate::{
    constants::{
        MAX_DECIMALS, MAX_REWARD_FEE_BPS, MAX_VIRTUAL_OFFSET, SHARES_DECIMALS, SHARES_MINT_SEED,
        VAULT_SEED,
    },
    error::VaultError,
    events::VaultInitialized,
    state::{Vault, VaultMode},
};

#[derive(Accounts)]
#[instruction(vault_id: u64)]
pub struct Initialize<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        init,
        payer = authority,
        space = Vault::LEN,
        seeds = [VAULT_SEED, asset_mint.key().as_ref(), &vault_id.to_le_bytes()],
        bump
    )]
    pub vault: Account<'info, Vault>,

    pub asset_mint: InterfaceAccount<'info, Mint>,

    /// CHECK: Shares mint is initialized via CPI in handler
    #[account(
        mut,
        seeds = [SHARES_MINT_SEED, vault.key().as_ref()],
        bump
    )]
    pub shares_mint: UncheckedAccount<'info>,

    #[account(
        init,
        payer = authority,
        associated_token::mint = asset_mint,
        associated_token::authority = vault,
        associated_token::token_program = asset_token_program,
    )]
    pub asset_vault: InterfaceAccount<'info, TokenAccount>,

    /// CHECK: Yield target program; only its address is recorded
    pub target_program: UncheckedAccount<'info>,

    /// Vault-owned account that will hold the target's claim tokens
    #[account(
        constraint = target_shares_account.owner == vault.key(),
    )]
    pub target_shares_account: InterfaceAccount<'info, TokenAccount>,

    pub asset_token_program: Interface<'info, TokenInterface>,
    pub token_2022_program: Program<'info, Token2022>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

pub fn handler(
    ctx: Context<Initialize>,
    vault_id: u64,
    decimals_offset: u8,
    min_first_deposit: u64,
    reward_fee_bps: u16,
    treasury: Pubkey,
    manager: Pubkey,
) -> Result<()> {
    let asset_decimals = ctx.accounts.asset_mint.decimals;
    require!(
        asset_decimals <= MAX_DECIMALS,
        VaultError::InvalidAssetDecimals
    );
    require!(
        decimals_offset <= MAX_VIRTUAL_OFFSET,
        VaultError::InvalidOffset
    );
    require!(
        reward_fee_bps <= MAX_REWARD_FEE_BPS,
        VaultError::InvalidFee
    );
    require!(treasury != Pubkey::default(), VaultError::ZeroAddress);
    require!(manager != Pubkey::default(), VaultError::ZeroAddress);

    let vault_key = ctx.accounts.vault.key();
    let shares_mint_bump = ctx.bumps.shares_mint;

    let mint_size = ExtensionType::try_calculate_account_len::<SplMint>(&[])
        .map_err(|_| VaultError::MathOverflow)?;

    let rent = &ctx.accounts.rent;
    let lamports = rent.minimum_balance(mint_size);

    let shares_mint_bump_bytes = [shares_mint_bump];
    let shares_mint_seeds: &[&[u8]] = &[
        SHARES_MINT_SEED,
        vault_key.as_ref(),
        &shares_mint_bump_bytes,
    ];

    // Create the shares mint account at its PDA
    invoke_signed(
        &anchor_lang::solana_program::system_instruction::create_account(
            &ctx.accounts.authority.key(),
            &ctx.accounts.shares_mint.key(),
            lamports,
            mint_size as u64,
            &ctx.accounts.token_2022_program.key(),
        ),
        &[
            ctx.accounts.authority.to_account_info(),
            ctx.accounts.shares_mint.to_account_info(),
            ctx.accounts.system_program.to_account_info(),
        ],
        &[shares_mint_seeds],
    )?;

    // Initialize mint (vault PDA is mint authority, no freeze authority)
    let init_mint_ix = initialize_mint2(
        &ctx.accounts.token_2022_program.key(),
        &ctx.accounts.shares_mint.key(),
        &vault_key,
        None,
        SHARES_DECIMALS,
    )?;

    invoke_signed(
        &init_mint_ix,
        &[ctx.accounts.shares_mint.to_account_info()],
        &[shares_mint_seeds],
    )?;

    let vault = &mut ctx.accounts.vault;
    vault.authority = ctx.accounts.authority.key();
    vault.manager = manager;
    vault.treasury = treasury;
    vault.asset_mint = ctx.accounts.asset_mint.key();
    vault.shares_mint = ctx.accounts.shares_mint.key();
    vault.asset_vault = ctx.accounts.asset_vault.key();
    vault.target_program = ctx.accounts.target_program.key();
    vault.target_shares_account = ctx.accounts.target_shares_account.key();
    vault.last_total_assets = 0;
    vault.reward_fee_bps = reward_fee_bps;
    vault.decimals_offset = decimals_offset;
    vault.min_first_deposit = min_first_deposit;
    vault.mode = VaultMode::Normal;
    vault.recovery_assets = 0;
    vault.recovery_supply = 0;
    vault.bump = ctx.bumps.vault;
    vault.vault_id = vault_id;
    vault._reserved = [0u8; 64];

    emit!(VaultInitialized {
        vault: vault.key(),
        authority: vault.authority,
        asset_mint: vault.asset_mint,
        shares_mint: vault.shares_mint,
        target_program: vault.target_program,
        vault_id,
    });

    Ok(())
}
