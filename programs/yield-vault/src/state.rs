use anchor_lang::prelude::*;

use crate::constants::VAULT_SEED;
use crate::error::VaultError;
use crate::math::{convert_to_shares, fee_on_profit, Rounding};

/// Operating mode of the vault. Transitions are one-way:
/// Normal -> Emergency -> Recovery.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum VaultMode {
    Normal,
    Emergency,
    Recovery,
}

impl VaultMode {
    /// Central transition table. Everything not listed here is forbidden.
    pub fn can_transition_to(self, next: VaultMode) -> bool {
        matches!(
            (self, next),
            (VaultMode::Normal, VaultMode::Emergency)
                | (VaultMode::Emergency, VaultMode::Recovery)
        )
    }
}

/// Result of pricing a fee harvest against the high-water mark.
///
/// `fee_shares` is priced at the pre-mint supply/asset ratio; the minted
/// shares end up worth `fee_value` less the self-dilution of the mint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HarvestOutcome {
    /// Total target-position value observed for this harvest.
    pub current_total: u64,
    pub profit: u64,
    pub fee_value: u64,
    pub fee_shares: u64,
}

impl HarvestOutcome {
    pub fn no_profit(current_total: u64) -> Self {
        Self {
            current_total,
            profit: 0,
            fee_value: 0,
            fee_shares: 0,
        }
    }

    /// Share supply once the fee mint of this harvest has settled.
    pub fn supply_after(&self, total_shares: u64) -> Result<u64> {
        total_shares
            .checked_add(self.fee_shares)
            .ok_or(error!(VaultError::MathOverflow))
    }
}

#[account]
pub struct Vault {
    /// Admin: fee configuration, emergency/recovery transitions, token rescue
    pub authority: Pubkey,
    /// Operator allowed to sweep unallocated assets into the target
    pub manager: Pubkey,
    /// Owner of the shares account receiving harvested fee shares
    pub treasury: Pubkey,
    /// Underlying asset mint
    pub asset_mint: Pubkey,
    /// Share token mint (Token-2022, vault PDA is mint authority)
    pub shares_mint: Pubkey,
    /// Token account holding idle (undeployed) assets
    pub asset_vault: Pubkey,
    /// Program of the external yield target
    pub target_program: Pubkey,
    /// Vault-owned account holding the target's claim tokens
    pub target_shares_account: Pubkey,
    /// High-water mark: target-position value at the last harvest,
    /// adjusted by principal added/removed since
    pub last_total_assets: u64,
    /// Performance fee on realized profit, in basis points
    pub reward_fee_bps: u16,
    /// Virtual-share exponent, fixed at initialization
    pub decimals_offset: u8,
    /// Minimum size of the very first deposit
    pub min_first_deposit: u64,
    /// One-way operating mode
    pub mode: VaultMode,
    /// Frozen redeemable assets, set once at recovery activation
    pub recovery_assets: u64,
    /// Frozen outstanding supply, set once at recovery activation
    pub recovery_supply: u64,
    /// PDA bump seed
    pub bump: u8,
    /// Unique vault identifier (allows multiple vaults per asset)
    pub vault_id: u64,
    /// Reserved for future upgrades
    pub _reserved: [u8; 64],
}

impl Vault {
    pub const LEN: usize = 8 +  // discriminator
        32 +  // authority
        32 +  // manager
        32 +  // treasury
        32 +  // asset_mint
        32 +  // shares_mint
        32 +  // asset_vault
        32 +  // target_program
        32 +  // target_shares_account
        8 +   // last_total_assets
        2 +   // reward_fee_bps
        1 +   // decimals_offset
        8 +   // min_first_deposit
        1 +   // mode
        8 +   // recovery_assets
        8 +   // recovery_supply
        1 +   // bump
        8 +   // vault_id
        64; // _reserved

    pub const SEED_PREFIX: &'static [u8] = VAULT_SEED;

    pub fn is_normal(&self) -> bool {
        self.mode == VaultMode::Normal
    }

    /// Guard for operations only permitted in normal mode, reporting which
    /// degraded mode blocked the call.
    pub fn assert_normal(&self) -> Result<()> {
        match self.mode {
            VaultMode::Normal => Ok(()),
            VaultMode::Emergency => err!(VaultError::DisabledDuringEmergencyMode),
            VaultMode::Recovery => err!(VaultError::DisabledDuringRecoveryMode),
        }
    }

    /// Apply a one-way mode transition, checked against the central table.
    pub fn transition(&mut self, next: VaultMode) -> Result<()> {
        require!(
            self.mode.can_transition_to(next),
            VaultError::InvalidModeTransition
        );
        self.mode = next;
        Ok(())
    }

    /// Price a fee harvest without mutating the ledger.
    ///
    /// Previews and mutating operations share this function so a preview can
    /// never disagree with execution.
    pub fn preview_harvest(&self, current_total: u64, total_shares: u64) -> Result<HarvestOutcome> {
        if current_total <= self.last_total_assets {
            // Losses are absorbed by holders; the mark follows the value
            // down, so regained ground counts as new profit later.
            return Ok(HarvestOutcome::no_profit(current_total));
        }

        // A zero fee rate still reports the observed profit; it just mints
        // nothing for it.
        let profit = current_total - self.last_total_assets;
        let fee_value = fee_on_profit(profit, self.reward_fee_bps)?;
        let fee_shares = if fee_value > 0 {
            convert_to_shares(
                fee_value,
                current_total,
                total_shares,
                self.decimals_offset,
                Rounding::Floor,
            )?
        } else {
            0
        };

        Ok(HarvestOutcome {
            current_total,
            profit,
            fee_value,
            fee_shares,
        })
    }

    /// Advance the high-water mark after the fee shares of `outcome` have
    /// been minted (share issuance does not change the position value).
    pub fn apply_harvest(&mut self, outcome: &HarvestOutcome) {
        self.last_total_assets = outcome.current_total;
    }

    /// Track principal entering the target so the next harvest does not
    /// mistake it for profit.
    pub fn note_assets_added(&mut self, assets: u64) -> Result<()> {
        self.last_total_assets = self
            .last_total_assets
            .checked_add(assets)
            .ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    /// Track principal leaving the target so the next harvest does not
    /// mistake the exit for a loss it should remember.
    pub fn note_assets_removed(&mut self, assets: u64) -> Result<()> {
        self.last_total_assets = self
            .last_total_assets
            .checked_sub(assets)
            .ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    /// Freeze the recovery ratio from the vault's own ledger. Both numbers
    /// must come from accounts the vault controls, never from the target.
    pub fn freeze_recovery(&mut self, idle_balance: u64, total_shares: u64) -> Result<()> {
        self.transition(VaultMode::Recovery)?;
        self.recovery_assets = idle_balance;
        self.recovery_supply = total_shares;
        Ok(())
    }

    /// Redeem against the frozen recovery ratio.
    ///
    /// Decrements both frozen legs by the settled amounts so the ratio holds
    /// for later redeemers as rounding remainders accumulate.
    pub fn recovery_redeem(&mut self, shares: u64) -> Result<u64> {
        require!(shares > 0, VaultError::ZeroAmount);
        require!(
            shares <= self.recovery_supply,
            VaultError::InsufficientShares
        );

        let assets = crate::math::mul_div(
            shares,
            self.recovery_assets,
            self.recovery_supply,
            Rounding::Floor,
        )?;

        self.recovery_assets = self
            .recovery_assets
            .checked_sub(assets)
            .ok_or(VaultError::MathOverflow)?;
        self.recovery_supply = self
            .recovery_supply
            .checked_sub(shares)
            .ok_or(VaultError::MathOverflow)?;

        Ok(assets)
    }

    /// Amount an unallocated sweep may deploy: idle balance clamped to the
    /// target's remaining capacity.
    pub fn sweep_amount(idle_balance: u64, remaining_capacity: u64) -> u64 {
        idle_balance.min(remaining_capacity)
    }

    /// Amount an emergency drain may pull this call: position value clamped
    /// to the liquidity the target reports as withdrawable right now.
    pub fn emergency_drain_amount(position_value: u64, max_withdrawable: u64) -> u64 {
        position_value.min(max_withdrawable)
    }
}
