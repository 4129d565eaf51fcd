use anchor_lang::prelude::*;

use crate::constants::BPS_DENOMINATOR;
use crate::error::VaultError;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rounding {
    Floor,
    Ceiling,
}

/// Convert assets to shares with virtual offset protection against inflation attacks.
///
/// Formula: shares = assets × (total_shares + 10^offset) / (total_assets + 1)
///
/// The virtual share supply makes manipulating the exchange rate cost on the
/// order of 10^offset donated units, which the deployer sizes to make griefing
/// uneconomical.
pub fn convert_to_shares(
    assets: u64,
    total_assets: u64,
    total_shares: u64,
    decimals_offset: u8,
    rounding: Rounding,
) -> Result<u64> {
    let virtual_shares = total_shares
        .checked_add(pow10(decimals_offset)?)
        .ok_or(VaultError::MathOverflow)?;

    let virtual_assets = total_assets.checked_add(1).ok_or(VaultError::MathOverflow)?;

    mul_div(assets, virtual_shares, virtual_assets, rounding)
}

/// Convert shares to assets with virtual offset protection.
///
/// Formula: assets = shares × (total_assets + 1) / (total_shares + 10^offset)
pub fn convert_to_assets(
    shares: u64,
    total_assets: u64,
    total_shares: u64,
    decimals_offset: u8,
    rounding: Rounding,
) -> Result<u64> {
    let virtual_shares = total_shares
        .checked_add(pow10(decimals_offset)?)
        .ok_or(VaultError::MathOverflow)?;

    let virtual_assets = total_assets.checked_add(1).ok_or(VaultError::MathOverflow)?;

    mul_div(shares, virtual_assets, virtual_shares, rounding)
}

/// Fee value owed on a realized profit, floor rounded.
pub fn fee_on_profit(profit: u64, fee_bps: u16) -> Result<u64> {
    mul_div(profit, fee_bps as u64, BPS_DENOMINATOR, Rounding::Floor)
}

/// Safe multiplication then division with configurable rounding.
///
/// Computes: (value × numerator) / denominator
/// Uses u128 intermediate to prevent overflow.
pub fn mul_div(value: u64, numerator: u64, denominator: u64, rounding: Rounding) -> Result<u64> {
    require!(denominator > 0, VaultError::DivisionByZero);

    let product = (value as u128)
        .checked_mul(numerator as u128)
        .ok_or(VaultError::MathOverflow)?;

    let result = match rounding {
        Rounding::Floor => product / (denominator as u128),
        Rounding::Ceiling => {
            let denom = denominator as u128;
            product
                .checked_add(denom - 1)
                .ok_or(VaultError::MathOverflow)?
                / denom
        }
    };

    require!(result <= u64::MAX as u128, VaultError::MathOverflow);
    Ok(result as u64)
}

fn pow10(exponent: u8) -> Result<u64> {
    10u64
        .checked_pow(exponent as u32)
        .ok_or(error!(VaultError::MathOverflow))
}
