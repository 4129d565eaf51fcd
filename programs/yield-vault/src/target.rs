use anchor_lang::prelude::*;
use anchor_lang::solana_program::{
    hash::hash,
    instruction::{AccountMeta, Instruction},
    program::{get_return_data, invoke_signed},
};

use crate::error::VaultError;

/// Narrow capability surface the engine needs from the external yield
/// target. Handlers drive the production [`CpiTarget`]; tests substitute
/// their own implementations.
pub trait TargetAdapter {
    /// Deploy `assets` into the target. Returns claim tokens received,
    /// or 0 if the target does not report them.
    fn deposit(&self, assets: u64) -> Result<u64>;

    /// Pull exactly `assets` back out of the target. Returns claim tokens
    /// burned, or 0 if the target does not report them.
    fn withdraw(&self, assets: u64) -> Result<u64>;

    /// Claim tokens the vault currently holds on the target.
    fn balance_of_vault(&self) -> Result<u64>;

    /// Asset value of `shares` claim tokens at the target's current rate.
    fn convert_to_assets(&self, shares: u64) -> Result<u64>;

    /// Assets the target will let the vault withdraw right now.
    fn max_withdrawable(&self) -> Result<u64>;

    /// Assets the target will still accept.
    fn remaining_capacity(&self) -> Result<u64>;
}

/// Asset value of the vault's whole position on the target.
pub fn position_value(adapter: &impl TargetAdapter) -> Result<u64> {
    let shares = adapter.balance_of_vault()?;
    if shares == 0 {
        return Ok(0);
    }
    adapter.convert_to_assets(shares)
}

/// [`TargetAdapter`] backed by CPIs into a vault-standard target program.
///
/// The target's instruction accounts are forwarded verbatim from the outer
/// instruction's remaining accounts; results come back through the target's
/// return data (the CPI-composable view convention). The vault PDA signs
/// where the target needs the position owner's authority.
pub struct CpiTarget<'a, 'info> {
    program: AccountInfo<'info>,
    accounts: &'a [AccountInfo<'info>],
    vault_key: Pubkey,
    target_shares_balance: u64,
    signer_seeds: &'a [&'a [&'a [u8]]],
}

impl<'a, 'info> CpiTarget<'a, 'info> {
    pub fn new(
        program: AccountInfo<'info>,
        accounts: &'a [AccountInfo<'info>],
        vault_key: Pubkey,
        target_shares_balance: u64,
        signer_seeds: &'a [&'a [&'a [u8]]],
    ) -> Self {
        Self {
            program,
            accounts,
            vault_key,
            target_shares_balance,
            signer_seeds,
        }
    }

    fn call(&self, name: &str, args: &[u8]) -> Result<Option<u64>> {
        let mut data = global_discriminator(name).to_vec();
        data.extend_from_slice(args);

        let metas = self
            .accounts
            .iter()
            .map(|acc| {
                // The vault PDA gains its signature from invoke_signed.
                let is_signer = acc.is_signer || *acc.key == self.vault_key;
                if acc.is_writable {
                    AccountMeta::new(*acc.key, is_signer)
                } else {
                    AccountMeta::new_readonly(*acc.key, is_signer)
                }
            })
            .collect();

        let instruction = Instruction {
            program_id: *self.program.key,
            accounts: metas,
            data,
        };

        let mut infos = self.accounts.to_vec();
        infos.push(self.program.clone());

        invoke_signed(&instruction, &infos, self.signer_seeds)?;

        match get_return_data() {
            Some((program_id, bytes)) if program_id == *self.program.key => {
                let raw: [u8; 8] = bytes
                    .get(..8)
                    .and_then(|slice| slice.try_into().ok())
                    .ok_or(VaultError::InvalidTargetResponse)?;
                Ok(Some(u64::from_le_bytes(raw)))
            }
            _ => Ok(None),
        }
    }

    fn call_view(&self, name: &str, args: &[u8]) -> Result<u64> {
        self.call(name, args)?
            .ok_or(error!(VaultError::InvalidTargetResponse))
    }
}

impl TargetAdapter for CpiTarget<'_, '_> {
    fn deposit(&self, assets: u64) -> Result<u64> {
        let mut args = assets.to_le_bytes().to_vec();
        // min_shares_out: the engine prices with its own ledger, not the
        // target's quote, so no slippage bound is imposed here.
        args.extend_from_slice(&0u64.to_le_bytes());
        Ok(self.call("deposit", &args)?.unwrap_or(0))
    }

    fn withdraw(&self, assets: u64) -> Result<u64> {
        let mut args = assets.to_le_bytes().to_vec();
        // max_shares_in
        args.extend_from_slice(&u64::MAX.to_le_bytes());
        Ok(self.call("withdraw", &args)?.unwrap_or(0))
    }

    fn balance_of_vault(&self) -> Result<u64> {
        Ok(self.target_shares_balance)
    }

    fn convert_to_assets(&self, shares: u64) -> Result<u64> {
        self.call_view("convert_to_assets", &shares.to_le_bytes())
    }

    fn max_withdrawable(&self) -> Result<u64> {
        self.call_view("max_withdraw", &[])
    }

    fn remaining_capacity(&self) -> Result<u64> {
        self.call_view("max_deposit", &[])
    }
}

/// Anchor global instruction discriminator: sha256("global:<name>")[..8].
fn global_discriminator(name: &str) -> [u8; 8] {
    let digest = hash(format!("global:{name}").as_bytes());
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&digest.to_bytes()[..8]);
    discriminator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminators_are_stable_and_distinct() {
        let deposit = global_discriminator("deposit");
        assert_eq!(deposit, global_discriminator("deposit"));
        assert_ne!(deposit, global_discriminator("withdraw"));
        assert_ne!(deposit, global_discriminator("max_deposit"));
    }

    #[test]
    fn position_value_skips_the_target_when_empty() {
        struct Empty;
        impl TargetAdapter for Empty {
            fn deposit(&self, _: u64) -> Result<u64> {
                unreachable!()
            }
            fn withdraw(&self, _: u64) -> Result<u64> {
                unreachable!()
            }
            fn balance_of_vault(&self) -> Result<u64> {
                Ok(0)
            }
            fn convert_to_assets(&self, _: u64) -> Result<u64> {
                // An empty position must not depend on a live target.
                err!(VaultError::InvalidTargetResponse)
            }
            fn max_withdrawable(&self) -> Result<u64> {
                unreachable!()
            }
            fn remaining_capacity(&self) -> Result<u64> {
                unreachable!()
            }
        }

        assert_eq!(position_value(&Empty).unwrap(), 0);
    }
}
