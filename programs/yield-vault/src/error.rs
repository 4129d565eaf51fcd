use anchor_lang::prelude::*;

#[error_code]
pub enum VaultError {
    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Address must not be the default pubkey")]
    ZeroAddress,

    #[msg("First deposit is below the configured minimum")]
    FirstDepositTooSmall,

    #[msg("Insufficient shares balance")]
    InsufficientShares,

    #[msg("Insufficient assets in vault")]
    InsufficientAssets,

    #[msg("Reward fee exceeds the maximum allowed")]
    InvalidFee,

    #[msg("Operation disabled while the vault is in emergency mode")]
    DisabledDuringEmergencyMode,

    #[msg("Operation disabled while the vault is in recovery mode")]
    DisabledDuringRecoveryMode,

    #[msg("Vault is not in emergency mode")]
    NotInEmergencyMode,

    #[msg("Mode transition not allowed")]
    InvalidModeTransition,

    #[msg("Deposit into the yield target failed or resolved to zero")]
    TargetDepositFailed,

    #[msg("Withdrawal from the yield target failed")]
    TargetWithdrawFailed,

    #[msg("Yield target returned malformed data")]
    InvalidTargetResponse,

    #[msg("Cannot recover the yield target's claim token")]
    CannotRecoverForeignTargetShares,

    #[msg("Cannot recover the vault's own asset or share tokens")]
    CannotRecoverVaultAssets,

    #[msg("Slippage tolerance exceeded")]
    SlippageExceeded,

    #[msg("Arithmetic overflow")]
    MathOverflow,

    #[msg("Division by zero")]
    DivisionByZero,

    #[msg("Unauthorized - caller is not vault authority")]
    Unauthorized,

    #[msg("Asset decimals must be <= 9")]
    InvalidAssetDecimals,

    #[msg("Virtual-share offset exceeds the maximum allowed")]
    InvalidOffset,
}
