use thiserror::Error;

use crate::domain::{AccountId, AccountValidationError, Cents, format_money};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("An account with email {0} already exists")]
    DuplicateEmail(String),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Account is inactive: {0}")]
    AccountInactive(AccountId),

    #[error("Insufficient funds. Available balance: {}", money(.available))]
    InsufficientFunds {
        account_id: AccountId,
        available: Cents,
        requested: Cents,
    },

    #[error("Store unavailable: {0:#}")]
    StoreUnavailable(#[from] anyhow::Error),
}

impl LedgerError {
    /// Stable tag for transports to switch on.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidArgument(_) => "invalid_argument",
            LedgerError::DuplicateEmail(_) => "duplicate_email",
            LedgerError::AccountNotFound(_) => "account_not_found",
            LedgerError::AccountInactive(_) => "account_inactive",
            LedgerError::InsufficientFunds { .. } => "insufficient_funds",
            LedgerError::StoreUnavailable(_) => "store_unavailable",
        }
    }

    pub(crate) fn invalid_amount() -> Self {
        LedgerError::InvalidArgument("Amount must be positive".to_string())
    }
}

impl From<AccountValidationError> for LedgerError {
    fn from(err: AccountValidationError) -> Self {
        LedgerError::InvalidArgument(err.to_string())
    }
}

fn money(cents: &Cents) -> String {
    format_money(*cents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_reports_available_balance() {
        let err = LedgerError::InsufficientFunds {
            account_id: 1,
            available: 12000,
            requested: 999900,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds. Available balance: $120.00"
        );
        assert_eq!(err.code(), "insufficient_funds");
    }

    #[test]
    fn test_validation_errors_become_invalid_argument() {
        let err: LedgerError = AccountValidationError::NegativeInitialDeposit.into();
        assert_eq!(err.code(), "invalid_argument");
        assert_eq!(
            err.to_string(),
            "Invalid argument: Initial deposit cannot be negative"
        );
    }

    #[test]
    fn test_store_errors_keep_their_context() {
        let err: LedgerError = anyhow::anyhow!("disk I/O error")
            .context("Failed to update balance")
            .into();
        assert_eq!(err.code(), "store_unavailable");
        assert_eq!(
            err.to_string(),
            "Store unavailable: Failed to update balance: disk I/O error"
        );
    }
}
