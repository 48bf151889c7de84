use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Cents;

/// Store-assigned account identifier.
pub type AccountId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    /// Current balance in cents. Never negative.
    pub balance: Cents,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Returns true if deposits and withdrawals are accepted.
    pub fn accepts_mutations(&self) -> bool {
        self.is_active
    }
}

/// Validated input for account creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub initial_deposit: Cents,
}

impl NewAccount {
    /// Normalize and validate creation arguments.
    ///
    /// Name and email are trimmed and must be non-empty; the initial deposit
    /// may be zero but never negative.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        initial_deposit: Cents,
    ) -> Result<Self, AccountValidationError> {
        let name = name.into().trim().to_string();
        let email = email.into().trim().to_string();

        if name.is_empty() {
            return Err(AccountValidationError::EmptyName);
        }
        if email.is_empty() {
            return Err(AccountValidationError::EmptyEmail);
        }
        if initial_deposit < 0 {
            return Err(AccountValidationError::NegativeInitialDeposit);
        }

        Ok(Self {
            name,
            email,
            initial_deposit,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountValidationError {
    EmptyName,
    EmptyEmail,
    NegativeInitialDeposit,
}

impl std::fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountValidationError::EmptyName => write!(f, "Name cannot be empty"),
            AccountValidationError::EmptyEmail => write!(f, "Email cannot be empty"),
            AccountValidationError::NegativeInitialDeposit => {
                write!(f, "Initial deposit cannot be negative")
            }
        }
    }
}

impl std::error::Error for AccountValidationError {}
