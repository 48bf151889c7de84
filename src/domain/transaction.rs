use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, Cents};

pub type TransactionId = i64;

/// Description recorded for the deposit made when an account is opened.
pub const INITIAL_DEPOSIT_DESCRIPTION: &str = "Initial deposit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money entering the account
    Deposit,
    /// Money leaving the account
    Withdrawal,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "deposit" => Some(TransactionType::Deposit),
            "withdrawal" => Some(TransactionType::Withdrawal),
            _ => None,
        }
    }

    /// Description used when the caller does not supply one.
    pub fn default_description(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "Deposit",
            TransactionType::Withdrawal => "Withdrawal",
        }
    }

    /// Apply the sign of this movement to a positive amount.
    pub fn signed(&self, amount: Cents) -> Cents {
        match self {
            TransactionType::Deposit => amount,
            TransactionType::Withdrawal => amount.saturating_neg(),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single balance movement on one account.
/// Transactions are append-only: once recorded they are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Owning account
    pub account_id: AccountId,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Amount in cents (always positive)
    pub amount: Cents,
    /// Account balance immediately after this transaction was applied
    pub balance_after: Cents,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// The amount with the sign of its effect on the balance.
    pub fn signed_amount(&self) -> Cents {
        self.transaction_type.signed(self.amount)
    }
}

/// Resolve a caller-supplied description, falling back to the default for the type.
pub fn description_or_default(description: Option<String>, kind: TransactionType) -> String {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| kind.default_description().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_type_roundtrip() {
        for kind in [TransactionType::Deposit, TransactionType::Withdrawal] {
            assert_eq!(TransactionType::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(TransactionType::from_str("transfer"), None);
    }

    #[test]
    fn test_signed_amounts() {
        assert_eq!(TransactionType::Deposit.signed(500), 500);
        assert_eq!(TransactionType::Withdrawal.signed(500), -500);
    }

    #[test]
    fn test_serializes_type_field() {
        let tx = Transaction {
            id: 3,
            account_id: 1,
            transaction_type: TransactionType::Withdrawal,
            amount: 3000,
            balance_after: 12000,
            description: "Withdrawal".into(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "withdrawal");
        assert_eq!(tx.signed_amount(), -3000);
    }

    #[test]
    fn test_description_defaults() {
        assert_eq!(
            description_or_default(None, TransactionType::Deposit),
            "Deposit"
        );
        assert_eq!(
            description_or_default(Some("   ".into()), TransactionType::Withdrawal),
            "Withdrawal"
        );
        assert_eq!(
            description_or_default(Some(" Salary ".into()), TransactionType::Deposit),
            "Salary"
        );
    }
}
