use serde::Serialize;

use super::{Account, AccountId, Cents, TotalCents, Transaction, format_cents};

/// Compute an account balance by replaying its transactions from zero.
/// Deposits add, withdrawals subtract. The result saturates at the bounds
/// of `Cents` instead of wrapping.
pub fn compute_balance(transactions: &[Transaction]) -> Cents {
    transactions
        .iter()
        .fold(0, |balance: Cents, tx| balance.saturating_add(tx.signed_amount()))
}

/// A single reconciliation failure found while replaying an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityIssue {
    /// Stored balance differs from the replayed sum of transactions
    BalanceMismatch {
        account_id: AccountId,
        stored: Cents,
        replayed: Cents,
    },
    /// A transaction's balance snapshot differs from the running sum
    BalanceAfterMismatch {
        account_id: AccountId,
        transaction_id: i64,
        recorded: Cents,
        expected: Cents,
    },
    /// Stored balance is below zero
    NegativeBalance { account_id: AccountId, balance: Cents },
    /// A transaction carries a zero or negative amount
    NonPositiveAmount {
        account_id: AccountId,
        transaction_id: i64,
        amount: Cents,
    },
}

impl std::fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityIssue::BalanceMismatch {
                account_id,
                stored,
                replayed,
            } => write!(
                f,
                "account {}: stored balance {} but transactions sum to {}",
                account_id,
                format_cents(*stored),
                format_cents(*replayed)
            ),
            IntegrityIssue::BalanceAfterMismatch {
                account_id,
                transaction_id,
                recorded,
                expected,
            } => write!(
                f,
                "account {}: transaction {} records balance {} but running sum is {}",
                account_id,
                transaction_id,
                format_cents(*recorded),
                format_cents(*expected)
            ),
            IntegrityIssue::NegativeBalance {
                account_id,
                balance,
            } => write!(
                f,
                "account {}: negative balance {}",
                account_id,
                format_cents(*balance)
            ),
            IntegrityIssue::NonPositiveAmount {
                account_id,
                transaction_id,
                amount,
            } => write!(
                f,
                "account {}: transaction {} has non-positive amount {}",
                account_id,
                transaction_id,
                format_cents(*amount)
            ),
        }
    }
}

/// Replay one account's transactions (oldest first) and collect every
/// reconciliation failure.
pub fn reconcile_account(account: &Account, chronological: &[Transaction]) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();
    let mut running: Cents = 0;

    for tx in chronological {
        if tx.amount <= 0 {
            issues.push(IntegrityIssue::NonPositiveAmount {
                account_id: account.id,
                transaction_id: tx.id,
                amount: tx.amount,
            });
        }
        running = running.saturating_add(tx.signed_amount());
        if tx.balance_after != running {
            issues.push(IntegrityIssue::BalanceAfterMismatch {
                account_id: account.id,
                transaction_id: tx.id,
                recorded: tx.balance_after,
                expected: running,
            });
        }
    }

    if running != account.balance {
        issues.push(IntegrityIssue::BalanceMismatch {
            account_id: account.id,
            stored: account.balance,
            replayed: running,
        });
    }
    if account.balance < 0 {
        issues.push(IntegrityIssue::NegativeBalance {
            account_id: account.id,
            balance: account.balance,
        });
    }

    issues
}

/// Result of checking the whole ledger.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IntegrityReport {
    pub account_count: i64,
    pub active_account_count: i64,
    pub transaction_count: i64,
    /// Sum of all account balances, wide enough for any number of full accounts
    pub total_balance: TotalCents,
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }

    /// Fold one account and its chronological history into the report.
    pub fn record_account(&mut self, account: &Account, chronological: &[Transaction]) {
        self.account_count += 1;
        if account.is_active {
            self.active_account_count += 1;
        }
        self.transaction_count += chronological.len() as i64;
        self.total_balance += TotalCents::from(account.balance);
        self.issues.extend(reconcile_account(account, chronological));
    }
}
