use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::domain::{
    Account, AccountId, CURRENCY, Cents, IntegrityReport, NewAccount, Transaction,
    TransactionType, clamp_limit, description_or_default,
};
use crate::storage::{AccountCreation, BalanceChange, Repository};

use super::LedgerError;

/// Application service providing the ledger operations.
/// This is the primary interface for any client (CLI, HTTP, tool dispatch).
///
/// Every mutating operation is one atomic unit in the store: the balance
/// update and its transaction record commit together or not at all.
#[derive(Clone)]
pub struct LedgerService {
    repo: Repository,
}

/// Result of a deposit or withdrawal
#[derive(Debug, Clone)]
pub struct MovementResult {
    pub transaction: Transaction,
    pub new_balance: Cents,
}

/// Balance and holder details for one account
#[derive(Debug, Clone)]
pub struct BalanceView {
    pub account_id: AccountId,
    pub name: String,
    pub email: String,
    pub balance: Cents,
    pub currency: &'static str,
    pub is_active: bool,
}

/// A page of an account's transaction history
#[derive(Debug, Clone)]
pub struct TransactionHistory {
    pub account_id: AccountId,
    pub account_name: String,
    /// Newest first, at most the clamped limit
    pub transactions: Vec<Transaction>,
    /// Total transactions on the account, regardless of limit
    pub total_count: i64,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Open (creating if needed) the database at the given path and apply the schema.
    pub async fn init(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Release the store. Call once at shutdown.
    pub async fn close(&self) {
        self.repo.close().await;
    }

    /// Access the underlying repository.
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    // ========================
    // Account operations
    // ========================

    /// Open a new account, recording an initial deposit if one is given.
    pub async fn create_account(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
        initial_deposit: Cents,
    ) -> Result<Account, LedgerError> {
        let new = NewAccount::new(name, email, initial_deposit).inspect_err(|err| {
            warn!(error = %err, "account creation rejected");
        })?;

        match self.repo.create_account(&new).await? {
            AccountCreation::Created {
                account,
                opening_deposit,
            } => {
                info!(
                    account_id = account.id,
                    initial_deposit = account.balance,
                    opening_transaction = opening_deposit.as_ref().map(|tx| tx.id),
                    "account created"
                );
                Ok(account)
            }
            AccountCreation::DuplicateEmail => {
                warn!(email = %new.email, "account creation rejected: duplicate email");
                Err(LedgerError::DuplicateEmail(new.email))
            }
        }
    }

    /// Get an account by ID.
    pub async fn get_account(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        self.repo
            .get_account(account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    /// List active accounts, newest first. `limit` is clamped to 1..=100
    /// (below 1 means the default of 10).
    pub async fn list_accounts(&self, limit: i64) -> Result<Vec<Account>, LedgerError> {
        let limit = clamp_limit(limit);
        let accounts = self.repo.list_active_accounts(limit).await?;
        debug!(limit, returned = accounts.len(), "listed accounts");
        Ok(accounts)
    }

    /// Mark an account inactive. Deposits and withdrawals are refused
    /// afterwards; reads keep working. Deactivating twice is a no-op.
    pub async fn deactivate_account(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        if !self.repo.deactivate_account(account_id).await? {
            return Err(LedgerError::AccountNotFound(account_id));
        }
        info!(account_id, "account deactivated");
        self.get_account(account_id).await
    }

    // ========================
    // Balance operations
    // ========================

    /// Deposit a positive amount into an active account.
    pub async fn deposit(
        &self,
        account_id: AccountId,
        amount: Cents,
        description: Option<String>,
    ) -> Result<MovementResult, LedgerError> {
        self.apply_movement(TransactionType::Deposit, account_id, amount, description)
            .await
    }

    /// Withdraw a positive amount from an active account.
    /// Fails with `InsufficientFunds` rather than letting the balance go negative.
    pub async fn withdraw(
        &self,
        account_id: AccountId,
        amount: Cents,
        description: Option<String>,
    ) -> Result<MovementResult, LedgerError> {
        self.apply_movement(TransactionType::Withdrawal, account_id, amount, description)
            .await
    }

    async fn apply_movement(
        &self,
        kind: TransactionType,
        account_id: AccountId,
        amount: Cents,
        description: Option<String>,
    ) -> Result<MovementResult, LedgerError> {
        if amount <= 0 {
            warn!(account_id, amount, kind = %kind, "rejected non-positive amount");
            return Err(LedgerError::invalid_amount());
        }

        let description = description_or_default(description, kind);
        let change = match kind {
            TransactionType::Deposit => {
                self.repo
                    .apply_deposit(account_id, amount, &description)
                    .await?
            }
            TransactionType::Withdrawal => {
                self.repo
                    .apply_withdrawal(account_id, amount, &description)
                    .await?
            }
        };

        let err = match change {
            BalanceChange::Applied(transaction) => {
                info!(
                    account_id,
                    transaction_id = transaction.id,
                    kind = %kind,
                    amount,
                    balance_after = transaction.balance_after,
                    "balance updated"
                );
                return Ok(MovementResult {
                    new_balance: transaction.balance_after,
                    transaction,
                });
            }
            BalanceChange::NotFound => LedgerError::AccountNotFound(account_id),
            BalanceChange::Inactive => LedgerError::AccountInactive(account_id),
            BalanceChange::InsufficientFunds { available } => LedgerError::InsufficientFunds {
                account_id,
                available,
                requested: amount,
            },
            BalanceChange::Overflow { balance } => LedgerError::InvalidArgument(format!(
                "Deposit of {} cents would overflow the balance of {} cents",
                amount, balance
            )),
        };

        warn!(account_id, amount, kind = %kind, code = err.code(), "balance change rejected");
        Err(err)
    }

    /// Get the current balance and holder details. Works for inactive accounts.
    pub async fn get_balance(&self, account_id: AccountId) -> Result<BalanceView, LedgerError> {
        let account = self.get_account(account_id).await?;
        Ok(BalanceView {
            account_id: account.id,
            name: account.name,
            email: account.email,
            balance: account.balance,
            currency: CURRENCY,
            is_active: account.is_active,
        })
    }

    // ========================
    // History operations
    // ========================

    /// Get an account's most recent transactions, newest first, with the
    /// account's total transaction count. `limit` is clamped to 1..=100
    /// (below 1 means the default of 10).
    pub async fn get_transactions(
        &self,
        account_id: AccountId,
        limit: i64,
    ) -> Result<TransactionHistory, LedgerError> {
        let account = self.get_account(account_id).await?;
        let limit = clamp_limit(limit);

        let transactions = self.repo.list_transactions(account_id, limit).await?;
        let total_count = self.repo.count_transactions(account_id).await?;
        debug!(account_id, limit, returned = transactions.len(), total_count, "listed transactions");

        Ok(TransactionHistory {
            account_id,
            account_name: account.name,
            transactions,
            total_count,
        })
    }

    /// Every account, active or not, in creation order.
    pub async fn list_all_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        Ok(self.repo.list_all_accounts().await?)
    }

    /// Every transaction in the ledger, in recording order.
    pub async fn list_all_transactions(&self) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.repo.list_all_transactions().await?)
    }

    /// All accounts and all transactions as of a single point in time.
    pub async fn snapshot(&self) -> Result<(Vec<Account>, Vec<Transaction>), LedgerError> {
        Ok(self.repo.snapshot().await?)
    }

    // ========================
    // Integrity operations
    // ========================

    /// Replay every account's history and report anything that does not reconcile.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, LedgerError> {
        let (accounts, transactions) = self.repo.snapshot().await?;

        let mut histories: HashMap<AccountId, Vec<Transaction>> = HashMap::new();
        for tx in transactions {
            histories.entry(tx.account_id).or_default().push(tx);
        }

        let mut report = IntegrityReport::default();
        for account in &accounts {
            let mut history = histories.remove(&account.id).unwrap_or_default();
            history.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
            report.record_account(account, &history);
        }

        if report.is_healthy() {
            info!(
                accounts = report.account_count,
                transactions = report.transaction_count,
                "ledger integrity verified"
            );
        } else {
            warn!(issues = report.issues.len(), "ledger integrity check found issues");
        }
        Ok(report)
    }
}
