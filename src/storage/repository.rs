use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Executor, Row, Sqlite, SqliteConnection, SqlitePool};

use crate::domain::{
    Account, AccountId, Cents, INITIAL_DEPOSIT_DESCRIPTION, NewAccount, Transaction,
    TransactionType,
};

use super::MIGRATION_001_INITIAL;

/// How long a writer waits for the database lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const ACCOUNT_COLUMNS: &str = "id, name, email, balance, created_at, is_active";
const TRANSACTION_COLUMNS: &str =
    "id, account_id, transaction_type, amount, balance_after, description, timestamp";

/// Outcome of inserting a new account.
#[derive(Debug)]
pub enum AccountCreation {
    Created {
        account: Account,
        /// The "Initial deposit" record, present when the opening balance is positive
        opening_deposit: Option<Transaction>,
    },
    DuplicateEmail,
}

/// Outcome of a conditional balance update.
/// Anything other than `Applied` means the store was left untouched.
#[derive(Debug)]
pub enum BalanceChange {
    Applied(Transaction),
    NotFound,
    Inactive,
    InsufficientFunds { available: Cents },
    Overflow { balance: Cents },
}

/// Repository for persisting and querying accounts and their transactions.
///
/// Cloning is cheap: clones share the same connection pool.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL such as `sqlite:bank.db?mode=rwc`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations. Safe to run against an initialized database.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Close every pooled connection. Pending operations finish first.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// The underlying pool, for maintenance tooling and tests.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ========================
    // Account operations
    // ========================

    /// Insert an account and, for a positive opening balance, its initial
    /// deposit record. Both rows commit together or not at all.
    pub async fn create_account(&self, new: &NewAccount) -> Result<AccountCreation> {
        let created_at = Utc::now();
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO accounts (name, email, balance, created_at, is_active)
            VALUES (?, ?, ?, ?, 1)
            RETURNING id
            "#,
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(new.initial_deposit)
        .bind(encode_timestamp(created_at))
        .fetch_one(&mut *tx)
        .await;

        let id: AccountId = match inserted {
            Ok(row) => row.get("id"),
            Err(err) if is_unique_violation(&err) => {
                tx.rollback()
                    .await
                    .context("Failed to roll back account creation")?;
                return Ok(AccountCreation::DuplicateEmail);
            }
            Err(err) => return Err(err).context("Failed to save account"),
        };

        let opening_deposit = if new.initial_deposit > 0 {
            Some(
                Self::append_transaction(
                    &mut tx,
                    id,
                    TransactionType::Deposit,
                    new.initial_deposit,
                    new.initial_deposit,
                    INITIAL_DEPOSIT_DESCRIPTION,
                    created_at,
                )
                .await?,
            )
        } else {
            None
        };

        tx.commit()
            .await
            .context("Failed to commit account creation")?;

        Ok(AccountCreation::Created {
            account: Account {
                id,
                name: new.name.clone(),
                email: new.email.clone(),
                balance: new.initial_deposit,
                is_active: true,
                created_at,
            },
            opening_deposit,
        })
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        Self::fetch_account(&self.pool, id).await
    }

    /// List active accounts, newest first.
    pub async fn list_active_accounts(&self, limit: i64) -> Result<Vec<Account>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM accounts WHERE is_active = 1 ORDER BY created_at DESC, id DESC LIMIT ?",
            ACCOUNT_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    /// List every account (active or not), in creation order.
    pub async fn list_all_accounts(&self) -> Result<Vec<Account>> {
        Self::fetch_all_accounts(&self.pool).await
    }

    /// Every account and every transaction, read from one consistent view
    /// of the store. Writes committed mid-read are either fully in or out.
    pub async fn snapshot(&self) -> Result<(Vec<Account>, Vec<Transaction>)> {
        let mut tx = self.pool.begin().await.context("Failed to begin snapshot")?;

        let accounts = Self::fetch_all_accounts(&mut *tx).await?;
        let transactions = Self::fetch_all_transactions(&mut *tx).await?;

        tx.commit().await.context("Failed to end snapshot")?;
        Ok((accounts, transactions))
    }

    async fn fetch_all_accounts<'e, E>(executor: E) -> Result<Vec<Account>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM accounts ORDER BY id",
            ACCOUNT_COLUMNS
        ))
        .fetch_all(executor)
        .await
        .context("Failed to list all accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    /// Mark an account inactive. Returns false if the account does not exist.
    pub async fn deactivate_account(&self, id: AccountId) -> Result<bool> {
        let result = sqlx::query("UPDATE accounts SET is_active = 0 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to deactivate account")?;
        Ok(result.rows_affected() > 0)
    }

    async fn fetch_account<'e, E>(executor: E, id: AccountId) -> Result<Option<Account>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query(&format!(
            "SELECT {} FROM accounts WHERE id = ?",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("Failed to fetch account")?;

        row.as_ref().map(Self::row_to_account).transpose()
    }

    fn row_to_account(row: &SqliteRow) -> Result<Account> {
        let created_at_str: String = row.get("created_at");

        Ok(Account {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            balance: row.get("balance"),
            is_active: row.get::<i64, _>("is_active") != 0,
            created_at: decode_timestamp(&created_at_str).context("Invalid created_at timestamp")?,
        })
    }

    // ========================
    // Balance operations
    // ========================

    /// Add `amount` to an active account's balance and record a deposit.
    pub async fn apply_deposit(
        &self,
        account_id: AccountId,
        amount: Cents,
        description: &str,
    ) -> Result<BalanceChange> {
        self.apply_movement(account_id, TransactionType::Deposit, amount, description)
            .await
    }

    /// Subtract `amount` from an active account's balance and record a withdrawal.
    /// Rejected when the balance would go negative.
    pub async fn apply_withdrawal(
        &self,
        account_id: AccountId,
        amount: Cents,
        description: &str,
    ) -> Result<BalanceChange> {
        self.apply_movement(account_id, TransactionType::Withdrawal, amount, description)
            .await
    }

    /// The read-validate-write of the balance is a single conditional UPDATE,
    /// issued first so the store transaction holds the write lock from the
    /// start. The transaction row is appended under the same lock.
    async fn apply_movement(
        &self,
        account_id: AccountId,
        kind: TransactionType,
        amount: Cents,
        description: &str,
    ) -> Result<BalanceChange> {
        anyhow::ensure!(amount > 0, "Balance movements must be positive");

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let query = match kind {
            TransactionType::Deposit => sqlx::query(
                r#"
                UPDATE accounts SET balance = balance + ?
                WHERE id = ? AND is_active = 1 AND balance <= ?
                RETURNING balance
                "#,
            )
            .bind(amount)
            .bind(account_id)
            .bind(Cents::MAX - amount),
            TransactionType::Withdrawal => sqlx::query(
                r#"
                UPDATE accounts SET balance = balance - ?
                WHERE id = ? AND is_active = 1 AND balance >= ?
                RETURNING balance
                "#,
            )
            .bind(amount)
            .bind(account_id)
            .bind(amount),
        };

        let updated = query
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to update balance")?;

        let Some(row) = updated else {
            let rejection = match Self::fetch_account(&mut *tx, account_id).await? {
                None => BalanceChange::NotFound,
                Some(account) if !account.accepts_mutations() => BalanceChange::Inactive,
                Some(account) => match kind {
                    TransactionType::Withdrawal => BalanceChange::InsufficientFunds {
                        available: account.balance,
                    },
                    TransactionType::Deposit => BalanceChange::Overflow {
                        balance: account.balance,
                    },
                },
            };
            tx.rollback()
                .await
                .context("Failed to roll back balance change")?;
            return Ok(rejection);
        };

        let new_balance: Cents = row.get("balance");
        let transaction = Self::append_transaction(
            &mut tx,
            account_id,
            kind,
            amount,
            new_balance,
            description,
            Utc::now(),
        )
        .await?;

        tx.commit().await.context("Failed to commit balance change")?;
        Ok(BalanceChange::Applied(transaction))
    }

    // ========================
    // Transaction operations
    // ========================

    /// Append a transaction row. Only ever called inside a store transaction
    /// that also changed the account balance.
    async fn append_transaction(
        conn: &mut SqliteConnection,
        account_id: AccountId,
        kind: TransactionType,
        amount: Cents,
        balance_after: Cents,
        description: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Transaction> {
        let row = sqlx::query(
            r#"
            INSERT INTO transactions (account_id, transaction_type, amount, balance_after, description, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(account_id)
        .bind(kind.as_str())
        .bind(amount)
        .bind(balance_after)
        .bind(description)
        .bind(encode_timestamp(timestamp))
        .fetch_one(&mut *conn)
        .await
        .context("Failed to save transaction")?;

        Ok(Transaction {
            id: row.get("id"),
            account_id,
            transaction_type: kind,
            amount,
            balance_after,
            description: description.to_string(),
            timestamp,
        })
    }

    /// List an account's transactions, newest first.
    pub async fn list_transactions(
        &self,
        account_id: AccountId,
        limit: i64,
    ) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM transactions WHERE account_id = ? ORDER BY timestamp DESC, id DESC LIMIT ?",
            TRANSACTION_COLUMNS
        ))
        .bind(account_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// List an account's full history, oldest first (replay order).
    pub async fn list_transactions_chronological(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM transactions WHERE account_id = ? ORDER BY timestamp, id",
            TRANSACTION_COLUMNS
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list account history")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// List every transaction in the ledger, in the order they were recorded.
    pub async fn list_all_transactions(&self) -> Result<Vec<Transaction>> {
        Self::fetch_all_transactions(&self.pool).await
    }

    async fn fetch_all_transactions<'e, E>(executor: E) -> Result<Vec<Transaction>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM transactions ORDER BY id",
            TRANSACTION_COLUMNS
        ))
        .fetch_all(executor)
        .await
        .context("Failed to list all transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Count an account's transactions.
    pub async fn count_transactions(&self, account_id: AccountId) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM transactions WHERE account_id = ?")
            .bind(account_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count transactions")?;

        Ok(row.get("count"))
    }

    fn row_to_transaction(row: &SqliteRow) -> Result<Transaction> {
        let type_str: String = row.get("transaction_type");
        let timestamp_str: String = row.get("timestamp");

        Ok(Transaction {
            id: row.get("id"),
            account_id: row.get("account_id"),
            transaction_type: TransactionType::from_str(&type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction type: {}", type_str))?,
            amount: row.get("amount"),
            balance_after: row.get("balance_after"),
            description: row.get("description"),
            timestamp: decode_timestamp(&timestamp_str).context("Invalid timestamp")?,
        })
    }
}

/// Fixed-width RFC 3339 so that lexical order in SQL is chronological order.
fn encode_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_encoding_is_fixed_width() {
        let a = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let b = DateTime::parse_from_rfc3339("2026-01-02T03:04:05.5Z")
            .unwrap()
            .with_timezone(&Utc);

        let (ea, eb) = (encode_timestamp(a), encode_timestamp(b));
        assert_eq!(ea, "2026-01-02T03:04:05.000000Z");
        assert_eq!(eb, "2026-01-02T03:04:05.500000Z");
        assert!(ea < eb);
        assert_eq!(decode_timestamp(&ea).unwrap(), a);
    }
}
