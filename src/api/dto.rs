//! Request and response bodies shared by the REST handlers and the tool
//! dispatcher. Amounts cross the wire as decimal strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::{BalanceView, LedgerError, MovementResult, TransactionHistory};
use crate::domain::{
    Account, AccountId, Cents, DEFAULT_LIMIT, Transaction, TransactionType, format_cents,
    format_money, parse_cents,
};

/// A monetary amount as sent by clients: either a decimal string (`"50.25"`)
/// or a JSON number (`50.25`). With serde_json's `arbitrary_precision`, a
/// number keeps its original text, so every digit reaches the decimal parser.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Text(String),
    Number(serde_json::Number),
}

impl AmountInput {
    pub fn to_cents(&self) -> Result<Cents, LedgerError> {
        let text = match self {
            AmountInput::Text(s) => s.clone(),
            AmountInput::Number(n) => n.to_string(),
        };
        parse_cents(&text)
            .map_err(|e| LedgerError::InvalidArgument(format!("Invalid amount '{}': {}", text, e)))
    }
}

fn optional_cents(amount: Option<&AmountInput>) -> Result<Cents, LedgerError> {
    amount.map_or(Ok(0), AmountInput::to_cents)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub initial_deposit: Option<AmountInput>,
}

impl CreateAccountRequest {
    pub fn initial_deposit_cents(&self) -> Result<Cents, LedgerError> {
        optional_cents(self.initial_deposit.as_ref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovementRequest {
    pub amount: AmountInput,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

pub(crate) fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountArgs {
    pub account_id: AccountId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovementArgs {
    pub account_id: AccountId,
    pub amount: AmountInput,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryArgs {
    pub account_id: AccountId,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

// ========================
// Responses
// ========================

#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub balance: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            balance: format_cents(account.balance),
            is_active: account.is_active,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedAccountResponse {
    pub account_id: AccountId,
    pub name: String,
    pub email: String,
    pub balance: String,
    pub message: String,
}

impl From<Account> for CreatedAccountResponse {
    fn from(account: Account) -> Self {
        Self {
            account_id: account.id,
            message: format!("Account created successfully for {}", account.name),
            balance: format_cents(account.balance),
            name: account.name,
            email: account.email,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MovementResponse {
    pub transaction_id: i64,
    pub account_id: AccountId,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: String,
    pub new_balance: String,
    pub message: String,
}

impl From<MovementResult> for MovementResponse {
    fn from(result: MovementResult) -> Self {
        let tx = result.transaction;
        let verb = match tx.transaction_type {
            TransactionType::Deposit => "deposited",
            TransactionType::Withdrawal => "withdrew",
        };
        Self {
            transaction_id: tx.id,
            account_id: tx.account_id,
            transaction_type: tx.transaction_type,
            amount: format_cents(tx.amount),
            new_balance: format_cents(result.new_balance),
            message: format!("Successfully {} {}", verb, format_money(tx.amount)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    pub account_id: AccountId,
    pub name: String,
    pub email: String,
    pub balance: String,
    pub currency: &'static str,
    pub is_active: bool,
}

impl From<BalanceView> for BalanceResponse {
    fn from(view: BalanceView) -> Self {
        Self {
            account_id: view.account_id,
            name: view.name,
            email: view.email,
            balance: format_cents(view.balance),
            currency: view.currency,
            is_active: view.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: String,
    pub balance_after: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            transaction_type: tx.transaction_type,
            amount: format_cents(tx.amount),
            balance_after: format_cents(tx.balance_after),
            description: tx.description,
            timestamp: tx.timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub account_id: AccountId,
    pub account_name: String,
    pub transactions: Vec<TransactionResponse>,
    pub returned_count: usize,
    pub total_transactions: i64,
}

impl From<TransactionHistory> for HistoryResponse {
    fn from(history: TransactionHistory) -> Self {
        let transactions: Vec<TransactionResponse> =
            history.transactions.into_iter().map(Into::into).collect();
        Self {
            account_id: history.account_id,
            account_name: history.account_name,
            returned_count: transactions.len(),
            transactions,
            total_transactions: history.total_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountListResponse {
    pub accounts: Vec<AccountResponse>,
    pub count: usize,
}

impl From<Vec<Account>> for AccountListResponse {
    fn from(accounts: Vec<Account>) -> Self {
        let accounts: Vec<AccountResponse> = accounts.into_iter().map(Into::into).collect();
        Self {
            count: accounts.len(),
            accounts,
        }
    }
}

/// `{"success": true, ...fields}` wrapper used by the tool dispatcher.
#[derive(Debug, Clone, Serialize)]
pub struct Success<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T> Success<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
