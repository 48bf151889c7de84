//! Tool dispatcher: the six ledger operations exposed by name, taking a JSON
//! argument object and answering with a `{"success": ...}` envelope.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::application::LedgerService;

use super::AppState;
use super::dto::{
    AccountArgs, AccountListResponse, BalanceResponse, CreateAccountRequest,
    CreatedAccountResponse, HistoryArgs, HistoryResponse, LimitQuery, MovementArgs,
    MovementResponse, Success,
};
use super::error::ApiError;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
}

pub const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "create_account",
        description: "Create a new bank account (name, email, optional initial_deposit)",
    },
    ToolSpec {
        name: "deposit",
        description: "Deposit funds into an account (account_id, amount, optional description)",
    },
    ToolSpec {
        name: "withdraw",
        description: "Withdraw funds from an account (account_id, amount, optional description)",
    },
    ToolSpec {
        name: "get_balance",
        description: "Check an account's balance (account_id)",
    },
    ToolSpec {
        name: "get_transactions",
        description: "View an account's transaction history, newest first (account_id, optional limit)",
    },
    ToolSpec {
        name: "list_accounts",
        description: "List active accounts, newest first (optional limit)",
    },
];

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ApiError> {
    serde_json::from_value(args)
        .map_err(|e| ApiError::bad_request(format!("Invalid arguments: {}", e)))
}

fn ok<T: Serialize>(data: T) -> Result<Value, ApiError> {
    Ok(serde_json::to_value(Success::new(data))?)
}

/// Run a tool by name against the ledger.
pub async fn dispatch(service: &LedgerService, name: &str, args: Value) -> Result<Value, ApiError> {
    tracing::debug!(tool = name, "dispatching tool call");

    match name {
        "create_account" => {
            let request: CreateAccountRequest = parse_args(args)?;
            let initial_deposit = request.initial_deposit_cents()?;
            let account = service
                .create_account(request.name, request.email, initial_deposit)
                .await?;
            ok(CreatedAccountResponse::from(account))
        }
        "deposit" => {
            let args: MovementArgs = parse_args(args)?;
            let result = service
                .deposit(args.account_id, args.amount.to_cents()?, args.description)
                .await?;
            ok(MovementResponse::from(result))
        }
        "withdraw" => {
            let args: MovementArgs = parse_args(args)?;
            let result = service
                .withdraw(args.account_id, args.amount.to_cents()?, args.description)
                .await?;
            ok(MovementResponse::from(result))
        }
        "get_balance" => {
            let args: AccountArgs = parse_args(args)?;
            let view = service.get_balance(args.account_id).await?;
            ok(BalanceResponse::from(view))
        }
        "get_transactions" => {
            let args: HistoryArgs = parse_args(args)?;
            let history = service.get_transactions(args.account_id, args.limit).await?;
            ok(HistoryResponse::from(history))
        }
        "list_accounts" => {
            let args: LimitQuery = parse_args(args)?;
            let accounts = service.list_accounts(args.limit).await?;
            ok(AccountListResponse::from(accounts))
        }
        _ => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "unknown_tool",
            format!("Unknown tool: {}", name),
        )),
    }
}

/// GET /tools
pub async fn list_tools() -> Json<Value> {
    Json(json!({ "tools": TOOLS }))
}

/// POST /tools/:name. An empty body means no arguments.
pub async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let args = if body.iter().all(u8::is_ascii_whitespace) {
        json!({})
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))?
    };

    dispatch(&state.service, &name, args).await.map(Json)
}
