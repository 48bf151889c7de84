use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::domain::{AccountId, IntegrityReport};

use super::AppState;
use super::dto::{
    AccountListResponse, AccountResponse, BalanceResponse, CreateAccountRequest,
    CreatedAccountResponse, HistoryResponse, LimitQuery, MovementRequest, MovementResponse,
};
use super::error::ApiError;

type ApiResult<T> = Result<T, ApiError>;

fn account_id(path: Result<Path<AccountId>, PathRejection>) -> ApiResult<AccountId> {
    path.map(|Path(id)| id)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

fn limit(query: Result<Query<LimitQuery>, QueryRejection>) -> ApiResult<i64> {
    query
        .map(|Query(q)| q.limit)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// POST /accounts
pub async fn create_account(
    State(state): State<AppState>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatedAccountResponse>)> {
    let request = body(payload)?;
    let initial_deposit = request.initial_deposit_cents()?;
    let account = state
        .service
        .create_account(request.name, request.email, initial_deposit)
        .await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// GET /accounts?limit=N
pub async fn list_accounts(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult<Json<AccountListResponse>> {
    let accounts = state.service.list_accounts(limit(query)?).await?;
    Ok(Json(accounts.into()))
}

/// GET /accounts/:id
pub async fn get_balance(
    State(state): State<AppState>,
    path: Result<Path<AccountId>, PathRejection>,
) -> ApiResult<Json<BalanceResponse>> {
    let view = state.service.get_balance(account_id(path)?).await?;
    Ok(Json(view.into()))
}

/// POST /accounts/:id/deposit
pub async fn deposit(
    State(state): State<AppState>,
    path: Result<Path<AccountId>, PathRejection>,
    payload: Result<Json<MovementRequest>, JsonRejection>,
) -> ApiResult<Json<MovementResponse>> {
    let id = account_id(path)?;
    let request = body(payload)?;
    let result = state
        .service
        .deposit(id, request.amount.to_cents()?, request.description)
        .await?;
    Ok(Json(result.into()))
}

/// POST /accounts/:id/withdraw
pub async fn withdraw(
    State(state): State<AppState>,
    path: Result<Path<AccountId>, PathRejection>,
    payload: Result<Json<MovementRequest>, JsonRejection>,
) -> ApiResult<Json<MovementResponse>> {
    let id = account_id(path)?;
    let request = body(payload)?;
    let result = state
        .service
        .withdraw(id, request.amount.to_cents()?, request.description)
        .await?;
    Ok(Json(result.into()))
}

/// GET /accounts/:id/transactions?limit=N
pub async fn get_transactions(
    State(state): State<AppState>,
    path: Result<Path<AccountId>, PathRejection>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult<Json<HistoryResponse>> {
    let id = account_id(path)?;
    let history = state.service.get_transactions(id, limit(query)?).await?;
    Ok(Json(history.into()))
}

/// POST /accounts/:id/deactivate
pub async fn deactivate_account(
    State(state): State<AppState>,
    path: Result<Path<AccountId>, PathRejection>,
) -> ApiResult<Json<AccountResponse>> {
    let account = state.service.deactivate_account(account_id(path)?).await?;
    Ok(Json(account.into()))
}

/// GET /integrity
pub async fn check_integrity(State(state): State<AppState>) -> ApiResult<Json<IntegrityReport>> {
    Ok(Json(state.service.check_integrity().await?))
}
