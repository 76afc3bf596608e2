use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    domain::{
        ApproveDepositRequest, ApproveDepositResponse, DepositRequest, DepositRequestBody,
        DepositRequestResponse, MarkWithdrawPaidRequest, WithdrawRequest, WithdrawRequestBody,
        WithdrawRequestResponse,
    },
    errors::{AppError, Result},
    extractors::{AdminUser, AuthUser, ValidatedJson},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQuery {
    fn page(&self) -> (i64, i64) {
        (self.limit.unwrap_or(50).min(200), self.offset.unwrap_or(0))
    }
}

/// Create a pending deposit request and return the manual-payment
/// instructions. Nothing is credited until an admin approves.
pub async fn request_deposit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(req): ValidatedJson<DepositRequestBody>,
) -> Result<Json<DepositRequestResponse>> {
    tracing::debug!(
        user_id = %user.user_id,
        amount = %req.amount,
        method = %req.method,
        "Creating deposit request"
    );

    let deposit = state
        .store
        .transfers()
        .create_deposit(user.user_id, req.amount.as_cents(), &req.method, req.note)
        .await?;

    let message = format!(
        "{} Use reference: {}",
        state.config.payments.deposit_instructions, deposit.request_id
    );

    tracing::info!(request_id = %deposit.request_id, "Deposit request created");
    metrics::counter!("deposits_requested_total").increment(1);

    Ok(Json(DepositRequestResponse { message, deposit }))
}

pub async fn list_deposits(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<DepositRequest>>> {
    let (limit, offset) = query.page();
    let requests = state.store.transfers().list_deposits(limit, offset).await?;

    tracing::debug!(count = requests.len(), "Listed deposit requests");
    Ok(Json(requests))
}

/// Approve a pending deposit: once-only status transition, then credit.
pub async fn approve_deposit(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidatedJson(req): ValidatedJson<ApproveDepositRequest>,
) -> Result<Json<ApproveDepositResponse>> {
    tracing::debug!(
        admin = %admin.user_id,
        request_id = %req.request_id,
        "Approving deposit request"
    );

    let deposit = state
        .store
        .transfers()
        .find_deposit(req.request_id)
        .await?
        .ok_or_else(|| AppError::request_not_found(req.request_id))?;

    if !state
        .store
        .transfers()
        .approve_deposit(req.request_id)
        .await?
    {
        return Err(AppError::already_processed(format!(
            "Deposit request {} already processed",
            req.request_id
        )));
    }

    let balance = state
        .store
        .users()
        .credit(deposit.user_id, deposit.amount)
        .await?;

    let deposit = state
        .store
        .transfers()
        .find_deposit(req.request_id)
        .await?
        .ok_or_else(|| AppError::request_not_found(req.request_id))?;

    tracing::info!(user_id = %deposit.user_id, amount = deposit.amount, "Deposit approved");
    metrics::counter!("deposits_approved_total").increment(1);

    Ok(Json(ApproveDepositResponse { deposit, balance }))
}

/// Create a withdraw request, reserving the funds immediately. The admin
/// pays out manually and then marks the request paid.
pub async fn request_withdraw(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(req): ValidatedJson<WithdrawRequestBody>,
) -> Result<Json<WithdrawRequestResponse>> {
    tracing::debug!(
        user_id = %user.user_id,
        amount = %req.amount,
        method = %req.method,
        "Creating withdraw request"
    );

    // Reserve first; an insufficient balance refuses the whole request.
    let balance = state
        .store
        .users()
        .debit(user.user_id, req.amount.as_cents())
        .await?;

    let withdraw = state
        .store
        .transfers()
        .create_withdraw(user.user_id, req.amount.as_cents(), &req.method, req.details)
        .await?;

    tracing::info!(request_id = %withdraw.request_id, "Withdraw request created, funds reserved");
    metrics::counter!("withdraws_requested_total").increment(1);

    Ok(Json(WithdrawRequestResponse {
        message: "Withdraw request created. The operator pays out manually and then marks it paid."
            .to_string(),
        withdraw,
        balance,
    }))
}

pub async fn list_withdraws(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<WithdrawRequest>>> {
    let (limit, offset) = query.page();
    let requests = state.store.transfers().list_withdraws(limit, offset).await?;

    tracing::debug!(count = requests.len(), "Listed withdraw requests");
    Ok(Json(requests))
}

pub async fn mark_withdraw_paid(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidatedJson(req): ValidatedJson<MarkWithdrawPaidRequest>,
) -> Result<Json<WithdrawRequest>> {
    tracing::debug!(
        admin = %admin.user_id,
        request_id = %req.request_id,
        "Marking withdraw request paid"
    );

    let _ = state
        .store
        .transfers()
        .find_withdraw(req.request_id)
        .await?
        .ok_or_else(|| AppError::request_not_found(req.request_id))?;

    if !state
        .store
        .transfers()
        .mark_withdraw_paid(req.request_id)
        .await?
    {
        return Err(AppError::already_processed(format!(
            "Withdraw request {} already processed",
            req.request_id
        )));
    }

    let withdraw = state
        .store
        .transfers()
        .find_withdraw(req.request_id)
        .await?
        .ok_or_else(|| AppError::request_not_found(req.request_id))?;

    tracing::info!(user_id = %withdraw.user_id, amount = withdraw.amount, "Withdraw marked paid");
    metrics::counter!("withdraws_paid_total").increment(1);

    Ok(Json(withdraw))
}
