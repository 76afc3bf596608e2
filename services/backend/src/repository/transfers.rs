//! Deposit and withdraw request repository
//!
//! Both request kinds share the hash-plus-index storage shape and the
//! once-only status transition guard.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::{DepositRequest, TransferStatus, WithdrawRequest};
use crate::errors::{AppError, Result};

use super::keys::{deposit_key, deposits_index_key, withdraw_key, withdraws_index_key};
use super::lua_scripts::TRANSITION_STATUS_SCRIPT;

#[async_trait]
pub trait TransferRepository: Send + Sync {
    async fn create_deposit(
        &self,
        user_id: Uuid,
        amount: u64,
        method: &str,
        note: Option<String>,
    ) -> Result<DepositRequest>;
    async fn find_deposit(&self, request_id: Uuid) -> Result<Option<DepositRequest>>;
    async fn list_deposits(&self, limit: i64, offset: i64) -> Result<Vec<DepositRequest>>;
    /// Transition pending -> approved exactly once.
    /// Returns false when the request was already processed.
    async fn approve_deposit(&self, request_id: Uuid) -> Result<bool>;

    async fn create_withdraw(
        &self,
        user_id: Uuid,
        amount: u64,
        method: &str,
        details: Option<serde_json::Value>,
    ) -> Result<WithdrawRequest>;
    async fn find_withdraw(&self, request_id: Uuid) -> Result<Option<WithdrawRequest>>;
    async fn list_withdraws(&self, limit: i64, offset: i64) -> Result<Vec<WithdrawRequest>>;
    /// Transition pending -> paid exactly once.
    /// Returns false when the request was already processed.
    async fn mark_withdraw_paid(&self, request_id: Uuid) -> Result<bool>;
}

/// Redis-based implementation of TransferRepository
pub struct RedisTransferRepository {
    redis: ConnectionManager,
}

impl RedisTransferRepository {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    async fn transition(
        &self,
        key: String,
        request_id: Uuid,
        from: TransferStatus,
        to: TransferStatus,
    ) -> Result<bool> {
        let mut redis_conn = self.redis.clone();
        let script = Script::new(TRANSITION_STATUS_SCRIPT);

        let result: i64 = script
            .key(key)
            .arg(from.as_str())
            .arg(to.as_str())
            .invoke_async(&mut redis_conn)
            .await?;

        match result {
            -2 => Err(AppError::request_not_found(request_id)),
            0 => Ok(false),
            _ => Ok(true),
        }
    }
}

#[async_trait]
impl TransferRepository for RedisTransferRepository {
    async fn create_deposit(
        &self,
        user_id: Uuid,
        amount: u64,
        method: &str,
        note: Option<String>,
    ) -> Result<DepositRequest> {
        let request_id = Uuid::new_v4();
        let now = Utc::now();
        let now_ms = now.timestamp_millis();

        let request = DepositRequest {
            request_id,
            user_id,
            amount,
            method: method.to_string(),
            note,
            status: TransferStatus::Pending,
            created_at: now,
        };

        let mut pipe = redis::pipe();
        pipe.atomic();

        let mut redis_conn = self.redis.clone();

        let _: () = pipe
            .hset_multiple(
                deposit_key(request_id),
                &[
                    ("request_id", request.request_id.to_string()),
                    ("user_id", request.user_id.to_string()),
                    ("amount", request.amount.to_string()),
                    ("method", request.method.clone()),
                    ("note", request.note.clone().unwrap_or_default()),
                    ("status", request.status.as_str().to_string()),
                    ("created_at_ms", now_ms.to_string()),
                ],
            )
            .ignore()
            .zadd(deposits_index_key(), request_id.to_string(), now_ms)
            .ignore()
            .query_async(&mut redis_conn)
            .await?;

        Ok(request)
    }

    async fn find_deposit(&self, request_id: Uuid) -> Result<Option<DepositRequest>> {
        let mut redis_conn = self.redis.clone();
        load_deposit_from_hash(&mut redis_conn, request_id).await
    }

    async fn list_deposits(&self, limit: i64, offset: i64) -> Result<Vec<DepositRequest>> {
        let mut redis_conn = self.redis.clone();
        let ids = index_page(&mut redis_conn, deposits_index_key(), limit, offset).await?;

        let mut requests = Vec::new();
        for id in ids {
            if let Some(request) = load_deposit_from_hash(&mut redis_conn, id).await? {
                requests.push(request);
            }
        }

        Ok(requests)
    }

    async fn approve_deposit(&self, request_id: Uuid) -> Result<bool> {
        self.transition(
            deposit_key(request_id),
            request_id,
            TransferStatus::Pending,
            TransferStatus::Approved,
        )
        .await
    }

    async fn create_withdraw(
        &self,
        user_id: Uuid,
        amount: u64,
        method: &str,
        details: Option<serde_json::Value>,
    ) -> Result<WithdrawRequest> {
        let request_id = Uuid::new_v4();
        let now = Utc::now();
        let now_ms = now.timestamp_millis();

        let details_str = details
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_default();

        let request = WithdrawRequest {
            request_id,
            user_id,
            amount,
            method: method.to_string(),
            details,
            status: TransferStatus::Pending,
            created_at: now,
        };

        let mut pipe = redis::pipe();
        pipe.atomic();

        let mut redis_conn = self.redis.clone();

        let _: () = pipe
            .hset_multiple(
                withdraw_key(request_id),
                &[
                    ("request_id", request.request_id.to_string()),
                    ("user_id", request.user_id.to_string()),
                    ("amount", request.amount.to_string()),
                    ("method", request.method.clone()),
                    ("details", details_str),
                    ("status", request.status.as_str().to_string()),
                    ("created_at_ms", now_ms.to_string()),
                ],
            )
            .ignore()
            .zadd(withdraws_index_key(), request_id.to_string(), now_ms)
            .ignore()
            .query_async(&mut redis_conn)
            .await?;

        Ok(request)
    }

    async fn find_withdraw(&self, request_id: Uuid) -> Result<Option<WithdrawRequest>> {
        let mut redis_conn = self.redis.clone();
        load_withdraw_from_hash(&mut redis_conn, request_id).await
    }

    async fn list_withdraws(&self, limit: i64, offset: i64) -> Result<Vec<WithdrawRequest>> {
        let mut redis_conn = self.redis.clone();
        let ids = index_page(&mut redis_conn, withdraws_index_key(), limit, offset).await?;

        let mut requests = Vec::new();
        for id in ids {
            if let Some(request) = load_withdraw_from_hash(&mut redis_conn, id).await? {
                requests.push(request);
            }
        }

        Ok(requests)
    }

    async fn mark_withdraw_paid(&self, request_id: Uuid) -> Result<bool> {
        self.transition(
            withdraw_key(request_id),
            request_id,
            TransferStatus::Pending,
            TransferStatus::Paid,
        )
        .await
    }
}

/// Page through a sorted-set index, newest first
async fn index_page(
    redis: &mut ConnectionManager,
    index_key: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Uuid>> {
    let start = offset.max(0) as isize;
    let end = (offset + limit - 1).max(-1) as isize;
    let ids: Vec<String> = redis.zrevrange(index_key, start, end).await?;

    Ok(ids
        .into_iter()
        .filter_map(|v| Uuid::parse_str(&v).ok())
        .collect())
}

fn parse_common(
    map: &HashMap<String, String>,
    request_id: Uuid,
) -> Result<(Uuid, u64, TransferStatus, chrono::DateTime<Utc>)> {
    let user_id = map
        .get("user_id")
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Invalid user_id for request {}", request_id))
        })?;

    let amount = map
        .get("amount")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    let status_str = map.get("status").map(|s| s.as_str()).unwrap_or("pending");
    let status = TransferStatus::parse(status_str).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "Invalid status '{}' for request {}",
            status_str,
            request_id
        ))
    })?;

    let created_at_ms: i64 = map
        .get("created_at_ms")
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "Invalid created_at_ms for request {}",
                request_id
            ))
        })?;

    let created_at = Utc
        .timestamp_millis_opt(created_at_ms)
        .single()
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Invalid timestamp for request {}", request_id))
        })?;

    Ok((user_id, amount, status, created_at))
}

/// Load a deposit request from Redis hash storage
async fn load_deposit_from_hash(
    redis: &mut ConnectionManager,
    request_id: Uuid,
) -> Result<Option<DepositRequest>> {
    let map: HashMap<String, String> = redis.hgetall(deposit_key(request_id)).await?;

    if map.is_empty() {
        return Ok(None);
    }

    let (user_id, amount, status, created_at) = parse_common(&map, request_id)?;

    Ok(Some(DepositRequest {
        request_id,
        user_id,
        amount,
        method: map.get("method").cloned().unwrap_or_default(),
        note: map.get("note").cloned().filter(|v| !v.is_empty()),
        status,
        created_at,
    }))
}

/// Load a withdraw request from Redis hash storage
async fn load_withdraw_from_hash(
    redis: &mut ConnectionManager,
    request_id: Uuid,
) -> Result<Option<WithdrawRequest>> {
    let map: HashMap<String, String> = redis.hgetall(withdraw_key(request_id)).await?;

    if map.is_empty() {
        return Ok(None);
    }

    let (user_id, amount, status, created_at) = parse_common(&map, request_id)?;

    let details = map
        .get("details")
        .filter(|v| !v.is_empty())
        .and_then(|v| serde_json::from_str(v).ok());

    Ok(Some(WithdrawRequest {
        request_id,
        user_id,
        amount,
        method: map.get("method").cloned().unwrap_or_default(),
        details,
        status,
        created_at,
    }))
}
