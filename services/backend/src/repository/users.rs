//! User repository: identity lookup plus the account ledger
//!
//! The ledger operations are the only place balances change. Both are single
//! atomic read-modify-writes per user record: debit via a conditional Lua
//! script, credit via HINCRBY.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::{Role, User};
use crate::errors::{AppError, Result};

use super::keys::{user_email_index_key, user_key};
use super::lua_scripts::DEBIT_BALANCE_SCRIPT;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create the user if the email is new, otherwise update the role.
    async fn upsert_by_email(&self, email: &str, role: Role) -> Result<User>;
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Atomically decrease the balance; `InsufficientFunds` when the amount
    /// exceeds it. Returns the new balance.
    async fn debit(&self, user_id: Uuid, amount: u64) -> Result<u64>;
    /// Atomically increase the balance. Returns the new balance.
    async fn credit(&self, user_id: Uuid, amount: u64) -> Result<u64>;
}

/// Redis-based implementation of UserRepository
pub struct RedisUserRepository {
    redis: ConnectionManager,
}

impl RedisUserRepository {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl UserRepository for RedisUserRepository {
    async fn upsert_by_email(&self, email: &str, role: Role) -> Result<User> {
        let mut redis_conn = self.redis.clone();
        let email_key = user_email_index_key(email);
        let user_id = Uuid::new_v4();

        // Claim the email index only if the email is new; losers of a
        // concurrent race fall through to the update path.
        let claimed: bool = redis_conn.set_nx(&email_key, user_id.to_string()).await?;

        if claimed {
            let now = Utc::now();
            let _: () = redis_conn
                .hset_multiple(
                    user_key(user_id),
                    &[
                        ("user_id", user_id.to_string()),
                        ("email", email.to_string()),
                        ("balance", "0".to_string()),
                        ("role", role.as_str().to_string()),
                        ("created_at_ms", now.timestamp_millis().to_string()),
                    ],
                )
                .await?;

            return Ok(User {
                user_id,
                email: email.to_string(),
                balance: 0,
                role,
                created_at: now,
            });
        }

        let existing: Option<String> = redis_conn.get(&email_key).await?;
        let existing_id = existing
            .and_then(|v| Uuid::parse_str(&v).ok())
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("Corrupt email index for {}", email))
            })?;

        let _: () = redis_conn
            .hset(user_key(existing_id), "role", role.as_str())
            .await?;

        load_user_from_hash(&mut redis_conn, existing_id)
            .await?
            .ok_or_else(|| AppError::user_not_found(existing_id))
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let mut redis_conn = self.redis.clone();
        load_user_from_hash(&mut redis_conn, user_id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut redis_conn = self.redis.clone();
        let id: Option<String> = redis_conn.get(user_email_index_key(email)).await?;

        match id.and_then(|v| Uuid::parse_str(&v).ok()) {
            Some(user_id) => load_user_from_hash(&mut redis_conn, user_id).await,
            None => Ok(None),
        }
    }

    async fn debit(&self, user_id: Uuid, amount: u64) -> Result<u64> {
        let mut redis_conn = self.redis.clone();
        let script = Script::new(DEBIT_BALANCE_SCRIPT);

        let result: i64 = script
            .key(user_key(user_id))
            .arg(amount)
            .invoke_async(&mut redis_conn)
            .await?;

        match result {
            -2 => Err(AppError::user_not_found(user_id)),
            -1 => Err(AppError::InsufficientFunds),
            balance => Ok(balance as u64),
        }
    }

    async fn credit(&self, user_id: Uuid, amount: u64) -> Result<u64> {
        let mut redis_conn = self.redis.clone();
        let key = user_key(user_id);

        let exists: bool = redis_conn.exists(&key).await?;
        if !exists {
            return Err(AppError::user_not_found(user_id));
        }

        let balance: i64 = redis_conn.hincr(&key, "balance", amount as i64).await?;
        Ok(balance as u64)
    }
}

/// Load a user from Redis hash storage
async fn load_user_from_hash(
    redis: &mut ConnectionManager,
    user_id: Uuid,
) -> Result<Option<User>> {
    let key = user_key(user_id);
    let map: HashMap<String, String> = redis.hgetall(&key).await?;

    if map.is_empty() {
        return Ok(None);
    }

    let created_at_ms: i64 = map
        .get("created_at_ms")
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Invalid created_at_ms for user {}", user_id))
        })?;

    let created_at = Utc
        .timestamp_millis_opt(created_at_ms)
        .single()
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Invalid timestamp for user {}", user_id))
        })?;

    let role_str = map.get("role").map(|s| s.as_str()).unwrap_or("player");
    let role = Role::parse(role_str).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("Invalid role '{}' for user {}", role_str, user_id))
    })?;

    Ok(Some(User {
        user_id,
        email: map.get("email").cloned().unwrap_or_default(),
        balance: map
            .get("balance")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0),
        role,
        created_at,
    }))
}
