//! Round repository
//!
//! A round is a hash with a monotonic finished flag; finishing is a
//! once-only Lua guard that records the crash multiplier in the same step.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use shared::Multiplier;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::Round;
use crate::errors::{AppError, Result};

use super::keys::round_key;
use super::lua_scripts::FINISH_ROUND_SCRIPT;

#[async_trait]
pub trait RoundRepository: Send + Sync {
    async fn create(&self) -> Result<Round>;
    async fn find_by_id(&self, round_id: Uuid) -> Result<Option<Round>>;
    /// Finish the round exactly once, recording the crash multiplier.
    /// Returns false when the round was already finished.
    async fn finish(&self, round_id: Uuid, crash: Multiplier) -> Result<bool>;
}

/// Redis-based implementation of RoundRepository
pub struct RedisRoundRepository {
    redis: ConnectionManager,
}

impl RedisRoundRepository {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl RoundRepository for RedisRoundRepository {
    async fn create(&self) -> Result<Round> {
        let mut redis_conn = self.redis.clone();
        let round_id = Uuid::new_v4();
        let now = Utc::now();

        let _: () = redis_conn
            .hset_multiple(
                round_key(round_id),
                &[
                    ("round_id", round_id.to_string()),
                    ("crash_multiplier", "".to_string()),
                    ("finished", "0".to_string()),
                    ("created_at_ms", now.timestamp_millis().to_string()),
                ],
            )
            .await?;

        Ok(Round {
            round_id,
            crash_multiplier: None,
            finished: false,
            created_at: now,
        })
    }

    async fn find_by_id(&self, round_id: Uuid) -> Result<Option<Round>> {
        let mut redis_conn = self.redis.clone();
        load_round_from_hash(&mut redis_conn, round_id).await
    }

    async fn finish(&self, round_id: Uuid, crash: Multiplier) -> Result<bool> {
        let mut redis_conn = self.redis.clone();
        let script = Script::new(FINISH_ROUND_SCRIPT);

        let result: i64 = script
            .key(round_key(round_id))
            .arg(crash.as_hundredths())
            .invoke_async(&mut redis_conn)
            .await?;

        match result {
            -2 => Err(AppError::round_not_found(round_id)),
            0 => Ok(false),
            _ => Ok(true),
        }
    }
}

/// Load a round from Redis hash storage
async fn load_round_from_hash(
    redis: &mut ConnectionManager,
    round_id: Uuid,
) -> Result<Option<Round>> {
    let key = round_key(round_id);
    let map: HashMap<String, String> = redis.hgetall(&key).await?;

    if map.is_empty() {
        return Ok(None);
    }

    let created_at_ms: i64 = map
        .get("created_at_ms")
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Invalid created_at_ms for round {}", round_id))
        })?;

    let created_at = Utc
        .timestamp_millis_opt(created_at_ms)
        .single()
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Invalid timestamp for round {}", round_id))
        })?;

    let crash_multiplier = map
        .get("crash_multiplier")
        .and_then(|v| if v.is_empty() { None } else { v.parse::<u32>().ok() })
        .map(Multiplier::new_unchecked);

    Ok(Some(Round {
        round_id,
        crash_multiplier,
        finished: map.get("finished").map(|v| v == "1").unwrap_or(false),
        created_at,
    }))
}
