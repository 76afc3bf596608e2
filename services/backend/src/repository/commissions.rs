//! Commission ledger repository
//!
//! Append-only entries plus a running total; entries are never mutated.

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

use crate::domain::CommissionEntry;
use crate::errors::Result;

use super::keys::{commission_key, commissions_index_key, commissions_total_key};

#[async_trait]
pub trait CommissionRepository: Send + Sync {
    /// Append a ledger entry for a cashout on the given round.
    async fn record(&self, round_id: Uuid, amount: u64) -> Result<CommissionEntry>;
    /// Returns (total cents, entry count) over the whole ledger.
    async fn report(&self) -> Result<(u64, u64)>;
}

/// Redis-based implementation of CommissionRepository
pub struct RedisCommissionRepository {
    redis: ConnectionManager,
}

impl RedisCommissionRepository {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl CommissionRepository for RedisCommissionRepository {
    async fn record(&self, round_id: Uuid, amount: u64) -> Result<CommissionEntry> {
        let commission_id = Uuid::new_v4();
        let now = Utc::now();
        let now_ms = now.timestamp_millis();

        let entry = CommissionEntry {
            commission_id,
            round_id,
            amount,
            created_at: now,
        };

        let mut pipe = redis::pipe();
        pipe.atomic();

        let mut redis_conn = self.redis.clone();

        let _: () = pipe
            .hset_multiple(
                commission_key(commission_id),
                &[
                    ("commission_id", commission_id.to_string()),
                    ("round_id", round_id.to_string()),
                    ("amount", amount.to_string()),
                    ("created_at_ms", now_ms.to_string()),
                ],
            )
            .ignore()
            .zadd(commissions_index_key(), commission_id.to_string(), now_ms)
            .ignore()
            .incr(commissions_total_key(), amount)
            .ignore()
            .query_async(&mut redis_conn)
            .await?;

        Ok(entry)
    }

    async fn report(&self) -> Result<(u64, u64)> {
        let mut redis_conn = self.redis.clone();

        let total: Option<u64> = redis_conn.get(commissions_total_key()).await?;
        let entries: u64 = redis_conn.zcard(commissions_index_key()).await?;

        Ok((total.unwrap_or(0), entries))
    }
}
