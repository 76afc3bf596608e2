//! Bet repository
//!
//! Bets are hashes indexed per round and per user. The cashout claim is a
//! single Lua step that owns both the once-only flag and the round-open gate.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use shared::Multiplier;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::Bet;
use crate::errors::{AppError, Result};

use super::keys::{bet_key, round_bets_index_key, user_bets_index_key};
use super::lua_scripts::CASHOUT_BET_SCRIPT;

/// Outcome of a cashout claim attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashoutGate {
    /// The claim won; settlement may proceed.
    Applied,
    /// The bet was already cashed out.
    AlreadyCashedOut,
    /// The round finished before the claim.
    RoundClosed,
}

#[async_trait]
pub trait BetRepository: Send + Sync {
    async fn create(&self, user_id: Uuid, round_id: Uuid, amount: u64) -> Result<Bet>;
    async fn find_by_id(&self, bet_id: Uuid) -> Result<Option<Bet>>;
    async fn find_by_round(&self, round_id: Uuid) -> Result<Vec<Bet>>;
    /// Claim the once-only cashout, gated on the round still being open.
    async fn claim_cashout(&self, bet_id: Uuid, multiplier: Multiplier) -> Result<CashoutGate>;
    async fn mark_result_paid(&self, bet_id: Uuid, paid: bool) -> Result<()>;
}

/// Redis-based implementation of BetRepository
pub struct RedisBetRepository {
    redis: ConnectionManager,
}

impl RedisBetRepository {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl BetRepository for RedisBetRepository {
    async fn create(&self, user_id: Uuid, round_id: Uuid, amount: u64) -> Result<Bet> {
        let bet_id = Uuid::new_v4();
        let now = Utc::now();
        let now_ms = now.timestamp_millis();

        let bet = Bet {
            bet_id,
            user_id,
            round_id,
            amount,
            cashed_out: false,
            cashed_at_multiplier: None,
            result_paid: None,
            created_at: now,
        };

        let mut pipe = redis::pipe();
        pipe.atomic();

        let mut redis_conn = self.redis.clone();

        let _: () = pipe
            .hset_multiple(
                bet_key(bet_id),
                &[
                    ("bet_id", bet.bet_id.to_string()),
                    ("user_id", bet.user_id.to_string()),
                    ("round_id", bet.round_id.to_string()),
                    ("amount", bet.amount.to_string()),
                    ("cashed_out", "0".to_string()),
                    ("cashed_at_multiplier", "".to_string()),
                    ("result_paid", "".to_string()),
                    ("created_at_ms", now_ms.to_string()),
                ],
            )
            .ignore()
            .zadd(round_bets_index_key(round_id), bet_id.to_string(), now_ms)
            .ignore()
            .zadd(user_bets_index_key(user_id), bet_id.to_string(), now_ms)
            .ignore()
            .query_async(&mut redis_conn)
            .await?;

        Ok(bet)
    }

    async fn find_by_id(&self, bet_id: Uuid) -> Result<Option<Bet>> {
        let mut redis_conn = self.redis.clone();
        load_bet_from_hash(&mut redis_conn, bet_id).await
    }

    async fn find_by_round(&self, round_id: Uuid) -> Result<Vec<Bet>> {
        let mut redis_conn = self.redis.clone();
        let key = round_bets_index_key(round_id);

        let bet_ids: Vec<String> = redis_conn.zrange(&key, 0, -1).await?;

        let mut bets = Vec::new();
        for id_str in bet_ids {
            if let Ok(id) = Uuid::parse_str(&id_str) {
                if let Some(bet) = load_bet_from_hash(&mut redis_conn, id).await? {
                    bets.push(bet);
                }
            }
        }

        Ok(bets)
    }

    async fn claim_cashout(&self, bet_id: Uuid, multiplier: Multiplier) -> Result<CashoutGate> {
        let mut redis_conn = self.redis.clone();
        let script = Script::new(CASHOUT_BET_SCRIPT);

        let result: i64 = script
            .key(bet_key(bet_id))
            .arg(multiplier.as_hundredths())
            .invoke_async(&mut redis_conn)
            .await?;

        match result {
            -2 => Err(AppError::bet_not_found(bet_id)),
            -1 => Ok(CashoutGate::RoundClosed),
            0 => Ok(CashoutGate::AlreadyCashedOut),
            _ => Ok(CashoutGate::Applied),
        }
    }

    async fn mark_result_paid(&self, bet_id: Uuid, paid: bool) -> Result<()> {
        let mut redis_conn = self.redis.clone();

        let _: () = redis_conn
            .hset(bet_key(bet_id), "result_paid", if paid { "1" } else { "0" })
            .await?;

        Ok(())
    }
}

/// Load a bet from Redis hash storage
async fn load_bet_from_hash(redis: &mut ConnectionManager, bet_id: Uuid) -> Result<Option<Bet>> {
    let key = bet_key(bet_id);
    let map: HashMap<String, String> = redis.hgetall(&key).await?;

    if map.is_empty() {
        return Ok(None);
    }

    let created_at_ms: i64 = map
        .get("created_at_ms")
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Invalid created_at_ms for bet {}", bet_id))
        })?;

    let created_at = Utc
        .timestamp_millis_opt(created_at_ms)
        .single()
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Invalid timestamp for bet {}", bet_id))
        })?;

    let user_id = map
        .get("user_id")
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Invalid user_id for bet {}", bet_id))
        })?;

    let round_id = map
        .get("round_id")
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Invalid round_id for bet {}", bet_id))
        })?;

    let cashed_at_multiplier = map
        .get("cashed_at_multiplier")
        .and_then(|v| if v.is_empty() { None } else { v.parse::<u32>().ok() })
        .map(Multiplier::new_unchecked);

    let result_paid = map
        .get("result_paid")
        .and_then(|v| if v.is_empty() { None } else { Some(v == "1") });

    Ok(Some(Bet {
        bet_id,
        user_id,
        round_id,
        amount: map
            .get("amount")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0),
        cashed_out: map.get("cashed_out").map(|v| v == "1").unwrap_or(false),
        cashed_at_multiplier,
        result_paid,
        created_at,
    }))
}
