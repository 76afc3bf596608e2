//! Storage layer
//!
//! One repository trait per record collection, each with a Redis-backed
//! implementation (hash per record, zset indexes, Lua scripts for the atomic
//! guards) and an in-memory implementation sharing the same semantics.

mod keys;
mod lua_scripts;

pub mod bets;
pub mod commissions;
pub mod memory;
pub mod rounds;
pub mod sessions;
pub mod transfers;
pub mod users;

pub use keys::*;
pub use lua_scripts::*;

use redis::aio::ConnectionManager;
use std::sync::Arc;

use bets::{BetRepository, RedisBetRepository};
use commissions::{CommissionRepository, RedisCommissionRepository};
use memory::MemoryStore;
use rounds::{RedisRoundRepository, RoundRepository};
use sessions::{RedisSessionRepository, SessionRepository};
use transfers::{RedisTransferRepository, TransferRepository};
use users::{RedisUserRepository, UserRepository};

/// Bundle of repository handles shared across handlers.
#[derive(Clone)]
pub struct Store {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    rounds: Arc<dyn RoundRepository>,
    bets: Arc<dyn BetRepository>,
    transfers: Arc<dyn TransferRepository>,
    commissions: Arc<dyn CommissionRepository>,
}

impl Store {
    /// Production store backed by Redis.
    pub fn redis(redis: ConnectionManager, session_ttl_secs: u64) -> Self {
        Self {
            users: Arc::new(RedisUserRepository::new(redis.clone())),
            sessions: Arc::new(RedisSessionRepository::new(redis.clone(), session_ttl_secs)),
            rounds: Arc::new(RedisRoundRepository::new(redis.clone())),
            bets: Arc::new(RedisBetRepository::new(redis.clone())),
            transfers: Arc::new(RedisTransferRepository::new(redis.clone())),
            commissions: Arc::new(RedisCommissionRepository::new(redis)),
        }
    }

    /// Hermetic store for tests and local development.
    pub fn in_memory() -> Self {
        let store = MemoryStore::new();
        Self {
            users: Arc::new(store.clone()),
            sessions: Arc::new(store.clone()),
            rounds: Arc::new(store.clone()),
            bets: Arc::new(store.clone()),
            transfers: Arc::new(store.clone()),
            commissions: Arc::new(store),
        }
    }

    pub fn users(&self) -> &dyn UserRepository {
        self.users.as_ref()
    }

    pub fn sessions(&self) -> &dyn SessionRepository {
        self.sessions.as_ref()
    }

    pub fn rounds(&self) -> &dyn RoundRepository {
        self.rounds.as_ref()
    }

    pub fn bets(&self) -> &dyn BetRepository {
        self.bets.as_ref()
    }

    pub fn transfers(&self) -> &dyn TransferRepository {
        self.transfers.as_ref()
    }

    pub fn commissions(&self) -> &dyn CommissionRepository {
        self.commissions.as_ref()
    }
}
