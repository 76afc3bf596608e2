//! Session repository
//!
//! Opaque server-issued tokens mapped to user ids with a TTL. The token is
//! the whole credential; there is nothing to verify client-side.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

use crate::errors::Result;

use super::keys::session_key;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Issue a fresh token for the user.
    async fn issue(&self, user_id: Uuid) -> Result<String>;
    /// Resolve a token to the user id it was issued for, if still valid.
    async fn resolve(&self, token: &str) -> Result<Option<Uuid>>;
}

/// Redis-based implementation of SessionRepository
pub struct RedisSessionRepository {
    redis: ConnectionManager,
    ttl_secs: u64,
}

impl RedisSessionRepository {
    pub fn new(redis: ConnectionManager, ttl_secs: u64) -> Self {
        Self { redis, ttl_secs }
    }
}

#[async_trait]
impl SessionRepository for RedisSessionRepository {
    async fn issue(&self, user_id: Uuid) -> Result<String> {
        let mut redis_conn = self.redis.clone();

        // Hyphen-less UUID keeps the token compact and URL-safe.
        let token = Uuid::new_v4().to_string().replace('-', "");

        let _: () = redis_conn
            .set_ex(session_key(&token), user_id.to_string(), self.ttl_secs)
            .await?;

        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<Uuid>> {
        let mut redis_conn = self.redis.clone();
        let value: Option<String> = redis_conn.get(session_key(token)).await?;

        Ok(value.and_then(|v| Uuid::parse_str(&v).ok()))
    }
}
