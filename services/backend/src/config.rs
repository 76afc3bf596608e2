use serde::Deserialize;
use std::env;

use shared::DEFAULT_SESSION_TTL_SECS;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_port: u16,
    pub metrics_port: u16,
    pub redis: RedisConfig,
    pub session: SessionConfig,
    pub betting: BettingConfig,
    pub payments: PaymentsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BettingConfig {
    pub min_bet_cents: u64,
    pub max_bet_cents: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentsConfig {
    /// Manual-payment instructions returned with every deposit request.
    /// The request id is appended as a transfer reference.
    pub deposit_instructions: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()?,
            metrics_port: env::var("METRICS_PORT")
                .unwrap_or_else(|_| "9090".to_string())
                .parse()?,
            redis: RedisConfig {
                url: env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            },
            session: SessionConfig {
                ttl_secs: env::var("SESSION_TTL_SECS")
                    .unwrap_or_else(|_| DEFAULT_SESSION_TTL_SECS.to_string())
                    .parse()?,
            },
            betting: BettingConfig {
                min_bet_cents: env::var("MIN_BET_CENTS")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()?,
                max_bet_cents: env::var("MAX_BET_CENTS")
                    .unwrap_or_else(|_| "1000000000".to_string())
                    .parse()?,
            },
            payments: PaymentsConfig {
                deposit_instructions: env::var("DEPOSIT_INSTRUCTIONS").unwrap_or_else(|_| {
                    "Send the payment manually to the operator account.".to_string()
                }),
            },
        })
    }
}
