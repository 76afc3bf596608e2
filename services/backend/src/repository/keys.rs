//! Redis key generation functions
//!
//! Centralizes all Redis key patterns used for record storage and indexing.

use uuid::Uuid;

/// Redis key prefix for users
const USER_KEY_PREFIX: &str = "user:";

/// Redis key prefix for the email -> user id index
const USER_EMAIL_INDEX_PREFIX: &str = "users:email:";

/// Redis key prefix for sessions
const SESSION_KEY_PREFIX: &str = "session:";

/// Redis key prefix for rounds
const ROUND_KEY_PREFIX: &str = "round:";

/// Redis key prefix for bets
const BET_KEY_PREFIX: &str = "bet:";

/// Redis key prefix for the round-bet index
const ROUND_BETS_INDEX_PREFIX: &str = "bets:round:";

/// Redis key prefix for the user-bet index
const USER_BETS_INDEX_PREFIX: &str = "bets:user:";

/// Redis key prefix for deposit requests
const DEPOSIT_KEY_PREFIX: &str = "deposit:";

/// Redis key for the deposit request sorted set
const DEPOSITS_INDEX: &str = "deposits:all";

/// Redis key prefix for withdraw requests
const WITHDRAW_KEY_PREFIX: &str = "withdraw:";

/// Redis key for the withdraw request sorted set
const WITHDRAWS_INDEX: &str = "withdraws:all";

/// Redis key prefix for commission ledger entries
const COMMISSION_KEY_PREFIX: &str = "commission:";

/// Redis key for the commission entry sorted set
const COMMISSIONS_INDEX: &str = "commissions:all";

/// Redis key for the running commission total in cents
const COMMISSIONS_TOTAL: &str = "commissions:total";

pub fn user_key(user_id: Uuid) -> String {
    format!("{}{}", USER_KEY_PREFIX, user_id)
}

pub fn user_email_index_key(email: &str) -> String {
    format!("{}{}", USER_EMAIL_INDEX_PREFIX, email)
}

pub fn session_key(token: &str) -> String {
    format!("{}{}", SESSION_KEY_PREFIX, token)
}

pub fn round_key(round_id: Uuid) -> String {
    format!("{}{}", ROUND_KEY_PREFIX, round_id)
}

pub fn bet_key(bet_id: Uuid) -> String {
    format!("{}{}", BET_KEY_PREFIX, bet_id)
}

pub fn round_bets_index_key(round_id: Uuid) -> String {
    format!("{}{}", ROUND_BETS_INDEX_PREFIX, round_id)
}

pub fn user_bets_index_key(user_id: Uuid) -> String {
    format!("{}{}", USER_BETS_INDEX_PREFIX, user_id)
}

pub fn deposit_key(request_id: Uuid) -> String {
    format!("{}{}", DEPOSIT_KEY_PREFIX, request_id)
}

pub fn deposits_index_key() -> &'static str {
    DEPOSITS_INDEX
}

pub fn withdraw_key(request_id: Uuid) -> String {
    format!("{}{}", WITHDRAW_KEY_PREFIX, request_id)
}

pub fn withdraws_index_key() -> &'static str {
    WITHDRAWS_INDEX
}

pub fn commission_key(commission_id: Uuid) -> String {
    format!("{}{}", COMMISSION_KEY_PREFIX, commission_id)
}

pub fn commissions_index_key() -> &'static str {
    COMMISSIONS_INDEX
}

pub fn commissions_total_key() -> &'static str {
    COMMISSIONS_TOTAL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_key_formats() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(user_key(id), "user:550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(round_key(id), "round:550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(bet_key(id), "bet:550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(
            deposit_key(id),
            "deposit:550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn test_index_key_formats() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(
            user_email_index_key("a@b.test"),
            "users:email:a@b.test"
        );
        assert_eq!(
            round_bets_index_key(id),
            "bets:round:550e8400-e29b-41d4-a716-446655440000"
        );
        assert_eq!(deposits_index_key(), "deposits:all");
        assert_eq!(withdraws_index_key(), "withdraws:all");
        assert_eq!(commissions_total_key(), "commissions:total");
    }
}
