use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{Amount, Multiplier};
use uuid::Uuid;
use validator::Validate;

/// Role carried on the user record and checked per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Player,
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Player => "player",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "player" => Some(Role::Player),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    /// Balance in cents. Never debited below zero.
    pub balance: u64,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub round_id: Uuid,
    /// Crash point in hundredths, set exactly once at finish.
    pub crash_multiplier: Option<Multiplier>,
    pub finished: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub bet_id: Uuid,
    pub user_id: Uuid,
    pub round_id: Uuid,
    /// Stake in cents, debited from the user at creation.
    pub amount: u64,
    pub cashed_out: bool,
    pub cashed_at_multiplier: Option<Multiplier>,
    /// None until the round finishes; then records whether the bet paid.
    pub result_paid: Option<bool>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionEntry {
    pub commission_id: Uuid,
    pub round_id: Uuid,
    /// Commission in cents, skimmed from the stake at cashout.
    pub amount: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Approved,
    Paid,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Approved => "approved",
            TransferStatus::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<TransferStatus> {
        match s {
            "pending" => Some(TransferStatus::Pending),
            "approved" => Some(TransferStatus::Approved),
            "paid" => Some(TransferStatus::Paid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRequest {
    pub request_id: Uuid,
    pub user_id: Uuid,
    pub amount: u64,
    pub method: String,
    pub note: Option<String>,
    pub status: TransferStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub request_id: Uuid,
    pub user_id: Uuid,
    pub amount: u64,
    pub method: String,
    pub details: Option<serde_json::Value>,
    pub status: TransferStatus,
    pub created_at: DateTime<Utc>,
}

// Custom deserializer for Amount from cents
fn deserialize_amount<'de, D>(deserializer: D) -> Result<Amount, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let cents = u64::deserialize(deserializer)?;
    Amount::try_from(cents).map_err(|e| serde::de::Error::custom(format!("Invalid amount: {}", e)))
}

// Custom deserializer for Multiplier from hundredths
fn deserialize_multiplier<'de, D>(deserializer: D) -> Result<Multiplier, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let hundredths = u32::deserialize(deserializer)?;
    Multiplier::try_from(hundredths)
        .map_err(|e| serde::de::Error::custom(format!("Invalid multiplier: {}", e)))
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetupUserRequest {
    #[validate(email)]
    pub email: String,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub user: User,
    /// Opaque session token; presented as `Authorization: Bearer <token>`.
    pub token: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PlaceBetRequest {
    pub round_id: Uuid,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaceBetResponse {
    pub bet: Bet,
    pub balance: u64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CashoutRequest {
    pub bet_id: Uuid,
    #[serde(deserialize_with = "deserialize_multiplier")]
    pub multiplier: Multiplier,
}

#[derive(Debug, Clone, Serialize)]
pub struct CashoutResponse {
    pub bet: Bet,
    pub gross_payout: u64,
    pub commission: u64,
    pub net_credit: u64,
    pub balance: u64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FinishRoundRequest {
    pub round_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinishRoundResponse {
    pub round: Round,
    pub processed: usize,
    pub bets: Vec<Bet>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DepositRequestBody {
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Amount,
    #[validate(length(min = 1, max = 64))]
    pub method: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepositRequestResponse {
    pub message: String,
    pub deposit: DepositRequest,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ApproveDepositRequest {
    pub request_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApproveDepositResponse {
    pub deposit: DepositRequest,
    /// Credited user's new balance in cents.
    pub balance: u64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WithdrawRequestBody {
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Amount,
    #[validate(length(min = 1, max = 64))]
    pub method: String,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawRequestResponse {
    pub message: String,
    pub withdraw: WithdrawRequest,
    pub balance: u64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MarkWithdrawPaidRequest {
    pub request_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommissionReportResponse {
    /// Total commission in cents across all entries.
    pub total: u64,
    pub entries: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Player, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn test_transfer_status_round_trip() {
        for status in [
            TransferStatus::Pending,
            TransferStatus::Approved,
            TransferStatus::Paid,
        ] {
            assert_eq!(TransferStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TransferStatus::parse(""), None);
    }

    #[test]
    fn test_place_bet_request_rejects_zero_amount() {
        let err = serde_json::from_value::<PlaceBetRequest>(serde_json::json!({
            "round_id": Uuid::new_v4(),
            "amount": 0
        }))
        .unwrap_err();
        assert!(err.to_string().contains("Invalid amount"));
    }

    #[test]
    fn test_cashout_request_rejects_sub_unit_multiplier() {
        let err = serde_json::from_value::<CashoutRequest>(serde_json::json!({
            "bet_id": Uuid::new_v4(),
            "multiplier": 99
        }))
        .unwrap_err();
        assert!(err.to_string().contains("Invalid multiplier"));
    }
}
