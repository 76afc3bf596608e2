/// Shared constants for the crash betting backend
///
/// This module centralizes all magic numbers and configuration constants
/// to prevent inconsistencies between the API surface, the settlement
/// logic, and the storage layer.

/// Minimum monetary amount in cents (0.01)
///
/// Rationale: zero-amount bets, deposits and withdraws are meaningless and
/// are rejected at construction time rather than in every handler.
pub const MIN_AMOUNT_CENTS: u64 = 1;

/// Maximum monetary amount in cents (1 billion)
///
/// Rationale: caps a single bet/deposit/withdraw so that settlement math
/// stays far away from integer overflow even at the maximum multiplier.
pub const MAX_AMOUNT_CENTS: u64 = 100_000_000_000;

/// Minimum cashout multiplier in hundredths (1.00x)
///
/// A cashout below the starting multiplier cannot occur on the crash curve;
/// requiring at least 1.00x also guarantees a settlement never nets negative.
pub const MIN_MULTIPLIER_HUNDREDTHS: u32 = 100;

/// Maximum multiplier in hundredths (100.00x)
///
/// Hard ceiling for both cashout requests and the recorded crash point.
pub const MAX_MULTIPLIER_HUNDREDTHS: u32 = 10_000;

/// Commission rate in hundredths of the stake (10%)
///
/// The commission is taken from the bet amount at cashout time, not from
/// the payout.
pub const COMMISSION_RATE_HUNDREDTHS: u64 = 10;

/// Crash draw tier weights: cumulative probability boundaries.
///
/// A uniform draw below `CRASH_TIER_LOW_WEIGHT` lands in the low tier,
/// below `CRASH_TIER_MID_WEIGHT` in the mid tier, otherwise in the top tier.
pub const CRASH_TIER_LOW_WEIGHT: f64 = 0.6;
pub const CRASH_TIER_MID_WEIGHT: f64 = 0.9;

/// Crash draw tier ranges as (start, span); a tier covers [start, start + span).
pub const CRASH_TIER_LOW: (f64, f64) = (1.0, 1.5);
pub const CRASH_TIER_MID: (f64, f64) = (2.5, 5.0);
pub const CRASH_TIER_TOP: (f64, f64) = (7.5, 50.0);

/// Default session lifetime in seconds (24 hours)
///
/// Sessions are opaque server-issued tokens; after this period the client
/// must re-authenticate.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 86_400;
