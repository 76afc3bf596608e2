//! Crash multiplier draw
//!
//! Weighted three-tier draw for the recorded crash point of a round. The
//! draw decides nothing about payouts; those were fixed at each bet's own
//! cashout multiplier.

use rand::Rng;
use shared::{
    Multiplier, CRASH_TIER_LOW, CRASH_TIER_LOW_WEIGHT, CRASH_TIER_MID, CRASH_TIER_MID_WEIGHT,
    CRASH_TIER_TOP, MAX_MULTIPLIER_HUNDREDTHS, MIN_MULTIPLIER_HUNDREDTHS,
};

/// Draw one crash multiplier, rounded to hundredths.
///
/// Tier selection: 60% low [1.00, 2.50), 30% mid [2.50, 7.50),
/// 10% top [7.50, 57.50).
pub fn draw_crash_multiplier<R: Rng + ?Sized>(rng: &mut R) -> Multiplier {
    let p: f64 = rng.gen();

    let (start, span) = if p < CRASH_TIER_LOW_WEIGHT {
        CRASH_TIER_LOW
    } else if p < CRASH_TIER_MID_WEIGHT {
        CRASH_TIER_MID
    } else {
        CRASH_TIER_TOP
    };

    let value = start + rng.gen::<f64>() * span;

    let hundredths = (value * 100.0).round() as u32;
    Multiplier::new_unchecked(hundredths.clamp(
        MIN_MULTIPLIER_HUNDREDTHS,
        MAX_MULTIPLIER_HUNDREDTHS,
    ))
}
