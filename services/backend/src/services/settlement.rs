//! Settlement calculator
//!
//! Pure cashout arithmetic: gross payout, fixed-rate commission on the
//! stake, and the net credit applied to the user balance.

use shared::{Amount, Multiplier, COMMISSION_RATE_HUNDREDTHS};

/// Result of settling one bet at a cashout multiplier. All values in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub gross_payout: u64,
    pub commission: u64,
    pub net_credit: u64,
}

/// Settle a bet: `gross = stake x multiplier`, `commission = 10% of stake`,
/// `net = gross - commission`, each rounded half-up to a whole cent.
///
/// The multiplier floor of 1.00x guarantees `gross >= stake > commission`,
/// so the net credit is always positive.
pub fn settle(amount: Amount, multiplier: Multiplier) -> Settlement {
    let stake = amount.as_cents();

    let gross_payout = mul_hundredths_rounded(stake, multiplier.as_hundredths() as u64);
    let commission = mul_hundredths_rounded(stake, COMMISSION_RATE_HUNDREDTHS);

    Settlement {
        gross_payout,
        commission,
        net_credit: gross_payout - commission,
    }
}

// cents x hundredths with half-up rounding; u128 keeps the intermediate
// product exact for the full validated range.
fn mul_hundredths_rounded(cents: u64, hundredths: u64) -> u64 {
    ((cents as u128 * hundredths as u128 + 50) / 100) as u64
}
