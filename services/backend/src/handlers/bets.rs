use axum::{extract::State, Json};
use shared::Amount;

use crate::{
    domain::{CashoutRequest, CashoutResponse, PlaceBetRequest, PlaceBetResponse},
    errors::{AppError, Result},
    extractors::{AuthUser, ValidatedJson},
    repository::bets::CashoutGate,
    services::settlement::settle,
    state::AppState,
};

pub async fn place_bet(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(req): ValidatedJson<PlaceBetRequest>,
) -> Result<Json<PlaceBetResponse>> {
    tracing::debug!(
        user_id = %user.user_id,
        round_id = %req.round_id,
        bet.amount = %req.amount,
        "Placing bet"
    );

    let round = state
        .store
        .rounds()
        .find_by_id(req.round_id)
        .await?
        .ok_or_else(|| AppError::round_not_found(req.round_id))?;

    if round.finished {
        return Err(AppError::round_finished(req.round_id));
    }

    let amount = req.amount.as_cents();
    let limits = &state.config.betting;
    if amount < limits.min_bet_cents || amount > limits.max_bet_cents {
        return Err(AppError::invalid_input(format!(
            "Bet amount {} outside limits [{}, {}]",
            amount, limits.min_bet_cents, limits.max_bet_cents
        )));
    }

    // Debit before the bet record exists; the conditional debit is the
    // insufficient-funds gate.
    let balance = state.store.users().debit(user.user_id, amount).await?;
    let bet = state
        .store
        .bets()
        .create(user.user_id, req.round_id, amount)
        .await?;

    tracing::info!(bet_id = %bet.bet_id, user_id = %user.user_id, "Bet placed");
    metrics::counter!("bets_placed_total").increment(1);

    Ok(Json(PlaceBetResponse { bet, balance }))
}

/// Cash out a bet at the caller-observed multiplier: settle, credit the net
/// amount, and append the commission ledger entry.
pub async fn cashout_bet(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(req): ValidatedJson<CashoutRequest>,
) -> Result<Json<CashoutResponse>> {
    tracing::debug!(
        user_id = %user.user_id,
        bet_id = %req.bet_id,
        multiplier = %req.multiplier,
        "Cashing out bet"
    );

    let bet = state
        .store
        .bets()
        .find_by_id(req.bet_id)
        .await?
        .ok_or_else(|| AppError::bet_not_found(req.bet_id))?;

    if bet.user_id != user.user_id {
        return Err(AppError::forbidden("Not your bet"));
    }

    match state
        .store
        .bets()
        .claim_cashout(req.bet_id, req.multiplier)
        .await?
    {
        CashoutGate::AlreadyCashedOut => {
            return Err(AppError::already_cashed_out(req.bet_id));
        }
        CashoutGate::RoundClosed => {
            return Err(AppError::round_finished(bet.round_id));
        }
        CashoutGate::Applied => {}
    }

    let settlement = settle(Amount::new_unchecked(bet.amount), req.multiplier);

    let balance = state
        .store
        .users()
        .credit(user.user_id, settlement.net_credit)
        .await?;
    state
        .store
        .commissions()
        .record(bet.round_id, settlement.commission)
        .await?;

    let bet = state
        .store
        .bets()
        .find_by_id(req.bet_id)
        .await?
        .ok_or_else(|| AppError::bet_not_found(req.bet_id))?;

    tracing::info!(
        bet_id = %req.bet_id,
        gross = settlement.gross_payout,
        commission = settlement.commission,
        net = settlement.net_credit,
        "Bet cashed out"
    );
    metrics::counter!("cashouts_total").increment(1);

    Ok(Json(CashoutResponse {
        bet,
        gross_payout: settlement.gross_payout,
        commission: settlement.commission,
        net_credit: settlement.net_credit,
        balance,
    }))
}
