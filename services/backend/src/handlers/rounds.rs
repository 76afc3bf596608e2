use axum::{extract::State, Json};

use crate::{
    domain::{FinishRoundRequest, FinishRoundResponse, Round},
    errors::{AppError, Result},
    extractors::{AdminUser, ValidatedJson},
    services::crash::draw_crash_multiplier,
    state::AppState,
};

pub async fn start_round(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<Round>> {
    let round = state.store.rounds().create().await?;

    tracing::info!(round_id = %round.round_id, admin = %admin.user_id, "Round opened");
    metrics::counter!("rounds_started_total").increment(1);

    Ok(Json(round))
}

/// Finish a round: draw the crash point once, then mark every bet on the
/// round with its paid/lost result. No money moves here; payment happened
/// at cashout time.
pub async fn finish_round(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidatedJson(req): ValidatedJson<FinishRoundRequest>,
) -> Result<Json<FinishRoundResponse>> {
    tracing::debug!(round_id = %req.round_id, admin = %admin.user_id, "Finishing round");

    // ThreadRng is not Send, so the draw stays outside any await.
    let crash = {
        let mut rng = rand::thread_rng();
        draw_crash_multiplier(&mut rng)
    };

    if !state.store.rounds().finish(req.round_id, crash).await? {
        return Err(AppError::round_finished(req.round_id));
    }

    // After the finished flag is set no new cashout can win its claim, so
    // each bet's cashed_out flag is final here.
    let bets = state.store.bets().find_by_round(req.round_id).await?;
    for bet in &bets {
        state
            .store
            .bets()
            .mark_result_paid(bet.bet_id, bet.cashed_out)
            .await?;
    }

    let round = state
        .store
        .rounds()
        .find_by_id(req.round_id)
        .await?
        .ok_or_else(|| AppError::round_not_found(req.round_id))?;
    let bets = state.store.bets().find_by_round(req.round_id).await?;

    tracing::info!(
        round_id = %req.round_id,
        crash = %crash,
        processed = bets.len(),
        "Round finished"
    );
    metrics::counter!("rounds_finished_total").increment(1);

    Ok(Json(FinishRoundResponse {
        round,
        processed: bets.len(),
        bets,
    }))
}
