use axum::{extract::State, Json};

use crate::{
    domain::CommissionReportResponse,
    errors::Result,
    extractors::AdminUser,
    state::AppState,
};

/// Sum of all commission ledger entries.
pub async fn commission_report(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<CommissionReportResponse>> {
    let (total, entries) = state.store.commissions().report().await?;

    tracing::debug!(total, entries, "Commission report generated");
    Ok(Json(CommissionReportResponse { total, entries }))
}
