use axum::{extract::State, Json};

use crate::{
    domain::{Role, SessionResponse, SetupUserRequest, User},
    errors::Result,
    extractors::{AuthUser, ValidatedJson},
    state::AppState,
};

pub async fn me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}

/// Create or update a user by email and hand back a session token.
///
/// Demo-grade bootstrap: there is no password step, but everything after
/// this point runs on the issued session, not on caller-supplied identity.
pub async fn setup_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SetupUserRequest>,
) -> Result<Json<SessionResponse>> {
    let role = req.role.unwrap_or(Role::Player);

    tracing::debug!(user.email = %req.email, user.role = role.as_str(), "Setting up user");

    let user = state.store.users().upsert_by_email(&req.email, role).await?;
    let token = state.store.sessions().issue(user.user_id).await?;

    tracing::info!(user_id = %user.user_id, "User ready, session issued");
    metrics::counter!("sessions_issued_total").increment(1);

    Ok(Json(SessionResponse { user, token }))
}
