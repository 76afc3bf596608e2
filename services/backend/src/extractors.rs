use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRef, FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use validator::Validate;

use crate::{domain::User, errors::AppError, state::AppState};

/// Custom JSON extractor that provides better error messages
///
/// This wrapper catches JSON deserialization errors (including validation
/// errors from custom deserializers) and runs `validator` rules on the
/// decoded value, formatting all failures as standardized JSON error
/// responses instead of plain text.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidationJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => {
                value
                    .validate()
                    .map_err(ValidationJsonRejection::Rules)?;
                Ok(ValidatedJson(value))
            }
            Err(rejection) => Err(ValidationJsonRejection::Body(rejection)),
        }
    }
}

/// Rejection type that formats JSON and validation errors as standardized responses
pub enum ValidationJsonRejection {
    Body(JsonRejection),
    Rules(validator::ValidationErrors),
}

impl IntoResponse for ValidationJsonRejection {
    fn into_response(self) -> Response {
        let (code, message) = match &self {
            ValidationJsonRejection::Body(rejection) => {
                let error_message = rejection.body_text();

                if let Some(msg) = tail_after(&error_message, "Invalid amount:") {
                    ("VALIDATION_INVALID_AMOUNT", format!("Invalid amount: {}", msg))
                } else if let Some(msg) = tail_after(&error_message, "Invalid multiplier:") {
                    (
                        "VALIDATION_INVALID_MULTIPLIER",
                        format!("Invalid multiplier: {}", msg),
                    )
                } else if let Some(field) = error_message
                    .split("missing field `")
                    .nth(1)
                    .and_then(|s| s.split('`').next())
                {
                    (
                        "VALIDATION_MISSING_FIELD",
                        format!("Missing required field: {}", field),
                    )
                } else {
                    (
                        "VALIDATION_INVALID_INPUT",
                        "Invalid request body".to_string(),
                    )
                }
            }
            ValidationJsonRejection::Rules(errors) => {
                let mut fields: Vec<&str> =
                    errors.field_errors().keys().copied().collect();
                fields.sort_unstable();
                (
                    "VALIDATION_INVALID_INPUT",
                    format!("Invalid value for field(s): {}", fields.join(", ")),
                )
            }
        };

        tracing::warn!(
            error_code = code,
            error_message = %message,
            "Request validation failed"
        );

        metrics::counter!("errors_total", "category" => "Validation", "code" => code)
            .increment(1);

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "category": "Validation",
            }
        }));

        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

// Extract the text after a custom-deserializer prefix, dropping serde's
// trailing location info.
fn tail_after<'a>(message: &'a str, prefix: &str) -> Option<&'a str> {
    message
        .split(prefix)
        .nth(1)
        .and_then(|s| s.split(" at line").next())
        .map(|s| s.trim())
}

/// Authenticated caller, resolved from an opaque bearer session token.
pub struct AuthUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = bearer_token(parts)?;

        let user_id = state
            .store
            .sessions()
            .resolve(&token)
            .await?
            .ok_or_else(|| AppError::invalid_session("Session expired or unknown"))?;

        let user = state
            .store
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::invalid_session("Session user no longer exists"))?;

        Ok(AuthUser(user))
    }
}

/// Authenticated caller holding the admin role.
pub struct AdminUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;

        if !user.role.is_admin() {
            return Err(AppError::forbidden("Admin role required"));
        }

        Ok(AdminUser(user))
    }
}

fn bearer_token(parts: &Parts) -> crate::errors::Result<String> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::unauthenticated("Missing Authorization header"))?
        .to_str()
        .map_err(|_| AppError::unauthenticated("Malformed Authorization header"))?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::unauthenticated("Expected a bearer token"))?
        .trim();

    if token.is_empty() {
        return Err(AppError::unauthenticated("Empty bearer token"));
    }

    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().uri("/me");
        if let Some(value) = value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        let parts = parts_with_auth(Some("Bearer abc123"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc123");
    }

    #[test]
    fn test_bearer_token_missing_header() {
        let parts = parts_with_auth(None);
        assert!(matches!(
            bearer_token(&parts),
            Err(AppError::Unauthenticated { .. })
        ));
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let parts = parts_with_auth(Some("Basic abc123"));
        assert!(bearer_token(&parts).is_err());
    }

    #[test]
    fn test_bearer_token_empty() {
        let parts = parts_with_auth(Some("Bearer   "));
        assert!(bearer_token(&parts).is_err());
    }

    #[test]
    fn test_tail_after_strips_location() {
        let msg = "Failed to deserialize the JSON body into the target type: \
                   Invalid amount: Amount out of range: 0 at line 1 column 20";
        assert_eq!(
            tail_after(msg, "Invalid amount:"),
            Some("Amount out of range: 0")
        );
    }
}
