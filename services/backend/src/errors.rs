use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shared::errors::{ErrorCategory, ErrorCode};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("{message}")]
    Unauthenticated { code: ErrorCode, message: String },

    #[error("{0}")]
    Forbidden(String),

    #[error("{message}")]
    NotFound { code: ErrorCode, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient balance")]
    InsufficientFunds,

    #[error("{message}")]
    AlreadyProcessed { code: ErrorCode, message: String },

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        AppError::Unauthenticated {
            code: ErrorCode::AUTH_SESSION_REQUIRED,
            message: message.into(),
        }
    }

    pub fn invalid_session(message: impl Into<String>) -> Self {
        AppError::Unauthenticated {
            code: ErrorCode::AUTH_SESSION_INVALID,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        AppError::InvalidInput(message.into())
    }

    pub fn user_not_found(user_id: Uuid) -> Self {
        AppError::NotFound {
            code: ErrorCode::NOT_FOUND_USER,
            message: format!("User {} not found", user_id),
        }
    }

    pub fn round_not_found(round_id: Uuid) -> Self {
        AppError::NotFound {
            code: ErrorCode::NOT_FOUND_ROUND,
            message: format!("Round {} not found", round_id),
        }
    }

    pub fn bet_not_found(bet_id: Uuid) -> Self {
        AppError::NotFound {
            code: ErrorCode::NOT_FOUND_BET,
            message: format!("Bet {} not found", bet_id),
        }
    }

    pub fn request_not_found(request_id: Uuid) -> Self {
        AppError::NotFound {
            code: ErrorCode::NOT_FOUND_REQUEST,
            message: format!("Request {} not found", request_id),
        }
    }

    pub fn already_cashed_out(bet_id: Uuid) -> Self {
        AppError::AlreadyProcessed {
            code: ErrorCode::CONFLICT_ALREADY_CASHED_OUT,
            message: format!("Bet {} already cashed out", bet_id),
        }
    }

    pub fn round_finished(round_id: Uuid) -> Self {
        AppError::AlreadyProcessed {
            code: ErrorCode::CONFLICT_ROUND_FINISHED,
            message: format!("Round {} already finished", round_id),
        }
    }

    pub fn already_processed(message: impl Into<String>) -> Self {
        AppError::AlreadyProcessed {
            code: ErrorCode::CONFLICT_ALREADY_PROCESSED,
            message: message.into(),
        }
    }

    fn parts(&self) -> (ErrorCategory, ErrorCode, String) {
        match self {
            AppError::Redis(_) => (
                ErrorCategory::Internal,
                ErrorCode::INTERNAL_STORAGE,
                "Storage error".to_string(),
            ),
            AppError::Unauthenticated { code, message } => {
                (ErrorCategory::Unauthenticated, *code, message.clone())
            }
            AppError::Forbidden(message) => (
                ErrorCategory::Forbidden,
                ErrorCode::AUTH_ADMIN_REQUIRED,
                message.clone(),
            ),
            AppError::NotFound { code, message } => {
                (ErrorCategory::NotFound, *code, message.clone())
            }
            AppError::InvalidInput(message) => (
                ErrorCategory::Validation,
                ErrorCode::VALIDATION_INVALID_INPUT,
                message.clone(),
            ),
            AppError::InsufficientFunds => (
                ErrorCategory::Validation,
                ErrorCode::VALIDATION_INSUFFICIENT_BALANCE,
                "Insufficient balance".to_string(),
            ),
            AppError::AlreadyProcessed { code, message } => {
                (ErrorCategory::Conflict, *code, message.clone())
            }
            AppError::Internal(_) => (
                ErrorCategory::Internal,
                ErrorCode::INTERNAL_UNEXPECTED,
                "Internal server error".to_string(),
            ),
        }
    }
}

impl From<shared::ValidationError> for AppError {
    fn from(err: shared::ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (category, code, message) = self.parts();

        match category.log_level() {
            "error" => tracing::error!(code = code.as_str(), "{:?}", self),
            "warn" => tracing::warn!(code = code.as_str(), error = %message, "Request failed"),
            _ => tracing::info!(code = code.as_str(), error = %message, "Request refused"),
        }

        metrics::counter!(
            "errors_total",
            "category" => category.to_string(),
            "code" => code.as_str()
        )
        .increment(1);

        let status = StatusCode::from_u16(category.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = Json(json!({
            "error": {
                "code": code.as_str(),
                "message": message,
                "category": category.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::InsufficientFunds, StatusCode::BAD_REQUEST),
            (
                AppError::unauthenticated("no session"),
                StatusCode::UNAUTHORIZED,
            ),
            (AppError::forbidden("admin only"), StatusCode::FORBIDDEN),
            (
                AppError::bet_not_found(Uuid::nil()),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::already_cashed_out(Uuid::nil()),
                StatusCode::CONFLICT,
            ),
            (
                AppError::invalid_input("amount required"),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_validation_error_conversion() {
        let err: AppError = shared::ValidationError::AmountOverflow.into();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
