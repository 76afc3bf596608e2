/// Shared error vocabulary for the crash betting backend
///
/// Design Philosophy:
/// - Standardized error codes for consistent error handling at the API edge
/// - Categorized by error domain, each category mapping to one HTTP status
/// - Error codes follow pattern: <CATEGORY>_<SPECIFIC>
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error categories that map to HTTP status codes and logging severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Validation errors (400 Bad Request)
    /// Client provided invalid input
    Validation,

    /// Missing or invalid session (401 Unauthorized)
    Unauthenticated,

    /// Authenticated but lacking the required role (403 Forbidden)
    Forbidden,

    /// Resource not found (404 Not Found)
    NotFound,

    /// Operation already applied; state transition refused (409 Conflict)
    Conflict,

    /// Internal service errors (500 Internal Server Error)
    /// Unexpected failures, storage issues, programming errors
    Internal,
}

impl ErrorCategory {
    /// Map error category to HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCategory::Validation => 400,
            ErrorCategory::Unauthenticated => 401,
            ErrorCategory::Forbidden => 403,
            ErrorCategory::NotFound => 404,
            ErrorCategory::Conflict => 409,
            ErrorCategory::Internal => 500,
        }
    }

    /// Map error category to log level
    pub fn log_level(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "warn",
            ErrorCategory::Unauthenticated => "info",
            ErrorCategory::Forbidden => "warn",
            ErrorCategory::NotFound => "info",
            ErrorCategory::Conflict => "info",
            ErrorCategory::Internal => "error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Validation => "Validation",
            ErrorCategory::Unauthenticated => "Unauthenticated",
            ErrorCategory::Forbidden => "Forbidden",
            ErrorCategory::NotFound => "NotFound",
            ErrorCategory::Conflict => "Conflict",
            ErrorCategory::Internal => "Internal",
        };
        write!(f, "{}", name)
    }
}

/// Standard error codes used across the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    // Validation errors
    pub const VALIDATION_INVALID_INPUT: ErrorCode = ErrorCode("VALIDATION_INVALID_INPUT");
    pub const VALIDATION_MISSING_FIELD: ErrorCode = ErrorCode("VALIDATION_MISSING_FIELD");
    pub const VALIDATION_INVALID_AMOUNT: ErrorCode = ErrorCode("VALIDATION_INVALID_AMOUNT");
    pub const VALIDATION_INVALID_MULTIPLIER: ErrorCode =
        ErrorCode("VALIDATION_INVALID_MULTIPLIER");
    pub const VALIDATION_INSUFFICIENT_BALANCE: ErrorCode =
        ErrorCode("VALIDATION_INSUFFICIENT_BALANCE");

    // Authentication/authorization errors
    pub const AUTH_SESSION_REQUIRED: ErrorCode = ErrorCode("AUTH_SESSION_REQUIRED");
    pub const AUTH_SESSION_INVALID: ErrorCode = ErrorCode("AUTH_SESSION_INVALID");
    pub const AUTH_ADMIN_REQUIRED: ErrorCode = ErrorCode("AUTH_ADMIN_REQUIRED");

    // Resource errors
    pub const NOT_FOUND_USER: ErrorCode = ErrorCode("NOT_FOUND_USER");
    pub const NOT_FOUND_ROUND: ErrorCode = ErrorCode("NOT_FOUND_ROUND");
    pub const NOT_FOUND_BET: ErrorCode = ErrorCode("NOT_FOUND_BET");
    pub const NOT_FOUND_REQUEST: ErrorCode = ErrorCode("NOT_FOUND_REQUEST");

    // Conflict errors
    pub const CONFLICT_ALREADY_CASHED_OUT: ErrorCode =
        ErrorCode("CONFLICT_ALREADY_CASHED_OUT");
    pub const CONFLICT_ROUND_FINISHED: ErrorCode = ErrorCode("CONFLICT_ROUND_FINISHED");
    pub const CONFLICT_ALREADY_PROCESSED: ErrorCode = ErrorCode("CONFLICT_ALREADY_PROCESSED");

    // Internal errors
    pub const INTERNAL_UNEXPECTED: ErrorCode = ErrorCode("INTERNAL_UNEXPECTED");
    pub const INTERNAL_STORAGE: ErrorCode = ErrorCode("INTERNAL_STORAGE");

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_status_codes() {
        assert_eq!(ErrorCategory::Validation.status_code(), 400);
        assert_eq!(ErrorCategory::Unauthenticated.status_code(), 401);
        assert_eq!(ErrorCategory::Forbidden.status_code(), 403);
        assert_eq!(ErrorCategory::NotFound.status_code(), 404);
        assert_eq!(ErrorCategory::Conflict.status_code(), 409);
        assert_eq!(ErrorCategory::Internal.status_code(), 500);
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Conflict.to_string(), "Conflict");
        assert_eq!(ErrorCategory::NotFound.to_string(), "NotFound");
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(
            ErrorCode::CONFLICT_ALREADY_PROCESSED.to_string(),
            "CONFLICT_ALREADY_PROCESSED"
        );
    }
}
