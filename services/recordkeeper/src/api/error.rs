//! API error type and constructors.
//!
//! Every handler returns [`ApiError`] so error bodies share one shape:
//! a stable `code`, a human-readable `message` and an optional request id.
//! Internal failures are logged here and answered with a generic message.
use crate::api::types::ErrorResponse;
use crate::service::ServiceError;
use crate::store::StoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Structured API error returned by handlers.
///
/// # Example
/// ```rust
/// use axum::http::StatusCode;
/// use recordkeeper::api::error::api_conflict;
///
/// let err = api_conflict("report_exists", "report already exists");
/// assert_eq!(err.status, StatusCode::CONFLICT);
/// ```
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn api_error(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        },
    }
}

/// 404 with code `not_found`.
pub fn api_not_found(message: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, "not_found", message)
}

/// 409 with a caller-chosen conflict code.
pub fn api_conflict(code: &str, message: &str) -> ApiError {
    api_error(StatusCode::CONFLICT, code, message)
}

/// 500 for a store failure. The store error is logged, never returned.
pub fn api_internal(message: &str, err: &StoreError) -> ApiError {
    tracing::error!(error = ?err, "recordkeeper storage error");
    api_internal_message(message)
}

pub fn api_internal_message(message: &str) -> ApiError {
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

pub fn api_forbidden(message: &str) -> ApiError {
    api_error(StatusCode::FORBIDDEN, "forbidden", message)
}

/// 400 with code `validation_error`, used for malformed or out-of-range input.
pub fn api_validation_error(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "validation_error", message)
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::CallerNotFound => api_not_found("caller not found"),
            ServiceError::Forbidden(reason) => {
                api_forbidden(&format!("not allowed: {}", reason.as_str()))
            }
            ServiceError::Conflict(kind) => api_conflict(kind.code(), kind.message()),
            ServiceError::Store(err) => api_internal("internal storage failure", &err),
            ServiceError::Credential(err) => {
                tracing::error!(error = %err, "recordkeeper credential error");
                api_internal_message("internal credential failure")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ConflictKind;
    use roster_authz::{DenyReason, Rank};

    #[test]
    fn helpers_build_expected_codes() {
        let not_found = api_not_found("missing");
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.body.code, "not_found");

        let conflict = api_conflict("officer_exists", "conflict");
        assert_eq!(conflict.status, StatusCode::CONFLICT);
        assert_eq!(conflict.body.code, "officer_exists");

        let forbidden = api_forbidden("nope");
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
        assert_eq!(forbidden.body.code, "forbidden");

        let validation = api_validation_error("bad");
        assert_eq!(validation.status, StatusCode::BAD_REQUEST);
        assert_eq!(validation.body.code, "validation_error");
    }

    #[test]
    fn service_errors_map_to_statuses() {
        let err: ApiError = ServiceError::CallerNotFound.into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err: ApiError = ServiceError::Forbidden(DenyReason::BelowThreshold {
            required: Rank::SubCommand,
            actual: Rank::Pilot,
        })
        .into();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let err: ApiError = ServiceError::Conflict(ConflictKind::ReportNotFound).into();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.body.code, "report_not_found");
    }

    #[test]
    fn store_failures_hide_details() {
        let err: ApiError =
            ServiceError::Store(StoreError::Integrity("officer 42 missing".into())).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body.code, "internal");
        assert!(!err.body.message.contains("42"));
    }
}
