use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json as RespJson, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Failure reported by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint (owner, e-mail) would be violated.
    #[error("{0} already exists")]
    Conflict(&'static str),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// One failed validation rule, shaped the way the client renders alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub msg: String,
    pub param: String,
}

impl FieldError {
    pub fn new(param: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            param: param.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    /// A single validation message not tied to a request field, e.g. a
    /// duplicate e-mail or bad credentials.
    pub fn rejected(msg: impl Into<String>) -> Self {
        ApiError::Validation(vec![FieldError::new("", msg)])
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Store(StoreError::Backend(_)) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(param, errs)| {
                errs.iter().map(move |e| {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", param));
                    FieldError::new(param.to_string(), msg)
                })
            })
            .collect();
        // field_errors() is a HashMap, urutkan supaya response stabil
        fields.sort_by(|a, b| a.param.cmp(&b.param));
        ApiError::Validation(fields)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::Validation(errors) => serde_json::json!({ "errors": errors }),
            ApiError::Store(StoreError::Backend(detail)) | ApiError::Internal(detail) => {
                error!("🚨 {}", detail);
                serde_json::json!({ "msg": "Server Error" })
            }
            ApiError::Upstream(detail) => {
                error!("🚨 upstream: {}", detail);
                serde_json::json!({ "msg": "Upstream service unavailable" })
            }
            other => serde_json::json!({ "msg": other.to_string() }),
        };

        (status, RespJson(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Payload {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        #[validate(email(message = "Please include a valid email"))]
        email: String,
    }

    #[test]
    fn status_codes() {
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::rejected("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Store(StoreError::Conflict("profile")).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Store(StoreError::Backend("down".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_errors_are_collected_and_sorted() {
        let payload = Payload {
            name: String::new(),
            email: "nope".into(),
        };
        let err = ApiError::from(payload.validate().unwrap_err());

        match err {
            ApiError::Validation(fields) => {
                assert_eq!(
                    fields,
                    vec![
                        FieldError::new("email", "Please include a valid email"),
                        FieldError::new("name", "Name is required"),
                    ]
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
