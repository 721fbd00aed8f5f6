use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing x-user-id header")]
    MissingActor,
    #[error("unknown acting user")]
    UnknownActor,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error("{0}")]
    Upstream(String),
    #[error("database failure: {0}")]
    Db(#[from] sqlx::Error),
    #[error("internal failure: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Constraint violations surface as client errors rather than a blanket
    /// 500: unique keys conflict, dangling references are unprocessable, and
    /// check failures are validation problems.
    fn db_error_status(err: &sqlx::Error) -> (StatusCode, &'static str) {
        if let sqlx::Error::Database(db_err) = err {
            return match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation => (StatusCode::CONFLICT, "conflict"),
                sqlx::error::ErrorKind::ForeignKeyViolation => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable")
                }
                sqlx::error::ErrorKind::CheckViolation | sqlx::error::ErrorKind::NotNullViolation => {
                    (StatusCode::BAD_REQUEST, "validation_failed")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            };
        }
        (StatusCode::INTERNAL_SERVER_ERROR, "internal")
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingActor | ApiError::UnknownActor => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Db(err) => Self::db_error_status(err).0,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingActor | ApiError::UnknownActor => "unauthorized",
            ApiError::NotFound(_) => "not_found",
            ApiError::Validation(_) => "validation_failed",
            ApiError::Conflict(_) => "conflict",
            ApiError::Unprocessable(_) => "unprocessable",
            ApiError::Upstream(_) => "upstream_failed",
            ApiError::Db(err) => Self::db_error_status(err).1,
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else if let ApiError::Db(_) = &self {
            // Constraint violations get a canned message; raw database
            // error text never reaches the client.
            match self.code() {
                "conflict" => "a row with these unique values already exists".to_string(),
                "unprocessable" => "a referenced row does not exist".to_string(),
                _ => "the request violates a data constraint".to_string(),
            }
        } else {
            self.to_string()
        };
        let body = Json(json!({ "error": { "code": self.code(), "message": message } }));
        (status, body).into_response()
    }
}

/// Reject a request body with a 400 unless `condition` holds.
pub fn require(condition: bool, message: &str) -> Result<(), ApiError> {
    if condition {
        Ok(())
    } else {
        Err(ApiError::Validation(message.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn statuses_map_to_the_documented_codes() {
        assert_eq!(ApiError::MissingActor.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound("company").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Validation("empty code".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict("not draft".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Unprocessable("no periods".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Upstream("google".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Db(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_message_names_the_entity() {
        assert_eq!(ApiError::NotFound("evaluation").to_string(), "evaluation not found");
    }

    #[test]
    fn require_produces_validation_errors() {
        assert!(require(true, "fine").is_ok());
        let err = require(false, "code must not be empty").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "code must not be empty");
    }
}
