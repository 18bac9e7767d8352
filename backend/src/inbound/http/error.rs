//! HTTP mapping for domain errors.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Error, ErrorCode};

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    /// Always `"error"`.
    pub status: &'static str,
    pub message: String,
}

impl ErrorEnvelope {
    fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self.code() {
            ErrorCode::InvalidRequest
            | ErrorCode::Conflict
            | ErrorCode::InvalidState
            | ErrorCode::InvalidSignature => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::Upstream => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Internal details stay in the logs.
        let message = if self.code() == ErrorCode::InternalError {
            tracing::error!(error = %self, "request failed internally");
            "Internal server error".to_owned()
        } else {
            self.message().to_owned()
        };
        HttpResponse::build(self.status_code()).json(ErrorEnvelope::new(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Error::invalid_request("x"), StatusCode::BAD_REQUEST)]
    #[case(Error::conflict("x"), StatusCode::BAD_REQUEST)]
    #[case(Error::invalid_state("x"), StatusCode::BAD_REQUEST)]
    #[case(Error::invalid_signature("x"), StatusCode::BAD_REQUEST)]
    #[case(Error::unauthorized("x"), StatusCode::UNAUTHORIZED)]
    #[case(Error::forbidden("x"), StatusCode::FORBIDDEN)]
    #[case(Error::not_found("x"), StatusCode::NOT_FOUND)]
    #[case(Error::rate_limited("x"), StatusCode::TOO_MANY_REQUESTS)]
    #[case(Error::upstream("x"), StatusCode::SERVICE_UNAVAILABLE)]
    #[case(Error::internal("x"), StatusCode::INTERNAL_SERVER_ERROR)]
    fn status_mapping(#[case] err: Error, #[case] expected: StatusCode) {
        assert_eq!(err.status_code(), expected);
    }

    #[test]
    fn internal_message_is_redacted() {
        let response = Error::internal("connection string leaked").error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
