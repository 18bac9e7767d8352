//! HTTP adapter: handlers, authentication, and the response envelope.
//!
//! Every success body is `{"status": "success", "data": ...}` and every
//! failure `{"status": "error", "message": ...}`; clients branch on
//! `status` alone.

pub mod accounts;
pub mod auth;
pub mod courses;
pub mod enrollments;
pub mod error;
pub mod payments;
pub mod rate_limit;
pub mod state;
pub mod tickets;

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::json;

pub use auth::AuthenticatedUser;
pub use error::ErrorEnvelope;
pub use rate_limit::RateLimiter;
pub use state::HttpState;

/// Result alias for handlers; failures render through
/// [`error`]'s `ResponseError` mapping.
pub type ApiResult<T> = Result<T, crate::domain::Error>;

/// Wrap `data` in the success envelope.
pub(crate) fn success(status: StatusCode, data: impl Serialize) -> HttpResponse {
    HttpResponse::build(status).json(json!({
        "status": "success",
        "data": data,
    }))
}
