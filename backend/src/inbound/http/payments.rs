//! Payment checkout and verification handlers.

use actix_web::http::StatusCode;
use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{CourseId, OrderId, Role, VerificationOutcome, VerificationRequest};

use super::auth::AuthenticatedUser;
use super::state::HttpState;
use super::{success, ApiResult};

/// Open a gateway order for a paid course.
#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/checkout",
    params(("id" = Uuid, Path, description = "Course identifier")),
    responses(
        (status = 201, description = "Order created"),
        (status = 400, description = "Free course or already enrolled", body = super::ErrorEnvelope),
        (status = 404, description = "No such course", body = super::ErrorEnvelope),
        (status = 503, description = "Payment gateway unavailable", body = super::ErrorEnvelope),
    ),
    tag = "payments"
)]
#[post("/courses/{id}/checkout")]
pub async fn checkout(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    caller.require_any(&[Role::Student])?;
    let order = state
        .enrollments
        .create_payment_order(caller.user_id, CourseId::from_uuid(path.into_inner()))
        .await?;
    Ok(success(
        StatusCode::CREATED,
        json!({
            "orderId": order.order_id,
            "amount": order.amount_minor_units,
            "currency": order.currency,
        }),
    ))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub course_id: Uuid,
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// Verify a gateway payment and enrol the student.
///
/// Safe to retry: re-verifying a settled order reports success without
/// creating anything.
#[utoipa::path(
    post,
    path = "/api/v1/payments/verify",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Payment verified and enrolment ensured"),
        (status = 400, description = "Bad signature or failed payment", body = super::ErrorEnvelope),
        (status = 404, description = "No payment record for this order", body = super::ErrorEnvelope),
    ),
    tag = "payments"
)]
#[post("/payments/verify")]
pub async fn verify(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    body: web::Json<VerifyPaymentRequest>,
) -> ApiResult<HttpResponse> {
    caller.require_any(&[Role::Student])?;
    let body = body.into_inner();
    let outcome = state
        .enrollments
        .verify_payment(VerificationRequest {
            student: caller.user_id,
            course_id: CourseId::from_uuid(body.course_id),
            order_id: OrderId::new(body.order_id)?,
            payment_id: body.payment_id,
            signature: body.signature,
        })
        .await?;

    let data = match outcome {
        VerificationOutcome::AlreadyVerified => {
            json!({ "message": "Payment already verified" })
        }
        VerificationOutcome::AlreadyEnrolled => {
            json!({ "message": "Payment verified; already enrolled" })
        }
        VerificationOutcome::Enrolled(enrollment) => {
            json!({ "message": "Payment verified", "enrollment": enrollment })
        }
    };
    Ok(success(StatusCode::OK, data))
}
