//! Enrolment handlers.

use actix_web::http::StatusCode;
use actix_web::{delete, get, post, web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use crate::domain::{CourseId, Role};

use super::auth::AuthenticatedUser;
use super::state::HttpState;
use super::{success, ApiResult};

/// Enrol in a free course.
#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/enroll",
    params(("id" = Uuid, Path, description = "Course identifier")),
    responses(
        (status = 201, description = "Enrolled", body = crate::domain::Enrollment),
        (status = 400, description = "Paid course or already enrolled", body = super::ErrorEnvelope),
        (status = 404, description = "No such course", body = super::ErrorEnvelope),
    ),
    tag = "enrollments"
)]
#[post("/courses/{id}/enroll")]
pub async fn enroll(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    caller.require_any(&[Role::Student])?;
    let enrollment = state
        .enrollments
        .enroll_free(caller.user_id, CourseId::from_uuid(path.into_inner()))
        .await?;
    Ok(success(
        StatusCode::CREATED,
        json!({ "enrollment": enrollment }),
    ))
}

/// Leave a course.
#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}/enroll",
    params(("id" = Uuid, Path, description = "Course identifier")),
    responses(
        (status = 200, description = "Unenrolled"),
        (status = 404, description = "Not enrolled", body = super::ErrorEnvelope),
    ),
    tag = "enrollments"
)]
#[delete("/courses/{id}/enroll")]
pub async fn unenroll(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    caller.require_any(&[Role::Student])?;
    state
        .enrollments
        .unenroll(caller.user_id, CourseId::from_uuid(path.into_inner()))
        .await?;
    Ok(success(StatusCode::OK, json!({ "message": "Unenrolled" })))
}

/// The caller's enrolment records.
#[utoipa::path(
    get,
    path = "/api/v1/enrollments",
    responses((status = 200, description = "Enrolments for this student")),
    tag = "enrollments"
)]
#[get("/enrollments")]
pub async fn list_mine(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    caller.require_any(&[Role::Student])?;
    let enrollments = state
        .enrollments
        .enrollments_for_student(caller.user_id)
        .await?;
    Ok(success(
        StatusCode::OK,
        json!({ "enrollments": enrollments }),
    ))
}

/// How many students a course has.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/enrollments/count",
    params(("id" = Uuid, Path, description = "Course identifier")),
    responses((status = 200, description = "Enrolment count")),
    tag = "enrollments"
)]
#[get("/courses/{id}/enrollments/count")]
pub async fn count(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let count = state
        .enrollments
        .enrollment_count(CourseId::from_uuid(path.into_inner()))
        .await?;
    Ok(success(StatusCode::OK, json!({ "count": count })))
}
