//! OpenAPI document assembled from the handler annotations.

use utoipa::OpenApi;

use crate::domain;
use crate::inbound::http;

/// The API document served at `/api/v1/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Learning Platform API",
        description = "Course catalogue, enrolment, payments, and role management."
    ),
    paths(
        http::accounts::register,
        http::accounts::verify_registration,
        http::accounts::login,
        http::accounts::refresh,
        http::accounts::logout,
        http::accounts::forgot_password,
        http::accounts::reset_password,
        http::accounts::select_role,
        http::accounts::me,
        http::courses::list,
        http::courses::mine,
        http::courses::enrolled,
        http::courses::detail,
        http::courses::create,
        http::courses::update,
        http::courses::remove,
        http::courses::remove_video,
        http::enrollments::enroll,
        http::enrollments::unenroll,
        http::enrollments::list_mine,
        http::enrollments::count,
        http::payments::checkout,
        http::payments::verify,
        http::tickets::create,
        http::tickets::mine,
        http::tickets::list_open,
        http::tickets::resolve,
    ),
    components(schemas(
        domain::Course,
        domain::CourseDetail,
        domain::Enrollment,
        domain::Ticket,
        domain::UserProfile,
        domain::ErrorCode,
        http::ErrorEnvelope,
    )),
    tags(
        (name = "auth", description = "Registration and authentication"),
        (name = "users", description = "Profiles and role selection"),
        (name = "courses", description = "Course catalogue"),
        (name = "enrollments", description = "Enrolment management"),
        (name = "payments", description = "Checkout and verification"),
        (name = "tickets", description = "Role-change tickets"),
    )
)]
pub struct ApiDoc;
