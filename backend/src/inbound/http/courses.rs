//! Course catalogue handlers.

use actix_web::http::StatusCode;
use actix_web::{delete, get, post, put, web, HttpResponse};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{
    CourseId, CourseUpdate, Error, MediaUpload, NewCourse, NewVideo, PageNumber, Price, Role,
};

use super::auth::AuthenticatedUser;
use super::state::HttpState;
use super::{success, ApiResult};

/// Pagination query shared by the listing endpoints.
#[derive(Debug, Deserialize, IntoParams)]
pub struct PageQuery {
    /// 1-based page number; defaults to the first page.
    pub page: Option<u32>,
}

impl PageQuery {
    pub(super) fn page(&self) -> PageNumber {
        self.page.map_or(PageNumber::FIRST, PageNumber::new)
    }
}

/// A base64-encoded file in a JSON request body.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaUploadDto {
    pub filename: String,
    /// File contents, base64 encoded.
    pub data: String,
}

impl MediaUploadDto {
    fn decode(self, field: &str) -> Result<MediaUpload, Error> {
        let bytes = BASE64
            .decode(self.data.as_bytes())
            .map_err(|_| Error::invalid_request(format!("{field} is not valid base64")))?;
        Ok(MediaUpload {
            filename: self.filename,
            bytes,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoDto {
    pub title: String,
    pub file: MediaUploadDto,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: String,
    /// Price in major currency units; zero publishes a free course.
    pub price: f64,
    pub thumbnail: MediaUploadDto,
    #[serde(default)]
    pub videos: Vec<VideoDto>,
    /// Payout account for a paid course; persisted to the instructor.
    pub payout_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub thumbnail: Option<MediaUploadDto>,
    #[serde(default)]
    pub videos: Vec<VideoDto>,
}

fn decode_videos(videos: Vec<VideoDto>) -> Result<Vec<NewVideo>, Error> {
    videos
        .into_iter()
        .map(|video| {
            Ok(NewVideo {
                title: video.title,
                upload: video.file.decode("video")?,
            })
        })
        .collect()
}

/// One page of the public catalogue.
#[utoipa::path(
    get,
    path = "/api/v1/courses",
    params(PageQuery),
    responses((status = 200, description = "Courses, newest first")),
    tag = "courses"
)]
#[get("/courses")]
pub async fn list(
    state: web::Data<HttpState>,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let courses = state.catalogue.list(query.page()).await?;
    Ok(success(StatusCode::OK, json!({ "courses": courses })))
}

/// The authenticated instructor's own courses.
#[utoipa::path(
    get,
    path = "/api/v1/courses/mine",
    params(PageQuery),
    responses(
        (status = 200, description = "Courses by this instructor"),
        (status = 403, description = "Not an instructor", body = super::ErrorEnvelope),
    ),
    tag = "courses"
)]
#[get("/courses/mine")]
pub async fn mine(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    caller.require_any(&[Role::Instructor])?;
    let courses = state
        .catalogue
        .instructor_courses(caller.user_id, query.page())
        .await?;
    Ok(success(StatusCode::OK, json!({ "courses": courses })))
}

/// The authenticated student's enrolled courses.
#[utoipa::path(
    get,
    path = "/api/v1/courses/enrolled",
    params(PageQuery),
    responses(
        (status = 200, description = "Courses this student is enrolled in"),
        (status = 403, description = "Not a student", body = super::ErrorEnvelope),
    ),
    tag = "courses"
)]
#[get("/courses/enrolled")]
pub async fn enrolled(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    caller.require_any(&[Role::Student])?;
    let courses = state
        .catalogue
        .student_courses(caller.user_id, query.page())
        .await?;
    Ok(success(StatusCode::OK, json!({ "courses": courses })))
}

/// Course detail with its enrolment count.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    params(("id" = Uuid, Path, description = "Course identifier")),
    responses(
        (status = 200, description = "Course detail", body = crate::domain::CourseDetail),
        (status = 404, description = "No such course", body = super::ErrorEnvelope),
    ),
    tag = "courses"
)]
#[get("/courses/{id}")]
pub async fn detail(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let course = state
        .catalogue
        .detail(CourseId::from_uuid(path.into_inner()))
        .await?;
    Ok(success(StatusCode::OK, json!({ "course": course })))
}

/// Publish a new course.
#[utoipa::path(
    post,
    path = "/api/v1/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = crate::domain::Course),
        (status = 400, description = "Validation failed or duplicate title", body = super::ErrorEnvelope),
        (status = 403, description = "Not an instructor", body = super::ErrorEnvelope),
    ),
    tag = "courses"
)]
#[post("/courses")]
pub async fn create(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    body: web::Json<CreateCourseRequest>,
) -> ApiResult<HttpResponse> {
    caller.require_any(&[Role::Instructor])?;
    let body = body.into_inner();
    let input = NewCourse {
        title: body.title,
        description: body.description,
        price: Price::from_major_units(body.price)?,
        thumbnail: body.thumbnail.decode("thumbnail")?,
        videos: decode_videos(body.videos)?,
        payout_id: body.payout_id,
    };
    let course = state.catalogue.create(caller.user_id, input).await?;
    Ok(success(StatusCode::CREATED, json!({ "course": course })))
}

/// Update an owned course.
#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    params(("id" = Uuid, Path, description = "Course identifier")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = crate::domain::Course),
        (status = 403, description = "Not the owner", body = super::ErrorEnvelope),
        (status = 404, description = "No such course", body = super::ErrorEnvelope),
    ),
    tag = "courses"
)]
#[put("/courses/{id}")]
pub async fn update(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCourseRequest>,
) -> ApiResult<HttpResponse> {
    caller.require_any(&[Role::Instructor])?;
    let body = body.into_inner();
    let update = CourseUpdate {
        title: body.title,
        description: body.description,
        price: body.price.map(Price::from_major_units).transpose()?,
        new_thumbnail: body
            .thumbnail
            .map(|dto| dto.decode("thumbnail"))
            .transpose()?,
        new_videos: decode_videos(body.videos)?,
    };
    let course = state
        .catalogue
        .update(caller.user_id, CourseId::from_uuid(path.into_inner()), update)
        .await?;
    Ok(success(StatusCode::OK, json!({ "course": course })))
}

/// Delete an owned course and its media.
#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    params(("id" = Uuid, Path, description = "Course identifier")),
    responses(
        (status = 200, description = "Course deleted"),
        (status = 403, description = "Not the owner", body = super::ErrorEnvelope),
        (status = 404, description = "No such course", body = super::ErrorEnvelope),
    ),
    tag = "courses"
)]
#[delete("/courses/{id}")]
pub async fn remove(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    caller.require_any(&[Role::Instructor])?;
    state
        .catalogue
        .delete(caller.user_id, CourseId::from_uuid(path.into_inner()))
        .await?;
    Ok(success(
        StatusCode::OK,
        json!({ "message": "Course deleted" }),
    ))
}

/// Remove one lecture video from an owned course.
#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}/videos/{videoId}",
    params(
        ("id" = Uuid, Path, description = "Course identifier"),
        ("videoId" = Uuid, Path, description = "Video identifier"),
    ),
    responses(
        (status = 200, description = "Video removed", body = crate::domain::Course),
        (status = 404, description = "No such course or video", body = super::ErrorEnvelope),
    ),
    tag = "courses"
)]
#[delete("/courses/{id}/videos/{video_id}")]
pub async fn remove_video(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
) -> ApiResult<HttpResponse> {
    caller.require_any(&[Role::Instructor])?;
    let (course_id, video_id) = path.into_inner();
    let course = state
        .catalogue
        .remove_video(caller.user_id, CourseId::from_uuid(course_id), video_id)
        .await?;
    Ok(success(StatusCode::OK, json!({ "course": course })))
}
