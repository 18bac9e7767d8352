//! Role-change ticket handlers.

use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Error, Role, TicketId, TicketResolution};

use super::auth::AuthenticatedUser;
use super::courses::PageQuery;
use super::state::HttpState;
use super::{success, ApiResult};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub requested_role: Role,
}

/// Request an additional role.
#[utoipa::path(
    post,
    path = "/api/v1/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket opened", body = crate::domain::Ticket),
        (status = 400, description = "Role held or ticket already open", body = super::ErrorEnvelope),
    ),
    tag = "tickets"
)]
#[post("/tickets")]
pub async fn create(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    body: web::Json<CreateTicketRequest>,
) -> ApiResult<HttpResponse> {
    let ticket = state
        .tickets
        .create(caller.user_id, body.requested_role)
        .await?;
    Ok(success(StatusCode::CREATED, json!({ "ticket": ticket })))
}

/// The caller's open ticket, if any.
#[utoipa::path(
    get,
    path = "/api/v1/tickets/mine",
    responses((status = 200, description = "Open ticket or null")),
    tag = "tickets"
)]
#[get("/tickets/mine")]
pub async fn mine(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let ticket = state.tickets.my_open_ticket(caller.user_id).await?;
    Ok(success(StatusCode::OK, json!({ "ticket": ticket })))
}

/// Open tickets awaiting review, oldest first. Admin only.
#[utoipa::path(
    get,
    path = "/api/v1/tickets",
    params(PageQuery),
    responses(
        (status = 200, description = "Open tickets with pagination metadata"),
        (status = 403, description = "Not an admin", body = super::ErrorEnvelope),
    ),
    tag = "tickets"
)]
#[get("/tickets")]
pub async fn list_open(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    caller.require_any(&[Role::Admin])?;
    let page = state.tickets.open_tickets(query.page()).await?;
    Ok(success(
        StatusCode::OK,
        json!({
            "page": page.page,
            "limit": page.limit,
            "total": page.total,
            "totalPages": page.total_pages,
            "tickets": page.tickets,
        }),
    ))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolveTicketRequest {
    /// `"approved"` or `"rejected"`.
    pub resolution: String,
}

/// Approve or reject a ticket. Admin only; admins cannot resolve their own.
#[utoipa::path(
    post,
    path = "/api/v1/tickets/{id}/resolve",
    params(("id" = Uuid, Path, description = "Ticket identifier")),
    request_body = ResolveTicketRequest,
    responses(
        (status = 200, description = "Ticket resolved", body = crate::domain::Ticket),
        (status = 400, description = "Already processed", body = super::ErrorEnvelope),
        (status = 403, description = "Not an admin or own ticket", body = super::ErrorEnvelope),
        (status = 404, description = "No such ticket", body = super::ErrorEnvelope),
    ),
    tag = "tickets"
)]
#[post("/tickets/{id}/resolve")]
pub async fn resolve(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<ResolveTicketRequest>,
) -> ApiResult<HttpResponse> {
    caller.require_any(&[Role::Admin])?;
    let resolution = TicketResolution::parse(&body.resolution)
        .ok_or_else(|| Error::invalid_request("Resolution must be approved or rejected"))?;
    let ticket = state
        .tickets
        .resolve(
            caller.user_id,
            TicketId::from_uuid(path.into_inner()),
            resolution,
        )
        .await?;
    Ok(success(StatusCode::OK, json!({ "ticket": ticket })))
}
