//! Account and authentication handlers.

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::auth::REFRESH_TTL_DAYS;
use crate::domain::{Error, Role};

use super::auth::AuthenticatedUser;
use super::state::HttpState;
use super::{success, ApiResult};

/// Name of the refresh-token cookie.
const REFRESH_COOKIE: &str = "refreshToken";

fn refresh_cookie(token: String) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE, token)
        .path("/api/v1/auth")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(CookieDuration::days(REFRESH_TTL_DAYS))
        .finish()
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Start registration and mail a one-time code.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Verification code sent"),
        (status = 400, description = "Validation failed", body = super::ErrorEnvelope),
    ),
    tag = "auth"
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    body: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    state
        .accounts
        .register_init(&body.name, &body.email, &body.password)
        .await?;
    Ok(success(
        StatusCode::OK,
        json!({ "message": "Verification code sent to your email" }),
    ))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRegistrationRequest {
    pub email: String,
    pub otp: String,
}

/// Confirm the one-time code and create the account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register/verify",
    request_body = VerifyRegistrationRequest,
    responses(
        (status = 201, description = "Account created"),
        (status = 400, description = "Incorrect code", body = super::ErrorEnvelope),
        (status = 404, description = "Registration expired", body = super::ErrorEnvelope),
    ),
    tag = "auth"
)]
#[post("/auth/register/verify")]
pub async fn verify_registration(
    state: web::Data<HttpState>,
    body: web::Json<VerifyRegistrationRequest>,
) -> ApiResult<HttpResponse> {
    let (profile, tokens) = state.accounts.register_verify(&body.email, &body.otp).await?;
    let mut response = success(
        StatusCode::CREATED,
        json!({ "user": profile, "accessToken": tokens.access_token }),
    );
    response
        .add_cookie(&refresh_cookie(tokens.refresh_token))
        .map_err(|err| Error::internal(format!("Could not set cookie: {err}")))?;
    Ok(response)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Authenticate with email and password.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in"),
        (status = 401, description = "Incorrect password", body = super::ErrorEnvelope),
        (status = 404, description = "Unknown email", body = super::ErrorEnvelope),
    ),
    tag = "auth"
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    body: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let (profile, tokens) = state.accounts.login(&body.email, &body.password).await?;
    let mut response = success(
        StatusCode::OK,
        json!({ "user": profile, "accessToken": tokens.access_token }),
    );
    response
        .add_cookie(&refresh_cookie(tokens.refresh_token))
        .map_err(|err| Error::internal(format!("Could not set cookie: {err}")))?;
    Ok(response)
}

/// Exchange the refresh cookie for a fresh access token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    responses(
        (status = 200, description = "New access token issued"),
        (status = 401, description = "Missing or invalid refresh token", body = super::ErrorEnvelope),
    ),
    tag = "auth"
)]
#[post("/auth/refresh")]
pub async fn refresh(state: web::Data<HttpState>, req: HttpRequest) -> ApiResult<HttpResponse> {
    let cookie = req
        .cookie(REFRESH_COOKIE)
        .ok_or_else(|| Error::unauthorized("No refresh token"))?;
    let access_token = state.accounts.refresh(cookie.value()).await?;
    Ok(success(
        StatusCode::OK,
        json!({ "accessToken": access_token }),
    ))
}

/// Clear the refresh cookie.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses((status = 200, description = "Signed out")),
    tag = "auth"
)]
#[post("/auth/logout")]
pub async fn logout() -> ApiResult<HttpResponse> {
    let mut expired = refresh_cookie(String::new());
    expired.make_removal();
    let mut response = success(StatusCode::OK, json!({ "message": "Signed out" }));
    response
        .add_cookie(&expired)
        .map_err(|err| Error::internal(format!("Could not clear cookie: {err}")))?;
    Ok(response)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request a password-reset link.
///
/// The response never reveals whether the email has an account, and the
/// endpoint is rate limited per email address.
#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link sent if the account exists"),
        (status = 429, description = "Too many requests", body = super::ErrorEnvelope),
    ),
    tag = "auth"
)]
#[post("/auth/forgot-password")]
pub async fn forgot_password(
    state: web::Data<HttpState>,
    body: web::Json<ForgotPasswordRequest>,
) -> ApiResult<HttpResponse> {
    state
        .rate_limiter
        .check(&format!("forgot-password:{}", body.email.to_lowercase()))
        .await?;
    let message = state.accounts.forgot_password(&body.email).await?;
    Ok(success(StatusCode::OK, json!({ "message": message })))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Set a new password with a reset token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated"),
        (status = 401, description = "Invalid or expired token", body = super::ErrorEnvelope),
    ),
    tag = "auth"
)]
#[post("/auth/reset-password")]
pub async fn reset_password(
    state: web::Data<HttpState>,
    body: web::Json<ResetPasswordRequest>,
) -> ApiResult<HttpResponse> {
    state
        .accounts
        .reset_password(&body.token, &body.new_password)
        .await?;
    Ok(success(
        StatusCode::OK,
        json!({ "message": "Password updated" }),
    ))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectRoleRequest {
    pub role: Role,
}

/// Choose the account's primary role.
#[utoipa::path(
    post,
    path = "/api/v1/users/role",
    request_body = SelectRoleRequest,
    responses(
        (status = 200, description = "Role selected"),
        (status = 400, description = "Role not selectable", body = super::ErrorEnvelope),
    ),
    tag = "users"
)]
#[post("/users/role")]
pub async fn select_role(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    body: web::Json<SelectRoleRequest>,
) -> ApiResult<HttpResponse> {
    let profile = state.accounts.select_role(caller.user_id, body.role).await?;
    Ok(success(StatusCode::OK, json!({ "user": profile })))
}

/// The caller's own profile.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Profile", body = crate::domain::UserProfile),
        (status = 401, description = "Not authenticated", body = super::ErrorEnvelope),
    ),
    tag = "users"
)]
#[get("/users/me")]
pub async fn me(state: web::Data<HttpState>, caller: AuthenticatedUser) -> ApiResult<HttpResponse> {
    let profile = state.accounts.profile(caller.user_id).await?;
    Ok(success(StatusCode::OK, json!({ "user": profile })))
}
