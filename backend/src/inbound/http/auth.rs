//! Request authentication and role checks.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};

use crate::domain::{Error, Role, TokenKind, UserId};

use super::state::HttpState;

/// The authenticated caller, extracted from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: String,
    pub roles: Vec<Role>,
}

impl AuthenticatedUser {
    /// Require one of the given roles. Admins pass every check.
    pub fn require_any(&self, allowed: &[Role]) -> Result<(), Error> {
        if self.roles.contains(&Role::Admin)
            || self.roles.iter().any(|role| allowed.contains(role))
        {
            Ok(())
        } else {
            Err(Error::forbidden("Forbidden!"))
        }
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, Error> {
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| Error::internal("Application state missing"))?;

    let header = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| Error::unauthorized("No access token"))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::unauthorized("No access token"))?;

    let claims = state
        .tokens
        .verify(token, TokenKind::Access)
        .map_err(|_| Error::unauthorized("Invalid or expired access token"))?;

    Ok(AuthenticatedUser {
        user_id: UserId::from_uuid(claims.sub),
        email: claims.email,
        roles: claims.roles,
    })
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
