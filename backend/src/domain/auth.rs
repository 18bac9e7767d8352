//! Token issuing and verification.
//!
//! Three token kinds share one HMAC secret and differ only in lifetime and
//! the `kind` claim: short-lived access tokens, week-long refresh tokens,
//! and password-reset tokens. Verification always checks the kind so a
//! refresh token can never authorise an API call.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::Error;
use super::user::Role;

/// Lifetime of an access token.
pub const ACCESS_TTL_MINUTES: i64 = 15;
/// Lifetime of a refresh token.
pub const REFRESH_TTL_DAYS: i64 = 7;
/// Lifetime of a password-reset token.
pub const RESET_TTL_MINUTES: i64 = 15;

/// What a token authorises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
    Reset,
}

/// Claims carried by every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's identifier.
    pub sub: Uuid,
    pub email: String,
    pub roles: Vec<Role>,
    pub kind: TokenKind,
    pub exp: i64,
    pub iat: i64,
}

/// Issues and verifies HS256 tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenIssuer {
    /// Build an issuer from the shared secret.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token of the given kind for a user.
    pub fn issue(
        &self,
        kind: TokenKind,
        user_id: Uuid,
        email: &str,
        roles: Vec<Role>,
    ) -> Result<String, Error> {
        let now = Utc::now();
        let lifetime = match kind {
            TokenKind::Access => Duration::minutes(ACCESS_TTL_MINUTES),
            TokenKind::Refresh => Duration::days(REFRESH_TTL_DAYS),
            TokenKind::Reset => Duration::minutes(RESET_TTL_MINUTES),
        };
        let claims = Claims {
            sub: user_id,
            email: email.to_owned(),
            roles,
            kind,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| Error::internal(format!("Could not sign token: {err}")))
    }

    /// Verify a token and require it to be of `expected` kind.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, Error> {
        let validation = Validation::new(Algorithm::HS256);
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| Error::unauthorized("Invalid or expired token"))?;
        if data.claims.kind != expected {
            return Err(Error::unauthorized("Invalid or expired token"));
        }
        Ok(data.claims)
    }
}
