//! Account workflows: OTP registration, login, token refresh, password
//! reset, role selection, and the cached profile.
//!
//! Pending registrations live only in the cache under
//! `register:otp:<email>`, so this is the one flow where a cache failure
//! is an error rather than a degradation.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::auth::{TokenIssuer, TokenKind};
use super::cache::CachePolicy;
use super::cache_keys;
use super::error::Error;
use super::ids::UserId;
use super::notifications::{self, Notifications};
use super::ports::{KeyValueCache, PasswordHasher, UserRepository};
use super::user::{Role, RoleSet, User, UserProfile};

/// Response for a password-reset request, identical whether or not the
/// account exists.
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists for this email, a reset link has been sent.";

const DUPLICATE_EMAIL_MESSAGE: &str = "A user with this email already exists.";

/// Access and refresh token pair issued on successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Registration details parked in the cache until the OTP is confirmed.
#[derive(Debug, Serialize, Deserialize)]
struct PendingRegistration {
    name: String,
    email: String,
    password_hash: String,
    otp: String,
}

/// Account workflows.
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: TokenIssuer,
    cache: Arc<dyn KeyValueCache>,
    policy: CachePolicy,
    notifications: Notifications,
    frontend_url: String,
}

impl AccountService {
    #[expect(clippy::too_many_arguments, reason = "wired once at startup")]
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: TokenIssuer,
        cache: Arc<dyn KeyValueCache>,
        policy: CachePolicy,
        notifications: Notifications,
        frontend_url: String,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            cache,
            policy,
            notifications,
            frontend_url,
        }
    }

    /// Start registration: park the details in the cache and mail an OTP.
    ///
    /// No user record exists until the OTP is confirmed; an abandoned
    /// registration simply expires.
    pub async fn register_init(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_request("Name is required"));
        }
        let email = normalise_email(email)?;
        validate_password(password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(Error::conflict(DUPLICATE_EMAIL_MESSAGE));
        }

        let otp = generate_otp();
        let pending = PendingRegistration {
            name: name.to_owned(),
            email: email.clone(),
            password_hash: self.hasher.hash(password).await?,
            otp: otp.clone(),
        };
        let raw = serde_json::to_string(&pending)
            .map_err(|err| Error::internal(format!("Could not encode registration: {err}")))?;
        self.cache
            .set(&cache_keys::registration_otp(&email), &raw, cache_keys::OTP_TTL)
            .await?;

        self.notifications
            .send_background(notifications::registration_otp_mail(&email, name, &otp));
        Ok(())
    }

    /// Confirm the OTP, create the account, and sign the user in.
    pub async fn register_verify(
        &self,
        email: &str,
        otp: &str,
    ) -> Result<(UserProfile, AuthTokens), Error> {
        let email = normalise_email(email)?;
        let key = cache_keys::registration_otp(&email);
        let raw = self
            .cache
            .get(&key)
            .await?
            .ok_or_else(|| Error::not_found("Registration expired or not found"))?;
        let pending: PendingRegistration = serde_json::from_str(&raw)
            .map_err(|err| Error::internal(format!("Could not decode registration: {err}")))?;
        if pending.otp != otp {
            return Err(Error::invalid_request("Incorrect OTP"));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::random(),
            name: pending.name,
            email: pending.email,
            password_hash: Some(pending.password_hash),
            roles: RoleSet::single(Role::User),
            profile_completed: false,
            payout_id: None,
            created_at: now,
            updated_at: now,
        };
        match self.users.insert(&user).await {
            Ok(()) => {}
            Err(err) if err.is_duplicate() => {
                return Err(Error::conflict(DUPLICATE_EMAIL_MESSAGE));
            }
            Err(err) => return Err(err.into()),
        }

        if let Err(err) = self.cache.delete(std::slice::from_ref(&key)).await {
            warn!(key, error = %err, "could not drop confirmed registration");
        }

        let tokens = self.issue_tokens(&user)?;
        Ok((UserProfile::from(&user), tokens))
    }

    /// Authenticate with email and password.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(UserProfile, AuthTokens), Error> {
        let email = normalise_email(email)?;
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| Error::not_found("User with the email does not exist"))?;
        let hash = user
            .password_hash
            .as_deref()
            .ok_or_else(|| Error::unauthorized("Incorrect password"))?;
        if !self.hasher.verify(password, hash).await? {
            return Err(Error::unauthorized("Incorrect password"));
        }
        let tokens = self.issue_tokens(&user)?;
        Ok((UserProfile::from(&user), tokens))
    }

    /// Exchange a refresh token for a fresh access token.
    ///
    /// Roles are reloaded from the store so a token issued before a role
    /// grant picks the grant up on refresh.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, Error> {
        let claims = self.tokens.verify(refresh_token, TokenKind::Refresh)?;
        let user = self
            .users
            .find_by_id(UserId::from_uuid(claims.sub))
            .await?
            .ok_or_else(|| Error::unauthorized("Invalid or expired token"))?;
        self.tokens.issue(
            TokenKind::Access,
            user.id.as_uuid(),
            &user.email,
            user.roles.to_vec(),
        )
    }

    /// Request a password reset link.
    ///
    /// Always reports success so the endpoint cannot be used to probe which
    /// emails have accounts.
    pub async fn forgot_password(&self, email: &str) -> Result<&'static str, Error> {
        let Ok(email) = normalise_email(email) else {
            return Ok(FORGOT_PASSWORD_MESSAGE);
        };
        if let Some(user) = self.users.find_by_email(&email).await? {
            let token = self.tokens.issue(
                TokenKind::Reset,
                user.id.as_uuid(),
                &user.email,
                Vec::new(),
            )?;
            let reset_url = format!("{}/reset-password?token={token}", self.frontend_url);
            self.notifications.send_background(notifications::password_reset_mail(
                &user.email,
                &user.name,
                &reset_url,
            ));
        }
        Ok(FORGOT_PASSWORD_MESSAGE)
    }

    /// Set a new password using a reset token.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), Error> {
        let claims = self.tokens.verify(token, TokenKind::Reset)?;
        validate_password(new_password)?;
        let user_id = UserId::from_uuid(claims.sub);
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| Error::unauthorized("Invalid or expired token"))?;
        let hash = self.hasher.hash(new_password).await?;
        self.users.update_password_hash(user_id, &hash).await?;
        Ok(())
    }

    /// Choose the account's primary role and complete the profile.
    pub async fn select_role(&self, user_id: UserId, role: Role) -> Result<UserProfile, Error> {
        if !matches!(role, Role::Student | Role::Instructor) {
            return Err(Error::invalid_request("Role must be student or instructor"));
        }
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found("User not found"))?;
        user.roles.insert(role);
        user.profile_completed = true;
        self.users
            .update_roles(user_id, &user.roles, true)
            .await?;
        self.policy.after_profile_change(user_id).await;
        Ok(UserProfile::from(&user))
    }

    /// The caller's profile, cached read-through.
    pub async fn profile(&self, user_id: UserId) -> Result<UserProfile, Error> {
        let users = Arc::clone(&self.users);
        self.policy
            .read_through(
                &cache_keys::user_profile(user_id),
                cache_keys::READ_TTL,
                || async move {
                    let user = users
                        .find_by_id(user_id)
                        .await?
                        .ok_or_else(|| Error::not_found("User not found"))?;
                    Ok(UserProfile::from(&user))
                },
            )
            .await
    }

    fn issue_tokens(&self, user: &User) -> Result<AuthTokens, Error> {
        let roles = user.roles.to_vec();
        let access_token = self.tokens.issue(
            TokenKind::Access,
            user.id.as_uuid(),
            &user.email,
            roles.clone(),
        )?;
        let refresh_token =
            self.tokens
                .issue(TokenKind::Refresh, user.id.as_uuid(), &user.email, roles)?;
        Ok(AuthTokens {
            access_token,
            refresh_token,
        })
    }
}

fn normalise_email(email: &str) -> Result<String, Error> {
    let email = email.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(email)
    } else {
        Err(Error::invalid_request("A valid email is required"))
    }
}

/// At least eight characters with an upper-case letter, a lower-case
/// letter, a digit, and one of `@$!%*?&`.
fn validate_password(password: &str) -> Result<(), Error> {
    let long_enough = password.len() >= 8;
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| "@$!%*?&".contains(c));
    if long_enough && has_upper && has_lower && has_digit && has_special {
        Ok(())
    } else {
        Err(Error::invalid_request(
            "Password must be at least 8 characters and include upper and \
             lower case letters, a digit, and a special character",
        ))
    }
}

fn generate_otp() -> String {
    let code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    code.to_string()
}
