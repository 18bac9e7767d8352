//! Shared application state for HTTP handlers.

use std::sync::Arc;

use crate::domain::{
    AccountService, CatalogueService, EnrollmentService, TicketService, TokenIssuer,
};

use super::rate_limit::RateLimiter;

/// Everything handlers need, cloned per worker.
#[derive(Clone)]
pub struct HttpState {
    pub catalogue: Arc<CatalogueService>,
    pub enrollments: Arc<EnrollmentService>,
    pub tickets: Arc<TicketService>,
    pub accounts: Arc<AccountService>,
    pub tokens: TokenIssuer,
    pub rate_limiter: RateLimiter,
}
