//! Payment records and their status machine.
//!
//! A payment is created when the gateway order is opened and moves exactly
//! once: `created -> paid` on successful verification, or `created -> failed`
//! on any verification error. Terminal states never change again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::course::Price;
use super::error::Error;
use super::ids::{CourseId, PaymentId, UserId};

/// Gateway-issued order identifier.
///
/// Opaque to the domain beyond being non-empty; it is the idempotency key
/// for the whole verification flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Validate and wrap a gateway order identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, Error> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(Error::invalid_request("Order id must not be empty"));
        }
        Ok(Self(value))
    }

    /// The raw identifier as issued by the gateway.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Created,
    Paid,
    Failed,
}

impl PaymentStatus {
    /// Canonical lowercase name, matching the persisted form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }

    /// Parse a persisted status name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "created" => Some(Self::Created),
            "paid" => Some(Self::Paid),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A payment attempt against a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub id: PaymentId,
    pub student_id: UserId,
    pub course_id: CourseId,
    pub amount: Price,
    pub order_id: OrderId,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Open a fresh payment record in the `created` state.
    pub fn open(student_id: UserId, course_id: CourseId, amount: Price, order_id: OrderId) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentId::random(),
            student_id,
            course_id,
            amount,
            order_id,
            status: PaymentStatus::Created,
            created_at: now,
            updated_at: now,
        }
    }
}
