//! Strongly typed identifiers for domain entities.
//!
//! Each identifier wraps a [`Uuid`] so that a course identifier cannot be
//! passed where a user identifier is expected. Parsing failures surface as
//! [`IdParseError`] so handlers can reject malformed path segments early.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Error raised when a string is not a valid identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid identifier: {value}")]
pub struct IdParseError {
    value: String,
}

impl IdParseError {
    fn new(value: &str) -> Self {
        Self {
            value: value.to_owned(),
        }
    }
}

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Serialize,
            Deserialize,
            ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Parse an identifier from its canonical string form.
            pub fn new(value: &str) -> Result<Self, IdParseError> {
                Uuid::parse_str(value)
                    .map(Self)
                    .map_err(|_| IdParseError::new(value))
            }

            /// Wrap an existing [`Uuid`].
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Generate a fresh random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Borrow the underlying [`Uuid`].
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(
    /// Identifier of a registered user.
    UserId
);
entity_id!(
    /// Identifier of a course in the catalogue.
    CourseId
);
entity_id!(
    /// Identifier of an enrolment record.
    EnrollmentId
);
entity_id!(
    /// Identifier of a payment record (not the gateway order).
    PaymentId
);
entity_id!(
    /// Identifier of a role-change ticket.
    TicketId
);
