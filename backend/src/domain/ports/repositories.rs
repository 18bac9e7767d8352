//! Persistence ports for the relational store.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::course::Course;
use crate::domain::enrollment::Enrollment;
use crate::domain::error::Error as DomainError;
use crate::domain::ids::{CourseId, EnrollmentId, PaymentId, TicketId, UserId};
use crate::domain::pagination::PageNumber;
use crate::domain::payment::{OrderId, Payment, PaymentStatus};
use crate::domain::ticket::{Ticket, TicketStatus};
use crate::domain::user::{RoleSet, User};

/// Failure raised by a persistence port.
///
/// `Duplicate` is the load-bearing variant: every uniqueness rule in the
/// system (one enrolment per pair, one payment per order, one open ticket
/// per user, unique course title) is enforced by the store and surfaces
/// here, so services map it to a domain conflict rather than locking.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Could not obtain or use a connection.
    #[error("store connection failed: {0}")]
    Connection(String),
    /// A statement failed for reasons other than a uniqueness violation.
    #[error("store query failed: {0}")]
    Query(String),
    /// A uniqueness constraint rejected the write.
    #[error("duplicate record: {0}")]
    Duplicate(String),
}

impl StoreError {
    /// Build a [`StoreError::Connection`].
    pub fn connection(detail: impl Into<String>) -> Self {
        Self::Connection(detail.into())
    }

    /// Build a [`StoreError::Query`].
    pub fn query(detail: impl Into<String>) -> Self {
        Self::Query(detail.into())
    }

    /// Build a [`StoreError::Duplicate`].
    pub fn duplicate(detail: impl Into<String>) -> Self {
        Self::Duplicate(detail.into())
    }

    /// Whether this error came from a uniqueness constraint.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Connection(detail) => {
                Self::upstream(format!("Store unavailable: {detail}"))
            }
            StoreError::Query(detail) => Self::internal(format!("Store query failed: {detail}")),
            StoreError::Duplicate(_) => Self::conflict("Duplicate record"),
        }
    }
}

/// Accounts store.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: &User) -> Result<(), StoreError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// Replace the user's role set and profile-completion flag.
    async fn update_roles(
        &self,
        id: UserId,
        roles: &RoleSet,
        profile_completed: bool,
    ) -> Result<(), StoreError>;
    async fn update_payout_id(&self, id: UserId, payout_id: &str) -> Result<(), StoreError>;
    async fn update_password_hash(&self, id: UserId, hash: &str) -> Result<(), StoreError>;
}

/// Course catalogue store.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn insert(&self, course: &Course) -> Result<(), StoreError>;
    /// Persist the current state of an existing course.
    async fn update(&self, course: &Course) -> Result<(), StoreError>;
    async fn delete(&self, id: CourseId) -> Result<(), StoreError>;
    async fn find_by_id(&self, id: CourseId) -> Result<Option<Course>, StoreError>;
    /// Newest-first public catalogue page.
    async fn list_page(&self, page: PageNumber) -> Result<Vec<Course>, StoreError>;
    async fn list_by_instructor(
        &self,
        instructor: UserId,
        page: PageNumber,
    ) -> Result<Vec<Course>, StoreError>;
    /// Courses the student is enrolled in, newest enrolment first.
    async fn list_enrolled(
        &self,
        student: UserId,
        page: PageNumber,
    ) -> Result<Vec<Course>, StoreError>;
}

/// Enrolment store.
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Insert a new enrolment. Fails with [`StoreError::Duplicate`] when the
    /// `(course, student)` pair already exists.
    async fn insert(&self, enrollment: &Enrollment) -> Result<(), StoreError>;
    async fn find(
        &self,
        course: CourseId,
        student: UserId,
    ) -> Result<Option<Enrollment>, StoreError>;
    async fn delete(&self, id: EnrollmentId) -> Result<(), StoreError>;
    async fn list_for_student(&self, student: UserId) -> Result<Vec<Enrollment>, StoreError>;
    async fn count_for_course(&self, course: CourseId) -> Result<u64, StoreError>;
}

/// Payment store.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert a new payment record. Fails with [`StoreError::Duplicate`]
    /// when a record for the order already exists.
    async fn insert(&self, payment: &Payment) -> Result<(), StoreError>;
    /// Look up the payment that verification must match: same order, same
    /// student, same course.
    async fn find_for_verification(
        &self,
        order: &OrderId,
        student: UserId,
        course: CourseId,
    ) -> Result<Option<Payment>, StoreError>;
    async fn set_status(&self, id: PaymentId, status: PaymentStatus) -> Result<(), StoreError>;
    /// Move the payment for this order to `failed`, only if it is still in
    /// `created`. A no-op when the record is missing or already terminal.
    async fn fail_created(&self, order: &OrderId, student: UserId) -> Result<(), StoreError>;
}

/// Ticket store.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Insert a new ticket. Fails with [`StoreError::Duplicate`] when the
    /// user already has an open ticket.
    async fn insert(&self, ticket: &Ticket) -> Result<(), StoreError>;
    async fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>, StoreError>;
    async fn find_open_for_user(&self, user: UserId) -> Result<Option<Ticket>, StoreError>;
    /// Resolve the ticket to a terminal status, recording the admin who
    /// decided it.
    async fn resolve(
        &self,
        id: TicketId,
        status: TicketStatus,
        resolved_by: UserId,
    ) -> Result<(), StoreError>;
    /// Open tickets, oldest first, with the total open count.
    async fn list_open(&self, page: PageNumber) -> Result<(Vec<Ticket>, u64), StoreError>;
}
