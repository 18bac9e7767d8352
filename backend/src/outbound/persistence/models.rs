//! Row types bridging the Diesel schema and the domain model.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::warn;

use crate::domain::ports::StoreError;
use crate::domain::{
    Course, CourseId, Enrollment, EnrollmentId, Payment, PaymentId, PaymentStatus, Role, RoleSet,
    Ticket, TicketId, TicketStatus, ThumbnailAsset, User, UserId, VideoAsset,
};
use crate::domain::{OrderId, Price};

use super::schema::{courses, enrollments, payments, tickets, users};

/// Parse persisted role names, dropping any the code no longer knows.
fn roles_from_names(names: &[String], context: &str) -> RoleSet {
    names
        .iter()
        .filter_map(|name| {
            let role = Role::parse(name);
            if role.is_none() {
                warn!(role = %name, context, "ignoring unrecognised role name");
            }
            role
        })
        .collect()
}

pub(super) fn role_names(roles: &RoleSet) -> Vec<String> {
    roles.to_vec().iter().map(|role| role.as_str().to_owned()).collect()
}

#[derive(Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub roles: Vec<String>,
    pub profile_completed: bool,
    pub payout_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub fn from_domain(user: &User) -> Self {
        Self {
            id: user.id.as_uuid(),
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            roles: role_names(&user.roles),
            profile_completed: user.profile_completed,
            payout_id: user.payout_id.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn into_domain(self) -> User {
        let roles = roles_from_names(&self.roles, "users.roles");
        User {
            id: UserId::from_uuid(self.id),
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            roles,
            profile_completed: self.profile_completed,
            payout_id: self.payout_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = courses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CourseRow {
    pub id: uuid::Uuid,
    pub title: String,
    pub description: String,
    pub instructor_id: uuid::Uuid,
    pub thumbnail_url: String,
    pub thumbnail_external_id: String,
    pub videos: serde_json::Value,
    pub price_minor_units: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseRow {
    pub fn from_domain(course: &Course) -> Result<Self, StoreError> {
        let videos = serde_json::to_value(&course.videos)
            .map_err(|err| StoreError::query(format!("could not encode videos: {err}")))?;
        Ok(Self {
            id: course.id.as_uuid(),
            title: course.title.clone(),
            description: course.description.clone(),
            instructor_id: course.instructor_id.as_uuid(),
            thumbnail_url: course.thumbnail.url.clone(),
            thumbnail_external_id: course.thumbnail.external_id.clone(),
            videos,
            price_minor_units: course.price.minor_units(),
            created_at: course.created_at,
            updated_at: course.updated_at,
        })
    }

    pub fn into_domain(self) -> Result<Course, StoreError> {
        let videos: Vec<VideoAsset> = serde_json::from_value(self.videos)
            .map_err(|err| StoreError::query(format!("could not decode videos: {err}")))?;
        let price = Price::from_minor_units(self.price_minor_units)
            .map_err(|err| StoreError::query(err.message().to_owned()))?;
        Ok(Course {
            id: CourseId::from_uuid(self.id),
            title: self.title,
            description: self.description,
            instructor_id: UserId::from_uuid(self.instructor_id),
            thumbnail: ThumbnailAsset {
                url: self.thumbnail_url,
                external_id: self.thumbnail_external_id,
            },
            videos,
            price,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = enrollments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EnrollmentRow {
    pub id: uuid::Uuid,
    pub course_id: uuid::Uuid,
    pub student_id: uuid::Uuid,
    pub enrolled_at: DateTime<Utc>,
}

impl EnrollmentRow {
    pub fn from_domain(enrollment: &Enrollment) -> Self {
        Self {
            id: enrollment.id.as_uuid(),
            course_id: enrollment.course_id.as_uuid(),
            student_id: enrollment.student_id.as_uuid(),
            enrolled_at: enrollment.enrolled_at,
        }
    }

    pub fn into_domain(self) -> Enrollment {
        Enrollment {
            id: EnrollmentId::from_uuid(self.id),
            course_id: CourseId::from_uuid(self.course_id),
            student_id: UserId::from_uuid(self.student_id),
            enrolled_at: self.enrolled_at,
        }
    }
}

#[derive(Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentRow {
    pub id: uuid::Uuid,
    pub student_id: uuid::Uuid,
    pub course_id: uuid::Uuid,
    pub amount_minor_units: i64,
    pub order_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRow {
    pub fn from_domain(payment: &Payment) -> Self {
        Self {
            id: payment.id.as_uuid(),
            student_id: payment.student_id.as_uuid(),
            course_id: payment.course_id.as_uuid(),
            amount_minor_units: payment.amount.minor_units(),
            order_id: payment.order_id.as_str().to_owned(),
            status: payment.status.as_str().to_owned(),
            created_at: payment.created_at,
            updated_at: payment.updated_at,
        }
    }

    pub fn into_domain(self) -> Result<Payment, StoreError> {
        let status = PaymentStatus::parse(&self.status)
            .ok_or_else(|| StoreError::query(format!("unknown payment status: {}", self.status)))?;
        let amount = Price::from_minor_units(self.amount_minor_units)
            .map_err(|err| StoreError::query(err.message().to_owned()))?;
        let order_id = OrderId::new(self.order_id)
            .map_err(|err| StoreError::query(err.message().to_owned()))?;
        Ok(Payment {
            id: PaymentId::from_uuid(self.id),
            student_id: UserId::from_uuid(self.student_id),
            course_id: CourseId::from_uuid(self.course_id),
            amount,
            order_id,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = tickets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TicketRow {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub roles_at_request: Vec<String>,
    pub requested_role: String,
    pub status: String,
    pub resolved_by: Option<uuid::Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TicketRow {
    pub fn from_domain(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id.as_uuid(),
            user_id: ticket.user_id.as_uuid(),
            roles_at_request: role_names(&ticket.roles_at_request),
            requested_role: ticket.requested_role.as_str().to_owned(),
            status: ticket.status.as_str().to_owned(),
            resolved_by: ticket.resolved_by.map(|id| id.as_uuid()),
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        }
    }

    pub fn into_domain(self) -> Result<Ticket, StoreError> {
        let requested_role = Role::parse(&self.requested_role).ok_or_else(|| {
            StoreError::query(format!("unknown requested role: {}", self.requested_role))
        })?;
        let status = TicketStatus::parse(&self.status)
            .ok_or_else(|| StoreError::query(format!("unknown ticket status: {}", self.status)))?;
        Ok(Ticket {
            id: TicketId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            roles_at_request: roles_from_names(&self.roles_at_request, "tickets.roles_at_request"),
            requested_role,
            status,
            resolved_by: self.resolved_by.map(UserId::from_uuid),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
