//! Enrolment records linking students to courses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{CourseId, EnrollmentId, UserId};

/// A student's enrolment in a course.
///
/// Uniqueness of `(course_id, student_id)` is enforced by the store, not by
/// application-level locking; concurrent enrol attempts race on the insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub course_id: CourseId,
    pub student_id: UserId,
    pub enrolled_at: DateTime<Utc>,
}

impl Enrollment {
    /// Build a fresh enrolment for the given pair, stamped now.
    pub fn new(course_id: CourseId, student_id: UserId) -> Self {
        Self {
            id: EnrollmentId::random(),
            course_id,
            student_id,
            enrolled_at: Utc::now(),
        }
    }
}
