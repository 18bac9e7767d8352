//! Cache key families and TTLs.
//!
//! Every cached read and every invalidation goes through these builders so
//! the key grammar lives in exactly one place. Pattern builders pair with
//! [`super::cache::CachePolicy`]'s scan-and-delete.

use std::time::Duration;

use crate::domain::ids::{CourseId, UserId};
use crate::domain::pagination::PageNumber;

/// TTL applied to every read-through entry.
pub const READ_TTL: Duration = Duration::from_secs(300);

/// TTL for pending registrations awaiting OTP confirmation.
pub const OTP_TTL: Duration = Duration::from_secs(900);

/// Window for the fixed-window rate limiter.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(300);

/// One page of the public catalogue.
pub fn course_list_page(page: PageNumber) -> String {
    format!("courses:page:{}", page.get())
}

/// Every page of the public catalogue.
pub fn course_list_pattern() -> String {
    "courses:page:*".to_owned()
}

/// One page of an instructor's own courses.
pub fn instructor_courses_page(instructor: UserId, page: PageNumber) -> String {
    format!("courses:instructor:{instructor}:page:{}", page.get())
}

/// Every page of an instructor's own courses.
pub fn instructor_courses_pattern(instructor: UserId) -> String {
    format!("courses:instructor:{instructor}:page:*")
}

/// One page of a student's enrolled courses.
pub fn student_courses_page(student: UserId, page: PageNumber) -> String {
    format!("courses:student:{student}:page:{}", page.get())
}

/// Every page of a student's enrolled courses.
pub fn student_courses_pattern(student: UserId) -> String {
    format!("courses:student:{student}:page:*")
}

/// A single course detail entry.
pub fn course_detail(course: CourseId) -> String {
    format!("course:{course}")
}

/// The course detail entry and anything derived from it.
pub fn course_detail_pattern(course: CourseId) -> String {
    format!("course:{course}*")
}

/// A user's cached profile.
pub fn user_profile(user: UserId) -> String {
    format!("user:profile:{user}")
}

/// A student's enrolment records.
pub fn student_enrollments(student: UserId) -> String {
    format!("enrollments:student:{student}")
}

/// A course's enrolment count.
pub fn enrollment_count(course: CourseId) -> String {
    format!("enrollment:count:{course}")
}

/// A pending registration awaiting its OTP.
pub fn registration_otp(email: &str) -> String {
    format!("register:otp:{email}")
}

/// A rate-limiter counter for one scope.
pub fn rate_limit(scope: &str) -> String {
    format!("rate:limit:{scope}")
}
