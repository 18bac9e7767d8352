//! PostgreSQL-backed `EnrollmentRepository` implementation using Diesel.
//!
//! The `(course_id, student_id)` unique index is the concurrency control
//! for enrolment: a losing racer gets `StoreError::Duplicate` back from
//! `insert`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{EnrollmentRepository, StoreError};
use crate::domain::{CourseId, Enrollment, EnrollmentId, UserId};

use super::error_map::{map_diesel_error, map_pool_error};
use super::models::EnrollmentRow;
use super::pool::DbPool;
use super::schema::enrollments;

/// Diesel-backed enrolment store.
#[derive(Clone)]
pub struct DieselEnrollmentRepository {
    pool: DbPool,
}

impl DieselEnrollmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrollmentRepository for DieselEnrollmentRepository {
    async fn insert(&self, enrollment: &Enrollment) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(enrollments::table)
            .values(EnrollmentRow::from_domain(enrollment))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find(
        &self,
        course: CourseId,
        student: UserId,
    ) -> Result<Option<Enrollment>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = enrollments::table
            .filter(enrollments::course_id.eq(course.as_uuid()))
            .filter(enrollments::student_id.eq(student.as_uuid()))
            .select(EnrollmentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(EnrollmentRow::into_domain))
    }

    async fn delete(&self, id: EnrollmentId) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(enrollments::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn list_for_student(&self, student: UserId) -> Result<Vec<Enrollment>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = enrollments::table
            .filter(enrollments::student_id.eq(student.as_uuid()))
            .order(enrollments::enrolled_at.desc())
            .select(EnrollmentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(EnrollmentRow::into_domain).collect())
    }

    async fn count_for_course(&self, course: CourseId) -> Result<u64, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let count: i64 = enrollments::table
            .filter(enrollments::course_id.eq(course.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
