//! PostgreSQL-backed `CourseRepository` implementation using Diesel.
//!
//! Lecture videos are embedded in the course row as JSONB; they have no
//! table of their own.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{CourseRepository, StoreError};
use crate::domain::{Course, CourseId, PageNumber, UserId};

use super::error_map::{map_diesel_error, map_pool_error};
use super::models::CourseRow;
use super::pool::DbPool;
use super::schema::{courses, enrollments};

/// Diesel-backed course store.
#[derive(Clone)]
pub struct DieselCourseRepository {
    pool: DbPool,
}

impl DieselCourseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn rows_to_courses(rows: Vec<CourseRow>) -> Result<Vec<Course>, StoreError> {
    rows.into_iter().map(CourseRow::into_domain).collect()
}

#[async_trait]
impl CourseRepository for DieselCourseRepository {
    async fn insert(&self, course: &Course) -> Result<(), StoreError> {
        let row = CourseRow::from_domain(course)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(courses::table)
            .values(row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn update(&self, course: &Course) -> Result<(), StoreError> {
        let row = CourseRow::from_domain(course)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(courses::table.find(course.id.as_uuid()))
            .set(row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn delete(&self, id: CourseId) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(courses::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: CourseId) -> Result<Option<Course>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = courses::table
            .find(id.as_uuid())
            .select(CourseRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(CourseRow::into_domain).transpose()
    }

    async fn list_page(&self, page: PageNumber) -> Result<Vec<Course>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = courses::table
            .order(courses::created_at.desc())
            .offset(page.offset())
            .limit(page.limit())
            .select(CourseRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_courses(rows)
    }

    async fn list_by_instructor(
        &self,
        instructor: UserId,
        page: PageNumber,
    ) -> Result<Vec<Course>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = courses::table
            .filter(courses::instructor_id.eq(instructor.as_uuid()))
            .order(courses::created_at.desc())
            .offset(page.offset())
            .limit(page.limit())
            .select(CourseRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_courses(rows)
    }

    async fn list_enrolled(
        &self,
        student: UserId,
        page: PageNumber,
    ) -> Result<Vec<Course>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = courses::table
            .inner_join(enrollments::table)
            .filter(enrollments::student_id.eq(student.as_uuid()))
            .order(enrollments::enrolled_at.desc())
            .offset(page.offset())
            .limit(page.limit())
            .select(CourseRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_courses(rows)
    }
}
