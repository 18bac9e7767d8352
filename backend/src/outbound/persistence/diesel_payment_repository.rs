//! PostgreSQL-backed `PaymentRepository` implementation using Diesel.
//!
//! The unique index on `order_id` makes one row per gateway order a store
//! guarantee, and `fail_created` is a conditional update so it can never
//! clobber a terminal status.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PaymentRepository, StoreError};
use crate::domain::{CourseId, OrderId, Payment, PaymentId, PaymentStatus, UserId};

use super::error_map::{map_diesel_error, map_pool_error};
use super::models::PaymentRow;
use super::pool::DbPool;
use super::schema::payments;

/// Diesel-backed payment store.
#[derive(Clone)]
pub struct DieselPaymentRepository {
    pool: DbPool,
}

impl DieselPaymentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for DieselPaymentRepository {
    async fn insert(&self, payment: &Payment) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(payments::table)
            .values(PaymentRow::from_domain(payment))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find_for_verification(
        &self,
        order: &OrderId,
        student: UserId,
        course: CourseId,
    ) -> Result<Option<Payment>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = payments::table
            .filter(payments::order_id.eq(order.as_str()))
            .filter(payments::student_id.eq(student.as_uuid()))
            .filter(payments::course_id.eq(course.as_uuid()))
            .select(PaymentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(PaymentRow::into_domain).transpose()
    }

    async fn set_status(&self, id: PaymentId, status: PaymentStatus) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(payments::table.find(id.as_uuid()))
            .set((
                payments::status.eq(status.as_str()),
                payments::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn fail_created(&self, order: &OrderId, student: UserId) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(
            payments::table
                .filter(payments::order_id.eq(order.as_str()))
                .filter(payments::student_id.eq(student.as_uuid()))
                .filter(payments::status.eq(PaymentStatus::Created.as_str())),
        )
        .set((
            payments::status.eq(PaymentStatus::Failed.as_str()),
            payments::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(())
    }
}
