//! PostgreSQL-backed `TicketRepository` implementation using Diesel.
//!
//! The partial unique index on `(user_id) WHERE status = 'created'` turns a
//! duplicate open ticket into `StoreError::Duplicate` at insert time.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{StoreError, TicketRepository};
use crate::domain::{PageNumber, Ticket, TicketId, TicketStatus, UserId};

use super::error_map::{map_diesel_error, map_pool_error};
use super::models::TicketRow;
use super::pool::DbPool;
use super::schema::tickets;

/// Diesel-backed ticket store.
#[derive(Clone)]
pub struct DieselTicketRepository {
    pool: DbPool,
}

impl DieselTicketRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketRepository for DieselTicketRepository {
    async fn insert(&self, ticket: &Ticket) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(tickets::table)
            .values(TicketRow::from_domain(ticket))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = tickets::table
            .find(id.as_uuid())
            .select(TicketRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(TicketRow::into_domain).transpose()
    }

    async fn find_open_for_user(&self, user: UserId) -> Result<Option<Ticket>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = tickets::table
            .filter(tickets::user_id.eq(user.as_uuid()))
            .filter(tickets::status.eq(TicketStatus::Created.as_str()))
            .select(TicketRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(TicketRow::into_domain).transpose()
    }

    async fn resolve(
        &self,
        id: TicketId,
        status: TicketStatus,
        resolved_by: UserId,
    ) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(tickets::table.find(id.as_uuid()))
            .set((
                tickets::status.eq(status.as_str()),
                tickets::resolved_by.eq(resolved_by.as_uuid()),
                tickets::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn list_open(&self, page: PageNumber) -> Result<(Vec<Ticket>, u64), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = tickets::table
            .filter(tickets::status.eq(TicketStatus::Created.as_str()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let rows = tickets::table
            .filter(tickets::status.eq(TicketStatus::Created.as_str()))
            .order(tickets::created_at.asc())
            .offset(page.offset())
            .limit(page.limit())
            .select(TicketRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let tickets = rows
            .into_iter()
            .map(TicketRow::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((tickets, u64::try_from(total).unwrap_or(0)))
    }
}
