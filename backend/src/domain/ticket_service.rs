//! Role-change ticket workflows.
//!
//! "One open ticket per user" is enforced by a partial unique index in the
//! store; the pre-checks here exist only to give callers precise messages.

use std::sync::Arc;

use super::cache::CachePolicy;
use super::error::Error;
use super::ids::{TicketId, UserId};
use super::notifications::{self, Notifications};
use super::pagination::{total_pages, PageNumber};
use super::ports::{TicketRepository, UserRepository};
use super::ticket::{Ticket, TicketResolution};
use super::user::Role;

/// One page of open tickets for the admin review queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketPage {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
    pub tickets: Vec<Ticket>,
}

/// Ticket workflows.
pub struct TicketService {
    users: Arc<dyn UserRepository>,
    tickets: Arc<dyn TicketRepository>,
    notifications: Notifications,
    cache: CachePolicy,
}

impl TicketService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tickets: Arc<dyn TicketRepository>,
        notifications: Notifications,
        cache: CachePolicy,
    ) -> Self {
        Self {
            users,
            tickets,
            notifications,
            cache,
        }
    }

    /// Open a ticket requesting an additional role.
    pub async fn create(&self, user_id: UserId, requested_role: Role) -> Result<Ticket, Error> {
        if requested_role == Role::Admin {
            return Err(Error::invalid_request("Cannot request the admin role"));
        }
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found("User not found"))?;
        if user.roles.contains(requested_role) {
            return Err(Error::conflict("Role already assigned"));
        }
        if self.tickets.find_open_for_user(user_id).await?.is_some() {
            return Err(Error::conflict("Pending ticket already exists"));
        }

        let ticket = Ticket::open(user_id, user.roles.clone(), requested_role);
        match self.tickets.insert(&ticket).await {
            Ok(()) => {}
            Err(err) if err.is_duplicate() => {
                return Err(Error::conflict("Pending ticket already exists"));
            }
            Err(err) => return Err(err.into()),
        }

        self.notifications.send_background(notifications::ticket_created_mail(
            &user.email,
            &user.name,
            requested_role,
        ));
        Ok(ticket)
    }

    /// Resolve a ticket as the given admin.
    ///
    /// Approval grants the requested role idempotently: a role the user
    /// somehow already holds is left as-is and the ticket still closes.
    pub async fn resolve(
        &self,
        admin: UserId,
        ticket_id: TicketId,
        resolution: TicketResolution,
    ) -> Result<Ticket, Error> {
        let ticket = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or_else(|| Error::not_found("Invalid ticket"))?;
        if !ticket.is_open() {
            return Err(Error::invalid_state("Ticket already processed"));
        }
        if ticket.user_id == admin {
            return Err(Error::forbidden("Cannot resolve your own ticket"));
        }
        let requester = self
            .users
            .find_by_id(ticket.user_id)
            .await?
            .ok_or_else(|| Error::not_found("User not found"))?;

        if resolution == TicketResolution::Approved {
            let mut roles = requester.roles.clone();
            roles.insert(ticket.requested_role);
            self.users
                .update_roles(requester.id, &roles, requester.profile_completed)
                .await?;
            self.cache.after_profile_change(requester.id).await;
        }

        self.tickets
            .resolve(ticket_id, resolution.status(), admin)
            .await?;

        self.notifications.send_background(notifications::ticket_resolved_mail(
            &requester.email,
            &requester.name,
            ticket.requested_role,
            resolution,
        ));

        let mut resolved = ticket;
        resolved.status = resolution.status();
        resolved.resolved_by = Some(admin);
        Ok(resolved)
    }

    /// Open tickets for the admin queue, oldest first.
    pub async fn open_tickets(&self, page: PageNumber) -> Result<TicketPage, Error> {
        let (tickets, total) = self.tickets.list_open(page).await?;
        Ok(TicketPage {
            page: page.get(),
            limit: u32::try_from(page.limit()).unwrap_or(u32::MAX),
            total,
            total_pages: total_pages(total),
            tickets,
        })
    }

    /// The caller's open ticket, if any.
    pub async fn my_open_ticket(&self, user: UserId) -> Result<Option<Ticket>, Error> {
        self.tickets
            .find_open_for_user(user)
            .await
            .map_err(Error::from)
    }
}
