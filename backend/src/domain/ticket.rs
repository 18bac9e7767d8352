//! Role-change tickets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{TicketId, UserId};
use super::user::{Role, RoleSet};

/// Lifecycle state of a ticket. `Created` is the only open state; the other
/// two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Created,
    Approved,
    Rejected,
}

impl TicketStatus {
    /// Canonical lowercase name, matching the persisted form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parse a persisted status name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "created" => Some(Self::Created),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Admin's decision on a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TicketResolution {
    Approved,
    Rejected,
}

impl TicketResolution {
    /// Parse the decision supplied by the admin interface.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// The terminal status this decision resolves the ticket to.
    pub fn status(self) -> TicketStatus {
        match self {
            Self::Approved => TicketStatus::Approved,
            Self::Rejected => TicketStatus::Rejected,
        }
    }
}

/// A request from a user to be granted an additional role.
///
/// `roles_at_request` snapshots the requester's roles at creation time so an
/// admin reviews the request against what the user held when they asked, not
/// whatever they hold now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: TicketId,
    pub user_id: UserId,
    pub roles_at_request: RoleSet,
    pub requested_role: Role,
    pub status: TicketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Open a fresh ticket for the given user and role.
    pub fn open(user_id: UserId, roles_at_request: RoleSet, requested_role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: TicketId::random(),
            user_id,
            roles_at_request,
            requested_role,
            status: TicketStatus::Created,
            resolved_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this ticket is still awaiting a decision.
    pub fn is_open(&self) -> bool {
        self.status == TicketStatus::Created
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_maps_to_terminal_status() {
        assert_eq!(TicketResolution::Approved.status(), TicketStatus::Approved);
        assert_eq!(TicketResolution::Rejected.status(), TicketStatus::Rejected);
    }

    #[test]
    fn only_created_is_open() {
        let mut ticket = Ticket::open(UserId::random(), RoleSet::single(Role::User), Role::Instructor);
        assert!(ticket.is_open());
        ticket.status = TicketStatus::Rejected;
        assert!(!ticket.is_open());
    }
}
