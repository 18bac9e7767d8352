//! Role-change ticket workflow behaviour.

mod support;

use backend::domain::{ErrorCode, PageNumber, Role, TicketResolution, TicketStatus};
use support::Harness;

#[tokio::test]
async fn user_opens_a_ticket_and_gets_a_confirmation_mail() {
    let h = Harness::new();
    let user = h.seed_user("Sam", "sam@example.com", &[Role::Student]).await;

    let ticket = h
        .tickets
        .create(user.id, Role::Instructor)
        .await
        .expect("ticket opened");

    assert_eq!(ticket.requested_role, Role::Instructor);
    assert_eq!(ticket.status, TicketStatus::Created);
    assert!(ticket.roles_at_request.contains(Role::Student));

    // Mail goes out on a background task.
    tokio::task::yield_now().await;
    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "sam@example.com");
}

#[tokio::test]
async fn second_open_ticket_is_a_conflict() {
    let h = Harness::new();
    let user = h.seed_user("Sam", "sam@example.com", &[Role::Student]).await;

    h.tickets
        .create(user.id, Role::Instructor)
        .await
        .expect("first ticket");
    let err = h
        .tickets
        .create(user.id, Role::Instructor)
        .await
        .expect_err("second open ticket rejected");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.message(), "Pending ticket already exists");
}

#[tokio::test]
async fn held_role_cannot_be_requested() {
    let h = Harness::new();
    let user = h.seed_user("Sam", "sam@example.com", &[Role::Student]).await;

    let err = h
        .tickets
        .create(user.id, Role::Student)
        .await
        .expect_err("already holds the role");
    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.message(), "Role already assigned");
}

#[tokio::test]
async fn admin_role_cannot_be_requested() {
    let h = Harness::new();
    let user = h.seed_user("Sam", "sam@example.com", &[Role::Student]).await;

    let err = h
        .tickets
        .create(user.id, Role::Admin)
        .await
        .expect_err("admin is not requestable");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn approval_grants_the_role_and_closes_the_ticket() {
    let h = Harness::new();
    let admin = h.seed_user("Ada", "ada@example.com", &[Role::Admin]).await;
    let user = h.seed_user("Sam", "sam@example.com", &[Role::Student]).await;
    let ticket = h
        .tickets
        .create(user.id, Role::Instructor)
        .await
        .expect("ticket opened");

    let resolved = h
        .tickets
        .resolve(admin.id, ticket.id, TicketResolution::Approved)
        .await
        .expect("resolved");

    assert_eq!(resolved.status, TicketStatus::Approved);
    assert_eq!(resolved.resolved_by, Some(admin.id));
    let updated = h.db.user(user.id).expect("user exists");
    assert!(updated.roles.contains(Role::Instructor));
    assert!(updated.roles.contains(Role::Student));
}

#[tokio::test]
async fn rejection_leaves_roles_untouched() {
    let h = Harness::new();
    let admin = h.seed_user("Ada", "ada@example.com", &[Role::Admin]).await;
    let user = h.seed_user("Sam", "sam@example.com", &[Role::Student]).await;
    let ticket = h
        .tickets
        .create(user.id, Role::Instructor)
        .await
        .expect("ticket opened");

    let resolved = h
        .tickets
        .resolve(admin.id, ticket.id, TicketResolution::Rejected)
        .await
        .expect("resolved");

    assert_eq!(resolved.status, TicketStatus::Rejected);
    let updated = h.db.user(user.id).expect("user exists");
    assert!(!updated.roles.contains(Role::Instructor));
}

#[tokio::test]
async fn resolving_twice_is_an_invalid_state() {
    let h = Harness::new();
    let admin = h.seed_user("Ada", "ada@example.com", &[Role::Admin]).await;
    let user = h.seed_user("Sam", "sam@example.com", &[Role::Student]).await;
    let ticket = h
        .tickets
        .create(user.id, Role::Instructor)
        .await
        .expect("ticket opened");

    h.tickets
        .resolve(admin.id, ticket.id, TicketResolution::Rejected)
        .await
        .expect("first resolution");
    let err = h
        .tickets
        .resolve(admin.id, ticket.id, TicketResolution::Approved)
        .await
        .expect_err("terminal ticket is final");

    assert_eq!(err.code(), ErrorCode::InvalidState);
    assert_eq!(err.message(), "Ticket already processed");
}

#[tokio::test]
async fn admins_cannot_resolve_their_own_tickets() {
    let h = Harness::new();
    let admin = h.seed_user("Ada", "ada@example.com", &[Role::Admin]).await;
    let ticket = h
        .tickets
        .create(admin.id, Role::Instructor)
        .await
        .expect("ticket opened");

    let err = h
        .tickets
        .resolve(admin.id, ticket.id, TicketResolution::Approved)
        .await
        .expect_err("self-approval blocked");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn open_ticket_queue_paginates_oldest_first() {
    let h = Harness::new();
    for n in 0..12 {
        let user = h
            .seed_user(&format!("User{n}"), &format!("user{n}@example.com"), &[Role::Student])
            .await;
        h.tickets
            .create(user.id, Role::Instructor)
            .await
            .expect("ticket opened");
    }

    let first = h
        .tickets
        .open_tickets(PageNumber::FIRST)
        .await
        .expect("first page");
    assert_eq!(first.total, 12);
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.tickets.len(), 10);

    let second = h
        .tickets
        .open_tickets(PageNumber::new(2))
        .await
        .expect("second page");
    assert_eq!(second.tickets.len(), 2);
    assert!(first.tickets[0].created_at <= second.tickets[0].created_at);
}

#[tokio::test]
async fn my_open_ticket_returns_only_open_tickets() {
    let h = Harness::new();
    let admin = h.seed_user("Ada", "ada@example.com", &[Role::Admin]).await;
    let user = h.seed_user("Sam", "sam@example.com", &[Role::Student]).await;

    assert!(h
        .tickets
        .my_open_ticket(user.id)
        .await
        .expect("query succeeds")
        .is_none());

    let ticket = h
        .tickets
        .create(user.id, Role::Instructor)
        .await
        .expect("ticket opened");
    assert!(h
        .tickets
        .my_open_ticket(user.id)
        .await
        .expect("query succeeds")
        .is_some());

    h.tickets
        .resolve(admin.id, ticket.id, TicketResolution::Approved)
        .await
        .expect("resolved");
    assert!(h
        .tickets
        .my_open_ticket(user.id)
        .await
        .expect("query succeeds")
        .is_none());
}
