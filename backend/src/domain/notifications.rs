//! Background transactional mail.
//!
//! Every message is fire-and-forget: the workflow that triggers it has
//! already committed, so a delivery failure is logged and dropped.

use std::sync::Arc;

use tracing::warn;

use super::ports::{MailMessage, Notifier};
use super::ticket::TicketResolution;
use super::user::Role;

/// Dispatches mail on a background task.
#[derive(Clone)]
pub struct Notifications {
    inner: Arc<dyn Notifier>,
}

impl Notifications {
    /// Wrap a mail sender.
    pub fn new(inner: Arc<dyn Notifier>) -> Self {
        Self { inner }
    }

    /// Send without awaiting delivery. Failures are logged.
    pub fn send_background(&self, message: MailMessage) {
        let sender = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if let Err(err) = sender.send(&message).await {
                warn!(to = %message.to, subject = %message.subject, error = %err,
                    "background mail delivery failed");
            }
        });
    }
}

/// OTP mail for a pending registration.
pub fn registration_otp_mail(to: &str, name: &str, otp: &str) -> MailMessage {
    MailMessage {
        to: to.to_owned(),
        subject: "Verify your email address".to_owned(),
        html_body: format!(
            "<p>Hi {name},</p>\
             <p>Your verification code is <strong>{otp}</strong>. \
             It expires in 15 minutes.</p>"
        ),
    }
}

/// Password reset link mail.
pub fn password_reset_mail(to: &str, name: &str, reset_url: &str) -> MailMessage {
    MailMessage {
        to: to.to_owned(),
        subject: "Reset your password".to_owned(),
        html_body: format!(
            "<p>Hi {name},</p>\
             <p><a href=\"{reset_url}\">Reset your password</a>. \
             The link expires in 15 minutes. If you did not request this, \
             ignore this email.</p>"
        ),
    }
}

/// Confirmation that a role-change ticket was opened.
pub fn ticket_created_mail(to: &str, name: &str, requested_role: Role) -> MailMessage {
    MailMessage {
        to: to.to_owned(),
        subject: "Role request received".to_owned(),
        html_body: format!(
            "<p>Hi {name},</p>\
             <p>Your request for the <strong>{requested_role}</strong> role \
             has been received and is awaiting review.</p>"
        ),
    }
}

/// Outcome mail once an admin resolves a ticket.
pub fn ticket_resolved_mail(
    to: &str,
    name: &str,
    requested_role: Role,
    resolution: TicketResolution,
) -> MailMessage {
    let body = match resolution {
        TicketResolution::Approved => format!(
            "<p>Hi {name},</p>\
             <p>Your request for the <strong>{requested_role}</strong> role \
             has been approved.</p>"
        ),
        TicketResolution::Rejected => format!(
            "<p>Hi {name},</p>\
             <p>Your request for the <strong>{requested_role}</strong> role \
             has been rejected.</p>"
        ),
    };
    MailMessage {
        to: to.to_owned(),
        subject: "Role request update".to_owned(),
        html_body: body,
    }
}
