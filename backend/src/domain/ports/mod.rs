//! Ports implemented by outbound adapters.
//!
//! The domain services depend only on these traits; the concrete Postgres,
//! Redis, gateway, media, and mail adapters live under `outbound` and the
//! test suite substitutes in-memory fakes.

mod cache;
mod external;
mod repositories;

pub use cache::{CacheError, KeyValueCache};
pub use external::{
    GatewayOrder, MailMessage, MediaHost, MediaHostError, MediaKind, Notifier, NotifyError,
    PasswordHashError, PasswordHasher, PaymentGateway, PaymentGatewayError, UploadedAsset,
};
pub use repositories::{
    CourseRepository, EnrollmentRepository, PaymentRepository, StoreError, TicketRepository,
    UserRepository,
};
