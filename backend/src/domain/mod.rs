//! Domain model, ports, and workflow services.

pub mod account_service;
pub mod auth;
pub mod cache;
pub mod cache_keys;
pub mod catalogue_service;
pub mod course;
pub mod enrollment;
pub mod enrollment_service;
pub mod error;
pub mod ids;
pub mod notifications;
pub mod pagination;
pub mod payment;
pub mod ports;
pub mod ticket;
pub mod ticket_service;
pub mod user;

pub use account_service::{AccountService, AuthTokens, FORGOT_PASSWORD_MESSAGE};
pub use auth::{Claims, TokenIssuer, TokenKind};
pub use cache::CachePolicy;
pub use catalogue_service::{
    CatalogueService, CourseUpdate, MediaUpload, NewCourse, NewVideo,
};
pub use course::{Course, CourseDetail, Price, ThumbnailAsset, VideoAsset};
pub use enrollment::Enrollment;
pub use enrollment_service::{
    CheckoutOrder, EnrollmentService, VerificationOutcome, VerificationRequest,
};
pub use error::{Error, ErrorCode};
pub use ids::{CourseId, EnrollmentId, IdParseError, PaymentId, TicketId, UserId};
pub use notifications::Notifications;
pub use pagination::{total_pages, PageNumber, PAGE_SIZE};
pub use payment::{OrderId, Payment, PaymentStatus};
pub use ticket::{Ticket, TicketResolution, TicketStatus};
pub use ticket_service::{TicketPage, TicketService};
pub use user::{Role, RoleSet, User, UserProfile};

/// Result alias used across the domain services.
pub type ApiResult<T> = Result<T, Error>;
