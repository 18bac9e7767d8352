//! PostgreSQL persistence adapters.

mod diesel_course_repository;
mod diesel_enrollment_repository;
mod diesel_payment_repository;
mod diesel_ticket_repository;
mod diesel_user_repository;
mod error_map;
mod models;
pub mod pool;
pub mod schema;

pub use diesel_course_repository::DieselCourseRepository;
pub use diesel_enrollment_repository::DieselEnrollmentRepository;
pub use diesel_payment_repository::DieselPaymentRepository;
pub use diesel_ticket_repository::DieselTicketRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
