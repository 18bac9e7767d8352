//! Driven adapters: persistence, cache, and external services.

pub mod cache;
pub mod media;
pub mod notify;
pub mod payments;
pub mod persistence;
pub mod security;
