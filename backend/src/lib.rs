//! Learning-platform backend.
//!
//! Hexagonal layout: `domain` holds the model, ports, and workflow
//! services; `inbound` adapts HTTP onto the services; `outbound` implements
//! the ports against PostgreSQL, Redis, and the external payment, media,
//! and mail providers; `server` wires it all together.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod server;
