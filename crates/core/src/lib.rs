//! Domain layer for the resource-management backend.
//!
//! Everything in this crate is pure: no database, no HTTP, no clock reads
//! except where a caller passes timestamps in. Persistence lives in
//! `reshub-db`, the HTTP boundary in `reshub-api`.

pub mod authorization;
pub mod error;
pub mod messages;
pub mod metrics;
pub mod pagination;
pub mod roles;
pub mod types;
pub mod upload;
pub mod validation;
