//! Request handlers.
//!
//! Resource handlers delegate to the shared `ResourceService`; the lookup
//! handlers read their lists straight from the repositories in `reshub_db`.
//! Errors are mapped via [`AppError`](crate::error::AppError).

pub mod categories;
pub mod collections;
pub mod resources;
pub mod tags;
