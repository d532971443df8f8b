//! Row structs and DTOs.
//!
//! Each submodule contains `FromRow` + `Serialize` row structs matching the
//! queries that produce them, plus `Deserialize` request DTOs where the HTTP
//! layer hands raw input to the service.

pub mod activity;
pub mod category;
pub mod collection;
pub mod resource;
pub mod tag;
