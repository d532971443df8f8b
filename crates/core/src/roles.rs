//! Well-known role name constants.
//!
//! These must match the `users.role` values written by the seed data in
//! `db/migrations`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";
