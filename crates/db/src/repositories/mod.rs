//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async functions. Reads
//! accept `&PgPool`; statements that run inside a caller's transaction
//! accept `&mut PgConnection`.

pub mod activity_repo;
pub mod category_repo;
pub mod collection_repo;
pub mod resource_repo;
pub mod tag_repo;
pub mod user_repo;

pub use activity_repo::ActivityRepo;
pub use category_repo::CategoryRepo;
pub use collection_repo::CollectionRepo;
pub use resource_repo::ResourceRepo;
pub use tag_repo::TagRepo;
pub use user_repo::UserRepo;
