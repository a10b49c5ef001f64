//! Repository layer: statement execution against SQLite.
//!
//! # Responsibility
//! - Isolate SQLite calls from routing and defaulting logic.
//! - Report storage failures as `RepoError`.

pub mod resource_repo;

pub use resource_repo::{RepoError, RepoResult, ResourceRepository, SqliteResourceRepository};
