//! Resource access layer for notes and colored to-dos.
//!
//! Callers address records by path (`/notes`, `/notes/{id}`,
//! `/notes/aggregate`, `/todos`, `/todos/{id}`) and use four verbs. Table and
//! column names never leave this crate.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod resource;
pub mod service;

pub use config::{ConfigError, DatabaseLocation, LogConfig, StoreConfig};
pub use db::DbError;
pub use error::{Operation, StoreError, StoreResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{Note, DEFAULT_CATEGORY};
pub use model::resource::{fields, FieldType, ResourceKind, ResourceType};
pub use model::todo::{Todo, DEFAULT_COLOR};
pub use model::value::{FieldValue, FieldValues, Record, RecordError};
pub use notify::{ChangeObserver, NotificationHub, SubscriptionId};
pub use repo::{RepoError, ResourceRepository, SqliteResourceRepository};
pub use resource::query::{Predicate, ReadQuery, SortDirection, SortOrder};
pub use service::{
    open_store, Clock, ContentService, DefaultPolicy, SqliteContentService, SystemClock,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
