//! Core use-case services.
//!
//! # Responsibility
//! - Expose the four resource verbs over repository implementations.
//! - Own write-time defaulting and the timestamp clock.
//! - Keep callers decoupled from tables and columns.

pub mod clock;
pub mod content_service;
pub mod defaults;

pub use clock::{Clock, SystemClock};
pub use content_service::{open_store, ContentService, SqliteContentService};
pub use defaults::{derive_title, DefaultPolicy, DEFAULT_TITLE_BUDGET, DEFAULT_UNTITLED_TITLE};
