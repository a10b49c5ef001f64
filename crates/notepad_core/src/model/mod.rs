//! Record model for the notes and todos collections.
//!
//! # Responsibility
//! - Describe resource kinds, their logical fields and physical columns.
//! - Carry untyped rows (`Record`) and typed views (`Note`, `Todo`).
//!
//! # Invariants
//! - Every record is identified by a store-assigned integer `id`.
//! - Deletion is a hard delete; there is no tombstone state.

pub mod note;
pub mod resource;
pub mod todo;
pub mod value;
