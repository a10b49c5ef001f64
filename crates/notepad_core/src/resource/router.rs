//! Resource path classification.
//!
//! # Invariants
//! - Patterns are disjoint: collection paths never end in a numeric segment,
//!   record paths always do.
//! - The pattern table is compiled once and never mutated.

use crate::error::{StoreError, StoreResult};
use crate::model::resource::{ResourceKind, NOTES_AGGREGATE_PATH};
use regex::Regex;

/// Ordered pattern table, most specific first.
const ROUTE_TABLE: &[(ResourceKind, &str)] = &[
    (ResourceKind::NotesAggregateView, r"^/notes/aggregate$"),
    (ResourceKind::NoteRecord, r"^/notes/([0-9]+)$"),
    (ResourceKind::NotesCollection, r"^/notes$"),
    (ResourceKind::TodoRecord, r"^/todos/([0-9]+)$"),
    (ResourceKind::TodosCollection, r"^/todos$"),
];

/// Classified resource path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub kind: ResourceKind,
    pub collection_root: &'static str,
    /// Present exactly for record-level kinds.
    pub id: Option<i64>,
}

impl Route {
    /// Canonical path of the addressed resource.
    pub fn path(&self) -> String {
        match (self.kind, self.id) {
            (ResourceKind::NotesAggregateView, _) => NOTES_AGGREGATE_PATH.to_string(),
            (_, Some(id)) => self.kind.resource_type().record_path(id),
            (_, None) => self.collection_root.to_string(),
        }
    }
}

#[derive(Debug)]
struct RoutePattern {
    kind: ResourceKind,
    pattern: Regex,
}

/// Maps resource paths to one of the five known shapes.
#[derive(Debug)]
pub struct PathRouter {
    patterns: Vec<RoutePattern>,
}

impl PathRouter {
    pub fn new() -> Self {
        let patterns = ROUTE_TABLE
            .iter()
            .map(|(kind, pattern)| RoutePattern {
                kind: *kind,
                pattern: Regex::new(pattern).expect("valid route pattern"),
            })
            .collect();
        Self { patterns }
    }

    /// Classifies `path`.
    ///
    /// # Errors
    /// - `UnknownResource` when no pattern matches, or the record id does not
    ///   fit a 64-bit signed integer.
    pub fn classify(&self, path: &str) -> StoreResult<Route> {
        for entry in &self.patterns {
            let Some(captures) = entry.pattern.captures(path) else {
                continue;
            };
            let id = match captures.get(1) {
                Some(segment) => Some(
                    segment
                        .as_str()
                        .parse::<i64>()
                        .map_err(|_| StoreError::UnknownResource(path.to_string()))?,
                ),
                None => None,
            };
            return Ok(Route {
                kind: entry.kind,
                collection_root: entry.kind.resource_type().collection_root(),
                id,
            });
        }

        Err(StoreError::UnknownResource(path.to_string()))
    }
}

impl Default for PathRouter {
    fn default() -> Self {
        Self::new()
    }
}
