//! Resource addressing: path routing, field whitelisting and query building.
//!
//! # Responsibility
//! - Turn a resource path plus caller options into a scoped statement.
//! - Keep table and column names out of caller reach.
//!
//! # Invariants
//! - Lookup tables are built once per [`ResourceCatalog`] and never mutated.

pub mod guard;
pub mod query;
pub mod router;

use guard::ProjectionGuard;
use query::QueryBuilder;
use router::PathRouter;

/// Immutable routing and whitelist tables shared by every operation.
#[derive(Debug, Default)]
pub struct ResourceCatalog {
    router: PathRouter,
    guard: ProjectionGuard,
}

impl ResourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn router(&self) -> &PathRouter {
        &self.router
    }

    pub fn guard(&self) -> &ProjectionGuard {
        &self.guard
    }

    pub fn query_builder(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.guard)
    }
}
