//! Resource-addressed CRUD entry point.
//!
//! # Responsibility
//! - Route each call, validate its fields, build the scoped statement and
//!   hand it to the repository.
//! - Apply write-time defaults and timestamps.
//! - Announce committed mutations through the notification hub.
//!
//! # Invariants
//! - Notifications are sent only after the write has committed and the
//!   repository lock has been released.
//! - The aggregate view never accepts writes; records never accept creates.
//! - Zero-row updates and deletes are successes and still notify.

use crate::config::{DatabaseLocation, StoreConfig};
use crate::db::{open_db, open_db_in_memory};
use crate::error::{Operation, StoreError, StoreResult};
use crate::model::resource::{fields, ResourceKind, NOTES_ROOT};
use crate::model::value::{FieldValues, Record};
use crate::notify::{ChangeObserver, NotificationHub, SubscriptionId};
use crate::repo::{ResourceRepository, SqliteResourceRepository};
use crate::resource::query::{Predicate, ReadQuery};
use crate::resource::router::Route;
use crate::resource::ResourceCatalog;
use crate::service::clock::{Clock, SystemClock};
use crate::service::defaults::DefaultPolicy;
use log::{debug, warn};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

/// Content service backed by the bundled SQLite repository.
pub type SqliteContentService = ContentService<SqliteResourceRepository>;

/// CRUD dispatcher over one repository.
pub struct ContentService<R: ResourceRepository> {
    repo: R,
    catalog: ResourceCatalog,
    hub: Arc<NotificationHub>,
    clock: Arc<dyn Clock>,
    defaults: DefaultPolicy,
}

impl<R: ResourceRepository> ContentService<R> {
    /// Creates a dispatcher using the system clock and default policy.
    pub fn new(repo: R, hub: Arc<NotificationHub>) -> Self {
        Self {
            repo,
            catalog: ResourceCatalog::new(),
            hub,
            clock: Arc::new(SystemClock),
            defaults: DefaultPolicy::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_defaults(mut self, defaults: DefaultPolicy) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn hub(&self) -> &Arc<NotificationHub> {
        &self.hub
    }

    pub fn catalog(&self) -> &ResourceCatalog {
        &self.catalog
    }

    /// Reads records addressed by `path`.
    ///
    /// # Errors
    /// - `UnknownResource` for unrecognized paths.
    /// - `InvalidField` for fields, predicate references or sort keys outside
    ///   the whitelist.
    pub fn read(&self, path: &str, query: &ReadQuery) -> StoreResult<Vec<Record>> {
        let started_at = Instant::now();
        let result = self.read_inner(path, query);
        log_outcome(Operation::Read, path, started_at, &result);
        result
    }

    /// Creates one record under a collection path and returns its path.
    ///
    /// Fields absent from `values` receive their defaults; `created_at` and
    /// `modified_at` are stamped inside the write transaction.
    ///
    /// # Errors
    /// - `UnsupportedOperation` for record paths and the aggregate view.
    /// - `InvalidField`/`InvalidValue` for rejected writes.
    pub fn create(&self, path: &str, values: &FieldValues) -> StoreResult<String> {
        let started_at = Instant::now();
        let result = self.create_inner(path, values);
        log_outcome(Operation::Create, path, started_at, &result);
        result
    }

    /// Updates the record at `path`, or every matching record for a
    /// collection path, and returns the affected count.
    ///
    /// Without a predicate a collection update touches every record.
    pub fn update(
        &self,
        path: &str,
        values: &FieldValues,
        predicate: Option<&Predicate>,
    ) -> StoreResult<usize> {
        let started_at = Instant::now();
        let result = self.update_inner(path, values, predicate);
        log_outcome(Operation::Update, path, started_at, &result);
        result
    }

    /// Deletes the record at `path`, or every matching record for a
    /// collection path, and returns the affected count.
    pub fn delete(&self, path: &str, predicate: Option<&Predicate>) -> StoreResult<usize> {
        let started_at = Instant::now();
        let result = self.delete_inner(path, predicate);
        log_outcome(Operation::Delete, path, started_at, &result);
        result
    }

    /// Subscribes `observer` to mutations on `path` and below.
    ///
    /// The path is classified first and stored in canonical form. The
    /// aggregate view has no mutations of its own, so subscribing to it
    /// registers on its collection root and hears every note change.
    pub fn subscribe(
        &self,
        path: &str,
        observer: Arc<dyn ChangeObserver>,
    ) -> StoreResult<SubscriptionId> {
        let route = self.catalog.router().classify(path)?;
        let key = if route.kind.is_read_only() {
            route.collection_root.to_string()
        } else {
            route.path()
        };
        Ok(self.hub.subscribe(&key, observer))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.hub.unsubscribe(id)
    }

    /// MIME-style content type of the resource at `path`.
    pub fn content_type(&self, path: &str) -> StoreResult<&'static str> {
        let route = self.catalog.router().classify(path)?;
        Ok(route.kind.content_type())
    }

    /// Distinct non-blank note categories, trimmed and sorted.
    pub fn note_categories(&self) -> StoreResult<Vec<String>> {
        let records = self.read(NOTES_ROOT, &ReadQuery::all().fields(&[fields::CATEGORY]))?;
        let categories: BTreeSet<String> = records
            .iter()
            .filter_map(|record| record.text(fields::CATEGORY))
            .map(str::trim)
            .filter(|category| !category.is_empty())
            .map(str::to_string)
            .collect();
        Ok(categories.into_iter().collect())
    }

    fn read_inner(&self, path: &str, query: &ReadQuery) -> StoreResult<Vec<Record>> {
        let route = self.catalog.router().classify(path)?;
        let columns = self.catalog.guard().resolve(route.kind, query.fields.as_slice())?;
        let select = self.catalog.query_builder().select(
            &route,
            columns,
            query.predicate.as_ref(),
            &query.sort,
        )?;
        Ok(self.repo.select(&select)?)
    }

    fn create_inner(&self, path: &str, values: &FieldValues) -> StoreResult<String> {
        let route = self.catalog.router().classify(path)?;
        if !route.kind.is_collection() {
            return Err(unsupported(Operation::Create, route.kind));
        }
        let ty = route.kind.resource_type();
        let writes = self.catalog.guard().resolve_writes(route.kind, values)?;

        let id = self.repo.insert(ty.table(), || {
            self.defaults
                .creation_row(ty, &writes, self.clock.now_epoch_ms())
        })?;
        self.hub.notify(route.collection_root);
        Ok(ty.record_path(id))
    }

    fn update_inner(
        &self,
        path: &str,
        values: &FieldValues,
        predicate: Option<&Predicate>,
    ) -> StoreResult<usize> {
        let route = self.writable_route(Operation::Update, path)?;
        let ty = route.kind.resource_type();
        let writes = self.catalog.guard().resolve_writes(route.kind, values)?;
        let scope = self.catalog.query_builder().scope(&route, predicate)?;

        let changed = self.repo.update(&scope, || {
            self.defaults
                .update_row(ty, &writes, self.clock.now_epoch_ms())
        })?;
        self.hub.notify(&route.path());
        Ok(changed)
    }

    fn delete_inner(&self, path: &str, predicate: Option<&Predicate>) -> StoreResult<usize> {
        let route = self.writable_route(Operation::Delete, path)?;
        let scope = self.catalog.query_builder().scope(&route, predicate)?;
        let changed = self.repo.delete(&scope)?;
        self.hub.notify(&route.path());
        Ok(changed)
    }

    fn writable_route(&self, operation: Operation, path: &str) -> StoreResult<Route> {
        let route = self.catalog.router().classify(path)?;
        if route.kind.is_read_only() {
            return Err(unsupported(operation, route.kind));
        }
        Ok(route)
    }
}

impl<R: ResourceRepository> std::fmt::Debug for ContentService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentService")
            .field("hub", &self.hub)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

/// Opens (and migrates) the configured database and returns a ready service
/// with its own notification hub.
///
/// # Errors
/// - `Schema` when the database cannot be opened or migrated.
pub fn open_store(config: &StoreConfig) -> StoreResult<SqliteContentService> {
    let conn = match &config.database {
        DatabaseLocation::Memory => open_db_in_memory()?,
        DatabaseLocation::File(path) => open_db(path)?,
    };
    let repo = SqliteResourceRepository::try_new(conn)?;
    Ok(ContentService::new(repo, Arc::new(NotificationHub::new()))
        .with_defaults(config.default_policy()))
}

fn unsupported(operation: Operation, kind: ResourceKind) -> StoreError {
    StoreError::UnsupportedOperation { operation, kind }
}

fn log_outcome<T>(operation: Operation, path: &str, started_at: Instant, result: &StoreResult<T>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => debug!(
            "event=store_{operation} module=service status=ok path={path} duration_ms={duration_ms}"
        ),
        Err(err) => warn!(
            "event=store_{operation} module=service status=error path={path} duration_ms={duration_ms} error={err}"
        ),
    }
}
