//! Scoped query assembly.
//!
//! # Responsibility
//! - Combine route scope, caller predicate and sort into executable SQL.
//! - Render write assignments for inserts and updates.
//!
//! # Invariants
//! - Record routes are always restricted to their id; caller predicates are
//!   ANDed in, never substituted.
//! - Field references in predicates and sorts are whitelisted; other predicate
//!   text is passed to SQLite verbatim.
//! - Values are always bound, never inlined. The only inlined literal is the
//!   record id, which the router has already parsed as an integer.

use crate::error::StoreResult;
use crate::model::resource::{columns, fields, FieldSpec, ResourceKind, ResourceType};
use crate::model::value::FieldValue;
use crate::resource::guard::ProjectionGuard;
use crate::resource::router::Route;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use rusqlite::types::Value;
use std::borrow::Cow;

static FIELD_REF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid field reference regex")
});

static NUMBERED_PARAM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\?([0-9]+)").expect("valid numbered parameter regex"));

/// Caller predicate: SQL text with `{field}` references and `?` or `?N`
/// placeholders. `?N` counts from the predicate's first bound value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    clause: String,
    args: Vec<FieldValue>,
}

impl Predicate {
    pub fn new(clause: impl Into<String>) -> Self {
        Self {
            clause: clause.into(),
            args: Vec::new(),
        }
    }

    /// Appends one positional bind value.
    pub fn bind(mut self, value: impl Into<FieldValue>) -> Self {
        self.args.push(value.into());
        self
    }

    /// `{field} = ?`
    pub fn field_equals(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::new(format!("{{{field}}} = ?")).bind(value)
    }

    /// Case-insensitive substring match over any of `fields`.
    pub fn text_contains(fields: &[&str], needle: &str) -> Self {
        let pattern = format!("%{needle}%");
        let clause = fields
            .iter()
            .map(|field| format!("{{{field}}} LIKE ?"))
            .collect::<Vec<_>>()
            .join(" OR ");
        fields
            .iter()
            .fold(Self::new(clause), |predicate, _| {
                predicate.bind(pattern.as_str())
            })
    }

    pub fn clause(&self) -> &str {
        &self.clause
    }

    pub fn args(&self) -> &[FieldValue] {
        &self.args
    }

    fn is_blank(&self) -> bool {
        self.clause.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

/// Caller sort keys, applied in order. Empty means the resource default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOrder {
    keys: Vec<SortKey>,
}

impl SortOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asc(self, field: impl Into<String>) -> Self {
        self.push(field.into(), SortDirection::Ascending)
    }

    pub fn desc(self, field: impl Into<String>) -> Self {
        self.push(field.into(), SortDirection::Descending)
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn push(mut self, field: String, direction: SortDirection) -> Self {
        self.keys.push(SortKey { field, direction });
        self
    }
}

/// Read request options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadQuery {
    /// Logical field names; empty selects every whitelisted field.
    pub fields: Vec<String>,
    pub predicate: Option<Predicate>,
    pub sort: SortOrder,
}

impl ReadQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn fields(mut self, names: &[&str]) -> Self {
        self.fields = names.iter().map(|name| name.to_string()).collect();
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}

/// Executable select statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub table: &'static str,
    pub columns: Vec<&'static FieldSpec>,
    pub predicate: Option<String>,
    pub args: Vec<Value>,
    pub order_by: String,
}

impl SelectQuery {
    pub fn sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|spec| spec.column)
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("SELECT {columns} FROM {}", self.table);
        if let Some(predicate) = &self.predicate {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(&self.order_by);
        sql.push(';');
        sql
    }
}

/// Row scope for update/delete.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteScope {
    pub table: &'static str,
    pub predicate: Option<String>,
    pub args: Vec<Value>,
}

impl WriteScope {
    pub fn delete_sql(&self) -> String {
        format!("DELETE FROM {}{};", self.table, self.where_sql())
    }

    /// Update statement; bind assignment values first, then `self.args`.
    ///
    /// Each assignment takes one anonymous placeholder, so numbered
    /// placeholders in the predicate are shifted past them.
    pub fn update_sql(&self, assignments: &[Assignment]) -> String {
        let sets = assignments
            .iter()
            .map(Assignment::set_sql)
            .collect::<Vec<_>>()
            .join(", ");
        let predicate = self
            .predicate
            .as_deref()
            .map(|predicate| shift_numbered_params(predicate, assignments.len()));
        format!(
            "UPDATE {} SET {sets}{};",
            self.table,
            where_sql(predicate.as_deref())
        )
    }

    fn where_sql(&self) -> String {
        where_sql(self.predicate.as_deref())
    }
}

fn where_sql(predicate: Option<&str>) -> String {
    predicate
        .map(|predicate| format!(" WHERE {predicate}"))
        .unwrap_or_default()
}

/// Rewrites every `?N` in `clause` to `?{N + offset}`.
fn shift_numbered_params(clause: &str, offset: usize) -> Cow<'_, str> {
    if offset == 0 {
        return Cow::Borrowed(clause);
    }
    NUMBERED_PARAM_RE.replace_all(clause, |caps: &Captures<'_>| {
        match caps[1].parse::<usize>() {
            Ok(index) => format!("?{}", index + offset),
            Err(_) => caps[0].to_string(),
        }
    })
}

/// How an assignment combines with the stored value on update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    Replace,
    /// Keeps the stored value when it is greater; used for timestamps.
    KeepGreater,
    /// Writes only when the stored value is null or blank.
    FillBlank,
}

/// One column write.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: &'static str,
    pub value: Value,
    pub merge: Merge,
}

impl Assignment {
    pub fn replace(column: &'static str, value: Value) -> Self {
        Self {
            column,
            value,
            merge: Merge::Replace,
        }
    }

    pub fn keep_greater(column: &'static str, value: Value) -> Self {
        Self {
            column,
            value,
            merge: Merge::KeepGreater,
        }
    }

    pub fn fill_blank(column: &'static str, value: Value) -> Self {
        Self {
            column,
            value,
            merge: Merge::FillBlank,
        }
    }

    fn set_sql(&self) -> String {
        let column = self.column;
        match self.merge {
            Merge::Replace => format!("{column} = ?"),
            Merge::KeepGreater => format!("{column} = MAX(COALESCE({column}, 0), ?)"),
            Merge::FillBlank => format!("{column} = COALESCE(NULLIF(TRIM({column}), ''), ?)"),
        }
    }
}

/// Insert statement for `assignments`; merge modes are ignored.
pub fn insert_sql(table: &str, assignments: &[Assignment]) -> String {
    let columns = assignments
        .iter()
        .map(|assignment| assignment.column)
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; assignments.len()].join(", ");
    format!("INSERT INTO {table} ({columns}) VALUES ({placeholders});")
}

/// Default sort keys per resource type, in logical names.
fn default_sort(ty: ResourceType) -> &'static [(&'static str, SortDirection)] {
    match ty {
        ResourceType::Note => &[
            (fields::MODIFIED_AT, SortDirection::Descending),
            (fields::ID, SortDirection::Ascending),
        ],
        ResourceType::Todo => &[(fields::ID, SortDirection::Ascending)],
    }
}

/// Builds scoped statements using the guard for every field reference.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder<'a> {
    guard: &'a ProjectionGuard,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(guard: &'a ProjectionGuard) -> Self {
        Self { guard }
    }

    /// Builds a select for `route` projecting `columns`.
    ///
    /// The aggregate view always projects its fixed two columns.
    pub fn select(
        &self,
        route: &Route,
        columns: Vec<&'static FieldSpec>,
        predicate: Option<&Predicate>,
        sort: &SortOrder,
    ) -> StoreResult<SelectQuery> {
        let columns = if route.kind == ResourceKind::NotesAggregateView {
            ResourceKind::NotesAggregateView.fields().iter().collect()
        } else {
            columns
        };
        let (predicate, args) = self.scope_predicate(route, predicate)?;
        Ok(SelectQuery {
            table: route.kind.resource_type().table(),
            columns,
            predicate,
            args,
            order_by: self.order_by(route.kind, sort)?,
        })
    }

    /// Builds the row scope for update/delete on `route`.
    pub fn scope(&self, route: &Route, predicate: Option<&Predicate>) -> StoreResult<WriteScope> {
        let (predicate, args) = self.scope_predicate(route, predicate)?;
        Ok(WriteScope {
            table: route.kind.resource_type().table(),
            predicate,
            args,
        })
    }

    fn scope_predicate(
        &self,
        route: &Route,
        predicate: Option<&Predicate>,
    ) -> StoreResult<(Option<String>, Vec<Value>)> {
        let caller = match predicate.filter(|predicate| !predicate.is_blank()) {
            Some(predicate) => Some((
                self.resolve_references(route.kind, predicate.clause())?,
                predicate.args().iter().map(FieldValue::to_sql).collect(),
            )),
            None => None,
        };
        let id_clause = route.id.map(|id| format!("{} = {id}", columns::ID));

        Ok(match (id_clause, caller) {
            (Some(id), Some((clause, args))) => (Some(format!("{id} AND ({clause})")), args),
            (Some(id), None) => (Some(id), Vec::new()),
            (None, Some((clause, args))) => (Some(clause), args),
            (None, None) => (None, Vec::new()),
        })
    }

    fn order_by(&self, kind: ResourceKind, sort: &SortOrder) -> StoreResult<String> {
        let mut terms = Vec::new();
        if sort.is_empty() {
            for (field, direction) in default_sort(kind.resource_type()) {
                let spec = self.guard.reference(kind, field)?;
                terms.push(format!("{} {}", spec.column, direction.sql()));
            }
        } else {
            for key in sort.keys() {
                let spec = self.guard.reference(kind, &key.field)?;
                terms.push(format!("{} {}", spec.column, key.direction.sql()));
            }
        }
        Ok(terms.join(", "))
    }

    fn resolve_references(&self, kind: ResourceKind, clause: &str) -> StoreResult<String> {
        let mut resolved = String::with_capacity(clause.len());
        let mut last = 0;
        for captures in FIELD_REF_RE.captures_iter(clause) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let spec = self.guard.reference(kind, name.as_str())?;
            resolved.push_str(&clause[last..whole.start()]);
            resolved.push_str(spec.column);
            last = whole.end();
        }
        resolved.push_str(&clause[last..]);
        Ok(resolved)
    }
}
