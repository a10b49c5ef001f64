//! Field whitelisting for projections, predicates, sorts and writes.
//!
//! # Responsibility
//! - Map logical field names to physical columns per resource kind.
//! - Reject any name outside the whitelist instead of passing it through.
//!
//! # Invariants
//! - An empty projection request means the full whitelist, in catalog order.
//! - Caller writes never reach read-only columns.

use crate::error::{StoreError, StoreResult};
use crate::model::resource::{FieldAccess, FieldSpec, FieldType, ResourceKind};
use crate::model::value::{FieldValue, FieldValues};
use std::collections::HashMap;

/// One validated caller write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldWrite {
    pub spec: &'static FieldSpec,
    pub value: FieldValue,
}

/// Per-kind whitelist lookups, built once from the static field catalog.
#[derive(Debug)]
pub struct ProjectionGuard {
    whitelists: HashMap<ResourceKind, HashMap<&'static str, &'static FieldSpec>>,
}

impl ProjectionGuard {
    pub fn new() -> Self {
        let whitelists = ResourceKind::ALL
            .iter()
            .map(|kind| {
                let lookup = kind
                    .fields()
                    .iter()
                    .map(|spec| (spec.name, spec))
                    .collect::<HashMap<_, _>>();
                (*kind, lookup)
            })
            .collect();
        Self { whitelists }
    }

    /// Resolves a projection request into whitelisted columns.
    ///
    /// Duplicate names are collapsed; the first occurrence keeps its position.
    pub fn resolve<S: AsRef<str>>(
        &self,
        kind: ResourceKind,
        requested: &[S],
    ) -> StoreResult<Vec<&'static FieldSpec>> {
        if requested.is_empty() {
            return Ok(kind.fields().iter().collect());
        }

        let mut resolved: Vec<&'static FieldSpec> = Vec::with_capacity(requested.len());
        for name in requested {
            let spec = self.lookup(kind, name.as_ref())?;
            if !resolved.iter().any(|known| known.name == spec.name) {
                resolved.push(spec);
            }
        }
        Ok(resolved)
    }

    /// Resolves one field reference used in a predicate or sort key.
    ///
    /// References resolve against the whole underlying table, so a filter on
    /// the aggregate view may still use note fields it does not project.
    pub fn reference(&self, kind: ResourceKind, name: &str) -> StoreResult<&'static FieldSpec> {
        kind.resource_type()
            .fields()
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| StoreError::InvalidField {
                kind,
                field: name.to_string(),
            })
    }

    /// Validates caller-supplied values for create/update.
    ///
    /// Stamped fields are dropped because the layer always overwrites them.
    ///
    /// # Errors
    /// - `InvalidField` for unknown or read-only fields.
    /// - `InvalidValue` when a value does not fit the field type.
    pub fn resolve_writes(
        &self,
        kind: ResourceKind,
        values: &FieldValues,
    ) -> StoreResult<Vec<FieldWrite>> {
        let mut writes = Vec::with_capacity(values.len());
        for (name, value) in values.iter() {
            let spec = self.lookup(kind, name)?;
            match spec.access {
                FieldAccess::ReadOnly => {
                    return Err(StoreError::InvalidField {
                        kind,
                        field: name.to_string(),
                    })
                }
                FieldAccess::Stamped => continue,
                FieldAccess::ReadWrite => {}
            }
            if !value.fits(spec.ty) {
                return Err(StoreError::InvalidValue {
                    field: name.to_string(),
                    expected: spec.ty,
                });
            }
            writes.push(FieldWrite {
                spec,
                value: normalize_value(spec.ty, value),
            });
        }
        Ok(writes)
    }

    fn lookup(&self, kind: ResourceKind, name: &str) -> StoreResult<&'static FieldSpec> {
        self.whitelists
            .get(&kind)
            .and_then(|lookup| lookup.get(name).copied())
            .ok_or_else(|| StoreError::InvalidField {
                kind,
                field: name.to_string(),
            })
    }
}

impl Default for ProjectionGuard {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_value(ty: FieldType, value: &FieldValue) -> FieldValue {
    match (ty, value) {
        (FieldType::Boolean, FieldValue::Integer(raw)) => FieldValue::Bool(*raw != 0),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::ProjectionGuard;
    use crate::error::StoreError;
    use crate::model::resource::{fields, FieldType, ResourceKind};
    use crate::model::value::{FieldValue, FieldValues};

    #[test]
    fn empty_request_returns_full_whitelist() {
        let guard = ProjectionGuard::new();
        let resolved = guard
            .resolve::<&str>(ResourceKind::TodosCollection, &[])
            .unwrap();
        assert_eq!(resolved.len(), ResourceKind::TodosCollection.fields().len());
    }

    #[test]
    fn column_expression_is_not_a_field() {
        let guard = ProjectionGuard::new();
        let err = guard
            .resolve(ResourceKind::NotesCollection, &["title", "note AS x"])
            .unwrap_err();
        match err {
            StoreError::InvalidField { field, .. } => assert_eq!(field, "note AS x"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn physical_column_names_are_not_logical_fields() {
        let guard = ProjectionGuard::new();
        assert!(guard.resolve(ResourceKind::NoteRecord, &["_id"]).is_err());
        assert!(guard.resolve(ResourceKind::TodoRecord, &["is_completed"]).is_err());
    }

    #[test]
    fn duplicate_requests_collapse() {
        let guard = ProjectionGuard::new();
        let resolved = guard
            .resolve(ResourceKind::NotesCollection, &["title", "id", "title"])
            .unwrap();
        let names: Vec<&str> = resolved.iter().map(|spec| spec.name).collect();
        assert_eq!(names, vec!["title", "id"]);
    }

    #[test]
    fn writes_reject_read_only_fields_and_drop_stamped_ones() {
        let guard = ProjectionGuard::new();
        let err = guard
            .resolve_writes(
                ResourceKind::NotesCollection,
                &FieldValues::new().with(fields::ID, 5_i64),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidField { .. }));

        let writes = guard
            .resolve_writes(
                ResourceKind::NotesCollection,
                &FieldValues::new()
                    .with(fields::MODIFIED_AT, 1_i64)
                    .with(fields::TITLE, "kept"),
            )
            .unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].spec.name, fields::TITLE);
    }

    #[test]
    fn writes_check_value_types_and_normalize_booleans() {
        let guard = ProjectionGuard::new();
        let err = guard
            .resolve_writes(
                ResourceKind::TodoRecord,
                &FieldValues::new().with(fields::COMPLETED, "yes"),
            )
            .unwrap_err();
        match err {
            StoreError::InvalidValue { field, expected } => {
                assert_eq!(field, fields::COMPLETED);
                assert_eq!(expected, FieldType::Boolean);
            }
            other => panic!("unexpected error: {other}"),
        }

        let writes = guard
            .resolve_writes(
                ResourceKind::TodoRecord,
                &FieldValues::new().with(fields::COMPLETED, 1_i64),
            )
            .unwrap();
        assert_eq!(writes[0].value, FieldValue::Bool(true));
    }

    #[test]
    fn references_resolve_against_the_whole_table() {
        let guard = ProjectionGuard::new();
        let spec = guard
            .reference(ResourceKind::NotesAggregateView, fields::CATEGORY)
            .unwrap();
        assert_eq!(spec.column, "category");
        assert!(guard
            .reference(ResourceKind::TodosCollection, fields::CATEGORY)
            .is_err());
    }
}
