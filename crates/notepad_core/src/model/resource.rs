//! Resource kinds and the static field catalog.
//!
//! # Invariants
//! - Logical field names are the only names visible to callers.
//! - The catalog is immutable; per-kind lookups are built from it once.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Logical field names shared by callers and the projection whitelist.
pub mod fields {
    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const BODY: &str = "body";
    pub const CATEGORY: &str = "category";
    pub const TEXT: &str = "text";
    pub const COLOR: &str = "color";
    pub const COMPLETED: &str = "completed";
    pub const CREATED_AT: &str = "created_at";
    pub const MODIFIED_AT: &str = "modified_at";
}

pub const NOTES_TABLE: &str = "notes";
pub const TODOS_TABLE: &str = "todos";
pub const NOTES_ROOT: &str = "/notes";
pub const TODOS_ROOT: &str = "/todos";
pub const NOTES_AGGREGATE_PATH: &str = "/notes/aggregate";

/// Storage type of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Integer,
    Text,
    /// Stored as `0`/`1`.
    Boolean,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Text => "text",
            Self::Boolean => "boolean",
        }
    }
}

/// Who may write a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAccess {
    /// Callers may set it on create and update.
    ReadWrite,
    /// Assigned by the store or the layer; caller writes are rejected.
    ReadOnly,
    /// Accepted from callers but always overwritten with the layer's clock.
    Stamped,
}

/// One whitelisted field: logical name, physical column and type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub column: &'static str,
    pub ty: FieldType,
    pub access: FieldAccess,
}

const fn field(
    name: &'static str,
    column: &'static str,
    ty: FieldType,
    access: FieldAccess,
) -> FieldSpec {
    FieldSpec {
        name,
        column,
        ty,
        access,
    }
}

/// Physical column names.
pub mod columns {
    pub const ID: &str = "_id";
    pub const TITLE: &str = "title";
    pub const NOTE: &str = "note";
    pub const CATEGORY: &str = "category";
    pub const TEXT: &str = "text";
    pub const COLOR: &str = "color";
    pub const IS_COMPLETED: &str = "is_completed";
    pub const CREATED: &str = "created";
    pub const MODIFIED: &str = "modified";
}

const NOTE_FIELDS: &[FieldSpec] = &[
    field(fields::ID, columns::ID, FieldType::Integer, FieldAccess::ReadOnly),
    field(fields::TITLE, columns::TITLE, FieldType::Text, FieldAccess::ReadWrite),
    field(fields::BODY, columns::NOTE, FieldType::Text, FieldAccess::ReadWrite),
    field(fields::CATEGORY, columns::CATEGORY, FieldType::Text, FieldAccess::ReadWrite),
    field(
        fields::CREATED_AT,
        columns::CREATED,
        FieldType::Integer,
        FieldAccess::ReadOnly,
    ),
    field(
        fields::MODIFIED_AT,
        columns::MODIFIED,
        FieldType::Integer,
        FieldAccess::Stamped,
    ),
];

const TODO_FIELDS: &[FieldSpec] = &[
    field(fields::ID, columns::ID, FieldType::Integer, FieldAccess::ReadOnly),
    field(fields::TEXT, columns::TEXT, FieldType::Text, FieldAccess::ReadWrite),
    field(fields::COLOR, columns::COLOR, FieldType::Text, FieldAccess::ReadWrite),
    field(
        fields::COMPLETED,
        columns::IS_COMPLETED,
        FieldType::Boolean,
        FieldAccess::ReadWrite,
    ),
    field(
        fields::CREATED_AT,
        columns::CREATED,
        FieldType::Integer,
        FieldAccess::ReadOnly,
    ),
    field(
        fields::MODIFIED_AT,
        columns::MODIFIED,
        FieldType::Integer,
        FieldAccess::Stamped,
    ),
];

const AGGREGATE_FIELDS: &[FieldSpec] = &[
    field(fields::ID, columns::ID, FieldType::Integer, FieldAccess::ReadOnly),
    field(fields::TITLE, columns::TITLE, FieldType::Text, FieldAccess::ReadOnly),
];

/// Underlying record type, one per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Note,
    Todo,
}

impl ResourceType {
    pub fn table(self) -> &'static str {
        match self {
            Self::Note => NOTES_TABLE,
            Self::Todo => TODOS_TABLE,
        }
    }

    pub fn collection_root(self) -> &'static str {
        match self {
            Self::Note => NOTES_ROOT,
            Self::Todo => TODOS_ROOT,
        }
    }

    /// Full field catalog of the table.
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::Note => NOTE_FIELDS,
            Self::Todo => TODO_FIELDS,
        }
    }

    /// Path of one record in this collection.
    pub fn record_path(self, id: i64) -> String {
        format!("{}/{id}", self.collection_root())
    }
}

/// The five path shapes understood by the access layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    NotesCollection,
    NoteRecord,
    TodosCollection,
    TodoRecord,
    /// Read-only `id`/`title` projection of notes for folder/widget integrations.
    NotesAggregateView,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        Self::NotesCollection,
        Self::NoteRecord,
        Self::TodosCollection,
        Self::TodoRecord,
        Self::NotesAggregateView,
    ];

    pub fn resource_type(self) -> ResourceType {
        match self {
            Self::NotesCollection | Self::NoteRecord | Self::NotesAggregateView => {
                ResourceType::Note
            }
            Self::TodosCollection | Self::TodoRecord => ResourceType::Todo,
        }
    }

    pub fn is_collection(self) -> bool {
        matches!(self, Self::NotesCollection | Self::TodosCollection)
    }

    pub fn is_read_only(self) -> bool {
        matches!(self, Self::NotesAggregateView)
    }

    /// Projection whitelist for reads through this kind.
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::NotesAggregateView => AGGREGATE_FIELDS,
            other => other.resource_type().fields(),
        }
    }

    /// MIME-style content type of the resource.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::NotesCollection | Self::NotesAggregateView => "vnd.notepad.dir/note",
            Self::NoteRecord => "vnd.notepad.item/note",
            Self::TodosCollection => "vnd.notepad.dir/todo",
            Self::TodoRecord => "vnd.notepad.item/todo",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotesCollection => "notes_collection",
            Self::NoteRecord => "note_record",
            Self::TodosCollection => "todos_collection",
            Self::TodoRecord => "todo_record",
            Self::NotesAggregateView => "notes_aggregate_view",
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{fields, FieldAccess, ResourceKind, ResourceType};

    #[test]
    fn aggregate_view_exposes_only_id_and_title() {
        let names: Vec<&str> = ResourceKind::NotesAggregateView
            .fields()
            .iter()
            .map(|spec| spec.name)
            .collect();
        assert_eq!(names, vec![fields::ID, fields::TITLE]);
    }

    #[test]
    fn identifiers_and_creation_stamps_are_read_only() {
        for ty in [ResourceType::Note, ResourceType::Todo] {
            for spec in ty.fields() {
                if spec.name == fields::ID || spec.name == fields::CREATED_AT {
                    assert_eq!(spec.access, FieldAccess::ReadOnly);
                }
            }
        }
    }

    #[test]
    fn record_path_appends_id_to_collection_root() {
        assert_eq!(ResourceType::Note.record_path(7), "/notes/7");
        assert_eq!(ResourceType::Todo.record_path(12), "/todos/12");
    }
}
