//! Read-only view of the introspected database catalog.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A database type as found by introspection (e.g., `pg_catalog.bytea`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PgType {
    pub id: String,
    pub name: String,
    pub namespace_name: String,
}

/// Type identity of a column: `(name, namespaceName)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PgTypeRef {
    pub name: String,
    pub namespace_name: String,
}

impl PgTypeRef {
    pub fn new(name: impl Into<String>, namespace_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace_name: namespace_name.into(),
        }
    }
}

/// Identity kind of a column (`attidentity`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnIdentity {
    #[default]
    None,
    /// `GENERATED ALWAYS AS IDENTITY`; never writable by clients
    Always,
    /// `GENERATED BY DEFAULT AS IDENTITY`
    ByDefault,
}

/// A table column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnAttribute {
    pub name: String,
    /// Namespace of the owning table
    pub namespace_name: String,
    #[serde(rename = "type")]
    pub type_: PgTypeRef,
    /// Marker tags (smart comment tags) attached to the column
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub identity: ColumnIdentity,
    /// Id of the owning table
    pub class_id: String,
    /// Name of the owning table
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ColumnAttribute {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn is_identity_always(&self) -> bool {
        self.identity == ColumnIdentity::Always
    }

    /// Fully-qualified name used in messages: `namespace.table.column`
    pub fn describe(&self) -> String {
        format!("{}.{}.{}", self.namespace_name, self.class_name, self.name)
    }
}

/// Relation kind (`relkind`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    #[default]
    Table,
    View,
    MaterializedView,
    CompositeType,
    ForeignTable,
}

/// A table (pg class) with its columns in attribute order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: String,
    pub name: String,
    pub namespace_name: String,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default)]
    pub attributes: Vec<ColumnAttribute>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Table {
    pub fn is_table(&self) -> bool {
        self.kind == ClassKind::Table
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace_name, self.name)
    }
}

/// Introspection results, grouped by kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntrospectionCatalog {
    #[serde(default)]
    pub types: Vec<PgType>,
    #[serde(default)]
    pub classes: Vec<Table>,
}

impl IntrospectionCatalog {
    pub fn find_type(&self, name: &str, namespace_name: &str) -> Option<&PgType> {
        self.types
            .iter()
            .find(|typ| typ.name == name && typ.namespace_name == namespace_name)
    }

    pub fn find_class(&self, id: &str) -> Option<&Table> {
        self.classes.iter().find(|class| class.id == id)
    }

    /// All attributes belonging to the given class, in attribute order
    pub fn attributes_for_class<'a>(
        &'a self,
        class_id: &'a str,
    ) -> impl Iterator<Item = &'a ColumnAttribute> + 'a {
        self.classes
            .iter()
            .flat_map(|class| class.attributes.iter())
            .filter(move |attr| attr.class_id == class_id)
    }
}
