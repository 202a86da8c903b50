//! Hooks and traits for schema-builder integration
//!
//! This module provides the trait interfaces through which the upload plugin
//! talks to the host schema-building framework without depending on it
//! directly. The host implements `SchemaBuild`, `Inflector` and
//! `FieldResolver`, and dispatches its lifecycle hooks to every registered
//! `SchemaPlugin`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{UploadError, UploadResult};
use crate::models::{ArgObject, ArgValue, ColumnAttribute, IntrospectionCatalog, Table};

/// Which generated input a column is being exposed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnAction {
    Base,
    Update,
    Create,
}

impl ColumnAction {
    pub fn for_scope(scope: &InputObjectScope) -> Self {
        if scope.is_pg_base_input {
            ColumnAction::Base
        } else if scope.is_pg_patch {
            ColumnAction::Update
        } else {
            ColumnAction::Create
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnAction::Base => "base",
            ColumnAction::Update => "update",
            ColumnAction::Create => "create",
        }
    }
}

/// Scope flags of an input object type under construction
#[derive(Debug, Clone, Default)]
pub struct InputObjectScope {
    pub type_name: String,
    pub is_pg_row_type: bool,
    pub is_pg_patch: bool,
    pub is_pg_base_input: bool,
    /// Table the input type was generated from, if any
    pub table: Option<Table>,
}

/// Scope flags of an object field under construction
#[derive(Debug, Clone, Default)]
pub struct ObjectFieldScope {
    pub field_name: String,
    pub is_root_mutation: bool,
    /// Target table of a generated CRUD mutation, if any
    pub table: Option<Table>,
}

/// Base naming rules supplied by the host
pub trait Inflector: Send + Sync {
    /// Field name of a column (e.g., `created_at` -> `createdAt`)
    fn column(&self, attr: &ColumnAttribute) -> String;
}

/// A naming extension. Takes the naming context explicitly.
pub type InflectionFn = fn(&dyn Inflector, &ColumnAttribute) -> String;

/// Named naming extensions contributed by plugins
#[derive(Default)]
pub struct InflectionExtensions {
    extensions: HashMap<String, InflectionFn>,
}

impl InflectionExtensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        inflection: InflectionFn,
    ) -> UploadResult<()> {
        let name = name.into();
        if self.extensions.contains_key(&name) {
            return Err(UploadError::InflectionAlreadyRegistered(name));
        }
        self.extensions.insert(name, inflection);
        Ok(())
    }

    /// Swap a registered extension for another, returning the previous one.
    ///
    /// Lets a later plugin rename what an earlier plugin named.
    pub fn replace(&mut self, name: &str, inflection: InflectionFn) -> UploadResult<InflectionFn> {
        match self.extensions.get_mut(name) {
            Some(current) => Ok(std::mem::replace(current, inflection)),
            None => Err(UploadError::Config(format!(
                "Inflection '{}' is not registered",
                name
            ))),
        }
    }

    pub fn get(&self, name: &str) -> Option<InflectionFn> {
        self.extensions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.extensions.contains_key(name)
    }
}

/// A custom scalar type
pub trait ScalarCodec: Send + Sync + Debug {
    fn name(&self) -> &str;

    fn description(&self) -> Option<&str>;

    /// Accept a value supplied through variables
    fn parse_value(&self, value: ArgValue) -> UploadResult<ArgValue>;

    /// Accept a literal written inline in a query document
    fn parse_literal(&self, literal: &serde_json::Value) -> UploadResult<ArgValue>;

    /// Produce the output representation
    fn serialize(&self, value: &ArgValue) -> UploadResult<serde_json::Value>;
}

/// Per-request context passed through to resolvers
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    /// Host-specific request data (e.g., JWT claims, pg settings)
    pub data: serde_json::Value,
}

impl RequestContext {
    pub fn new(data: serde_json::Value) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            data,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(serde_json::Value::Null)
    }
}

/// Information about the field being resolved
#[derive(Debug, Clone, Default)]
pub struct ResolveInfo {
    pub field_name: String,
    pub parent_type_name: String,
    pub return_type_name: String,
}

/// Field resolver
#[async_trait]
pub trait FieldResolver: Send + Sync {
    async fn resolve(
        &self,
        source: &ArgValue,
        args: ArgObject,
        context: &RequestContext,
        info: &ResolveInfo,
    ) -> UploadResult<ArgValue>;
}

/// Input field of an input object type
#[derive(Debug, Clone, Default)]
pub struct InputField {
    pub name: String,
    pub description: Option<String>,
    pub type_name: String,
    /// Column the field was generated from
    pub source_attribute: Option<ColumnAttribute>,
    pub is_upload_field: bool,
}

/// Ordered field set of an input object type
#[derive(Debug, Clone, Default)]
pub struct InputFieldMap {
    fields: Vec<InputField>,
}

impl InputFieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&InputField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputField> {
        self.fields.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    /// Append a field. The name must not already be present.
    pub fn extend_with(mut self, field: InputField) -> UploadResult<Self> {
        if self.contains(&field.name) {
            return Err(UploadError::Config(format!(
                "Input field '{}' is already defined",
                field.name
            )));
        }
        self.fields.push(field);
        Ok(self)
    }
}

impl FromIterator<InputField> for InputFieldMap {
    fn from_iter<T: IntoIterator<Item = InputField>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Output field configuration
#[derive(Clone, Default)]
pub struct FieldConfig {
    pub name: String,
    pub type_name: String,
    pub description: Option<String>,
    /// Declared resolver; `None` means "read the field from the source object"
    pub resolver: Option<Arc<dyn FieldResolver>>,
}

impl Debug for FieldConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldConfig")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("description", &self.description)
            .field("has_resolver", &self.resolver.is_some())
            .finish()
    }
}

/// Build-time capabilities of the host schema builder
pub trait SchemaBuild: Send + Sync {
    /// Register a named scalar type
    fn add_type(&mut self, scalar: Arc<dyn ScalarCodec>) -> UploadResult<()>;

    fn has_type(&self, name: &str) -> bool;

    /// Render the database type `type_id` as the schema type `type_name`
    /// wherever it appears. Resolved lazily by name.
    fn register_type_override(&mut self, type_id: &str, type_name: &str) -> UploadResult<()>;

    fn catalog(&self) -> &IntrospectionCatalog;

    /// Whether a column is exposed at all
    fn column_filter(&self, attr: &ColumnAttribute, scope: &InputObjectScope) -> bool;

    /// Whether a column is omitted for the given action
    fn omit(&self, attr: &ColumnAttribute, action: ColumnAction) -> bool;

    fn inflector(&self) -> &dyn Inflector;

    /// Naming extensions registered by plugins so far
    fn inflection_extensions(&self) -> &InflectionExtensions;
}

/// Lifecycle hooks a plugin can take part in.
///
/// Every hook defaults to passing its input through unchanged.
pub trait SchemaPlugin: Send + Sync + Debug {
    /// Plugin name/identifier
    fn name(&self) -> &str;

    /// Runs once at the start of schema construction
    fn build(&self, _build: &mut dyn SchemaBuild) -> UploadResult<()> {
        Ok(())
    }

    /// Contribute naming extensions
    fn inflection(&self, _extensions: &mut InflectionExtensions) -> UploadResult<()> {
        Ok(())
    }

    /// Runs once per input object type while its fields are being constructed
    fn input_object_fields(
        &self,
        fields: InputFieldMap,
        _build: &dyn SchemaBuild,
        _scope: &InputObjectScope,
    ) -> UploadResult<InputFieldMap> {
        Ok(fields)
    }

    /// Runs once per object field
    fn object_field(
        &self,
        field: FieldConfig,
        _build: &dyn SchemaBuild,
        _scope: &ObjectFieldScope,
    ) -> UploadResult<FieldConfig> {
        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_inflection(_inflector: &dyn Inflector, attr: &ColumnAttribute) -> String {
        attr.name.clone()
    }

    #[test]
    fn test_column_action_for_scope() {
        let mut scope = InputObjectScope::default();
        assert_eq!(ColumnAction::for_scope(&scope), ColumnAction::Create);
        scope.is_pg_patch = true;
        assert_eq!(ColumnAction::for_scope(&scope), ColumnAction::Update);
        scope.is_pg_base_input = true;
        assert_eq!(ColumnAction::for_scope(&scope), ColumnAction::Base);
    }

    #[test]
    fn test_inflection_extensions_reject_duplicates() {
        let mut extensions = InflectionExtensions::new();
        extensions.register("plain", noop_inflection).unwrap();
        assert!(extensions.contains("plain"));

        let err = extensions.register("plain", noop_inflection).unwrap_err();
        assert!(matches!(err, UploadError::InflectionAlreadyRegistered(name) if name == "plain"));
    }

    #[test]
    fn test_inflection_extensions_replace() {
        fn shout(_inflector: &dyn Inflector, attr: &ColumnAttribute) -> String {
            attr.name.to_uppercase()
        }

        struct Identity;
        impl Inflector for Identity {
            fn column(&self, attr: &ColumnAttribute) -> String {
                attr.name.clone()
            }
        }

        let attr: ColumnAttribute = serde_json::from_value(serde_json::json!({
            "name": "content",
            "namespaceName": "public",
            "type": { "name": "bytea", "namespaceName": "pg_catalog" },
            "classId": "42"
        }))
        .unwrap();

        let mut extensions = InflectionExtensions::new();
        assert!(extensions.replace("plain", shout).is_err());

        extensions.register("plain", noop_inflection).unwrap();
        let previous = extensions.replace("plain", shout).unwrap();
        assert_eq!(previous(&Identity, &attr), "content");

        let current = extensions.get("plain").unwrap();
        assert_eq!(current(&Identity, &attr), "CONTENT");
    }

    #[test]
    fn test_input_field_map_rejects_duplicates() {
        let fields = InputFieldMap::new()
            .extend_with(InputField {
                name: "title".to_string(),
                type_name: "String".to_string(),
                ..Default::default()
            })
            .unwrap();

        assert!(fields
            .clone()
            .extend_with(InputField {
                name: "title".to_string(),
                type_name: "String".to_string(),
                ..Default::default()
            })
            .is_err());
        assert_eq!(fields.names().collect::<Vec<_>>(), vec!["title"]);
    }
}
