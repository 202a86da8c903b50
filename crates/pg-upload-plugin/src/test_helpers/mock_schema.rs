//! In-memory schema host
//!
//! Implements the host's build capabilities and dispatches plugin hooks the
//! way the schema builder does, without generating a real schema.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use pg_upload_core::{
    ArgObject, ArgValue, ColumnAction, ColumnAttribute, FieldConfig, InflectionExtensions,
    InflectionFn, Inflector, InputFieldMap, InputObjectScope, IntrospectionCatalog,
    ObjectFieldScope, ScalarCodec, SchemaBuild, SchemaPlugin, UploadError, UploadResult,
};

/// `snake_case` column names to `camelCase` field names
#[derive(Debug, Clone, Copy, Default)]
pub struct CamelCaseInflector;

impl Inflector for CamelCaseInflector {
    fn column(&self, attr: &ColumnAttribute) -> String {
        let mut name = String::with_capacity(attr.name.len());
        for (index, part) in attr.name.split('_').filter(|part| !part.is_empty()).enumerate() {
            if index == 0 {
                name.push_str(part);
                continue;
            }
            let mut chars = part.chars();
            if let Some(first) = chars.next() {
                name.extend(first.to_uppercase());
                name.push_str(chars.as_str());
            }
        }
        name
    }
}

/// Schema builder double recording everything plugins register
pub struct MockSchemaBuilder {
    catalog: IntrospectionCatalog,
    types: HashMap<String, Arc<dyn ScalarCodec>>,
    overrides: HashMap<String, String>,
    filtered_columns: HashSet<String>,
    omitted_columns: HashSet<(String, ColumnAction)>,
    inflector: CamelCaseInflector,
    extensions: InflectionExtensions,
}

impl MockSchemaBuilder {
    pub fn new(catalog: IntrospectionCatalog) -> Self {
        Self {
            catalog,
            types: HashMap::new(),
            overrides: HashMap::new(),
            filtered_columns: HashSet::new(),
            omitted_columns: HashSet::new(),
            inflector: CamelCaseInflector,
            extensions: InflectionExtensions::new(),
        }
    }

    /// Exclude a column everywhere
    pub fn with_filtered_column(mut self, column: &str) -> Self {
        self.filtered_columns.insert(column.to_string());
        self
    }

    /// Omit a column for one action (like an `@omit update` smart tag)
    pub fn with_omitted_column(mut self, column: &str, action: ColumnAction) -> Self {
        self.omitted_columns.insert((column.to_string(), action));
        self
    }

    /// Run the build-time hooks of `plugin`
    pub fn install(&mut self, plugin: &dyn SchemaPlugin) -> UploadResult<()> {
        plugin.build(self)?;
        plugin.inflection(&mut self.extensions)?;
        tracing::debug!(plugin = plugin.name(), "Installed plugin");
        Ok(())
    }

    pub fn build_input_fields(
        &self,
        plugin: &dyn SchemaPlugin,
        fields: InputFieldMap,
        scope: &InputObjectScope,
    ) -> UploadResult<InputFieldMap> {
        plugin.input_object_fields(fields, self, scope)
    }

    pub fn build_object_field(
        &self,
        plugin: &dyn SchemaPlugin,
        field: FieldConfig,
        scope: &ObjectFieldScope,
    ) -> UploadResult<FieldConfig> {
        plugin.object_field(field, self, scope)
    }

    /// Coerce client variables for an input type: values of scalar-typed
    /// fields go through the scalar's `parse_value`
    pub fn coerce_input(
        &self,
        fields: &InputFieldMap,
        input: ArgObject,
    ) -> UploadResult<ArgObject> {
        let mut coerced = ArgObject::new();
        for (key, value) in input.iter() {
            let value = match fields.get(key).and_then(|field| self.types.get(&field.type_name)) {
                Some(scalar) if !value.is_null() => scalar.parse_value(value.clone())?,
                _ => value.clone(),
            };
            coerced.insert(key.clone(), value);
        }
        Ok(coerced)
    }

    pub fn register_inflection(
        &mut self,
        name: &str,
        inflection: InflectionFn,
    ) -> UploadResult<()> {
        self.extensions.register(name, inflection)
    }

    /// Swap a naming extension, as a later plugin would
    pub fn replace_inflection(
        &mut self,
        name: &str,
        inflection: InflectionFn,
    ) -> UploadResult<()> {
        self.extensions.replace(name, inflection).map(|_| ())
    }

    /// Apply a registered naming extension
    pub fn inflect(&self, extension: &str, attr: &ColumnAttribute) -> Option<String> {
        self.extensions
            .get(extension)
            .map(|inflection| inflection(&self.inflector, attr))
    }

    pub fn has_type_named(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn scalar(&self, name: &str) -> Option<Arc<dyn ScalarCodec>> {
        self.types.get(name).cloned()
    }

    pub fn scalar_description(&self, name: &str) -> Option<String> {
        self.types
            .get(name)
            .and_then(|scalar| scalar.description().map(str::to_string))
    }

    pub fn type_override(&self, type_id: &str) -> Option<&str> {
        self.overrides.get(type_id).map(String::as_str)
    }

    /// Parse a value through a registered scalar
    pub fn parse_scalar(&self, name: &str, value: ArgValue) -> UploadResult<ArgValue> {
        self.types
            .get(name)
            .ok_or_else(|| UploadError::TypeNotFound(name.to_string()))?
            .parse_value(value)
    }
}

impl SchemaBuild for MockSchemaBuilder {
    fn add_type(&mut self, scalar: Arc<dyn ScalarCodec>) -> UploadResult<()> {
        let name = scalar.name().to_string();
        if self.types.contains_key(&name) {
            return Err(UploadError::Config(format!(
                "Type '{}' is already registered",
                name
            )));
        }
        self.types.insert(name, scalar);
        Ok(())
    }

    fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    fn register_type_override(&mut self, type_id: &str, type_name: &str) -> UploadResult<()> {
        self.overrides
            .insert(type_id.to_string(), type_name.to_string());
        Ok(())
    }

    fn catalog(&self) -> &IntrospectionCatalog {
        &self.catalog
    }

    fn column_filter(&self, attr: &ColumnAttribute, _scope: &InputObjectScope) -> bool {
        !self.filtered_columns.contains(&attr.name)
    }

    fn omit(&self, attr: &ColumnAttribute, action: ColumnAction) -> bool {
        self.omitted_columns
            .contains(&(attr.name.clone(), action))
    }

    fn inflector(&self) -> &dyn Inflector {
        &self.inflector
    }

    fn inflection_extensions(&self) -> &InflectionExtensions {
        &self.extensions
    }
}
