//! Upload plugin
//!
//! Hooks the five upload components into the host schema builder:
//! the `Upload` scalar and type overrides at build time, the
//! `uploadColumn` naming extension, upload input fields on row input
//! types, and upload-resolving wrappers around CRUD mutation resolvers.

use pg_upload_core::config::DEFAULT_SCALAR_DESCRIPTION;
use pg_upload_core::{
    FieldConfig, InflectionExtensions, InputFieldMap, InputObjectScope, ObjectFieldScope,
    SchemaBuild, SchemaPlugin, UploadPluginConfig, UploadResult,
};

use crate::definition::{bind_definitions, UploadFieldDefinition};
use crate::input_fields::inject_upload_fields;
use crate::matcher::DefinitionMatcher;
use crate::mutation::{upload_resolvers_for_table, wrap_mutation_field};
use crate::naming::{upload_column, UPLOAD_COLUMN_INFLECTION};
use crate::registry::TransformRegistry;
use crate::scalar::register_upload_types;

pub const PLUGIN_NAME: &str = "upload-field";

#[derive(Debug, Clone)]
pub struct UploadPlugin {
    matcher: DefinitionMatcher,
    scalar_description: String,
}

impl UploadPlugin {
    pub fn new(definitions: Vec<UploadFieldDefinition>) -> Self {
        Self {
            matcher: DefinitionMatcher::new(definitions),
            scalar_description: DEFAULT_SCALAR_DESCRIPTION.to_string(),
        }
    }

    /// Build the plugin from configuration, binding each definition to the
    /// transform it names in `registry`
    pub async fn from_config(
        config: &UploadPluginConfig,
        registry: &TransformRegistry,
    ) -> UploadResult<Self> {
        let definitions = bind_definitions(config, registry).await?;
        Ok(Self {
            matcher: DefinitionMatcher::new(definitions),
            scalar_description: config.scalar_description.clone(),
        })
    }

    pub fn with_scalar_description(mut self, description: impl Into<String>) -> Self {
        self.scalar_description = description.into();
        self
    }

    pub fn matcher(&self) -> &DefinitionMatcher {
        &self.matcher
    }
}

impl SchemaPlugin for UploadPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn build(&self, build: &mut dyn SchemaBuild) -> UploadResult<()> {
        let overrides =
            register_upload_types(build, self.matcher.definitions(), &self.scalar_description)?;
        tracing::info!(
            definitions = self.matcher.definitions().len(),
            overrides,
            "Registered Upload scalar"
        );
        Ok(())
    }

    fn inflection(&self, extensions: &mut InflectionExtensions) -> UploadResult<()> {
        extensions.register(UPLOAD_COLUMN_INFLECTION, upload_column)
    }

    fn input_object_fields(
        &self,
        fields: InputFieldMap,
        build: &dyn SchemaBuild,
        scope: &InputObjectScope,
    ) -> UploadResult<InputFieldMap> {
        inject_upload_fields(fields, build, scope, &self.matcher)
    }

    fn object_field(
        &self,
        field: FieldConfig,
        build: &dyn SchemaBuild,
        scope: &ObjectFieldScope,
    ) -> UploadResult<FieldConfig> {
        let table = match scope.table.as_ref() {
            Some(table) if scope.is_root_mutation => table,
            _ => return Ok(field),
        };

        let resolvers = upload_resolvers_for_table(build, table, &self.matcher)?;
        tracing::debug!(
            field = %scope.field_name,
            table = %table.qualified_name(),
            upload_fields = resolvers.len(),
            "Wrapping mutation resolver"
        );

        Ok(wrap_mutation_field(field, &scope.field_name, resolvers))
    }
}
