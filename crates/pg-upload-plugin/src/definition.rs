//! Upload field definitions bound to their transforms

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use pg_upload_core::{ColumnAttribute, UploadPluginConfig, UploadResult};

use crate::registry::TransformRegistry;
use crate::transform::UploadTransform;

/// Decides which columns become upload-capable and how their uploads resolve.
///
/// Matches either a fully-qualified database type `(name, namespace_name)`
/// or any column carrying the marker `tag`.
#[derive(Clone)]
pub struct UploadFieldDefinition {
    pub name: Option<String>,
    pub namespace_name: Option<String>,
    pub tag: Option<String>,
    /// Schema type the upload resolves into
    pub type_name: String,
    pub resolve: Arc<dyn UploadTransform>,
}

impl UploadFieldDefinition {
    /// Definition matching columns of the database type `namespace_name.name`
    pub fn for_type(
        name: impl Into<String>,
        namespace_name: impl Into<String>,
        type_name: impl Into<String>,
        resolve: Arc<dyn UploadTransform>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            namespace_name: Some(namespace_name.into()),
            tag: None,
            type_name: type_name.into(),
            resolve,
        }
    }

    /// Definition matching columns carrying `tag`
    pub fn for_tag(
        tag: impl Into<String>,
        type_name: impl Into<String>,
        resolve: Arc<dyn UploadTransform>,
    ) -> Self {
        Self {
            name: None,
            namespace_name: None,
            tag: Some(tag.into()),
            type_name: type_name.into(),
            resolve,
        }
    }

    /// `(name, namespace_name)` when the definition fully qualifies a type
    pub fn qualified_type(&self) -> Option<(&str, &str)> {
        match (self.name.as_deref(), self.namespace_name.as_deref()) {
            (Some(name), Some(namespace)) if !name.is_empty() && !namespace.is_empty() => {
                Some((name, namespace))
            }
            _ => None,
        }
    }

    pub fn matches(&self, attr: &ColumnAttribute) -> bool {
        let type_matched = self.qualified_type().is_some_and(|(name, namespace)| {
            attr.type_.name == name && attr.type_.namespace_name == namespace
        });
        let tag_matched = self.tag.as_deref().is_some_and(|tag| attr.has_tag(tag));

        type_matched || tag_matched
    }
}

impl Debug for UploadFieldDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("UploadFieldDefinition")
            .field("name", &self.name)
            .field("namespace_name", &self.namespace_name)
            .field("tag", &self.tag)
            .field("type_name", &self.type_name)
            .field("resolve", &self.resolve)
            .finish()
    }
}

/// Bind configured definitions to the transforms they name
pub async fn bind_definitions(
    config: &UploadPluginConfig,
    registry: &TransformRegistry,
) -> UploadResult<Vec<UploadFieldDefinition>> {
    config.validate()?;

    let mut definitions = Vec::with_capacity(config.definitions.len());
    for spec in &config.definitions {
        let resolve = registry.get(&spec.resolve).await?;
        definitions.push(UploadFieldDefinition {
            name: spec.name.clone(),
            namespace_name: spec.namespace_name.clone(),
            tag: spec.tag.clone(),
            type_name: spec.type_name.clone(),
            resolve,
        });
    }

    Ok(definitions)
}
