//! The `Upload` scalar and database type overrides

use std::sync::Arc;

use pg_upload_core::{ArgValue, ScalarCodec, SchemaBuild, UploadError, UploadResult};

use crate::definition::UploadFieldDefinition;

pub const UPLOAD_TYPE_NAME: &str = "Upload";

/// Input-only scalar carrying a client-submitted file.
///
/// Accepts only deferred uploads supplied through variables. It has no
/// literal syntax and never appears in output position.
#[derive(Debug, Clone)]
pub struct UploadScalar {
    description: String,
}

impl UploadScalar {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

impl ScalarCodec for UploadScalar {
    fn name(&self) -> &str {
        UPLOAD_TYPE_NAME
    }

    fn description(&self) -> Option<&str> {
        Some(&self.description)
    }

    fn parse_value(&self, value: ArgValue) -> UploadResult<ArgValue> {
        match value {
            ArgValue::Upload(upload) => Ok(ArgValue::Pending(upload.into_pending())),
            _ => Err(UploadError::InvalidUploadValue),
        }
    }

    fn parse_literal(&self, _literal: &serde_json::Value) -> UploadResult<ArgValue> {
        Err(UploadError::UnsupportedLiteral)
    }

    fn serialize(&self, _value: &ArgValue) -> UploadResult<serde_json::Value> {
        Err(UploadError::UnsupportedSerialization)
    }
}

/// Register the `Upload` scalar, then override every fully-qualified
/// database type named by a definition with the definition's schema type.
///
/// Returns the number of overrides registered.
pub fn register_upload_types(
    build: &mut dyn SchemaBuild,
    definitions: &[UploadFieldDefinition],
    description: &str,
) -> UploadResult<usize> {
    build.add_type(Arc::new(UploadScalar::new(description)))?;

    let mut overrides = 0;
    for definition in definitions {
        // tag-only definitions
        let Some((name, namespace)) = definition.qualified_type() else {
            continue;
        };

        let type_id = match build.catalog().find_type(name, namespace) {
            Some(typ) => typ.id.clone(),
            None => {
                tracing::warn!(
                    type_name = %name,
                    namespace = %namespace,
                    "Upload definition names a database type that introspection did not find"
                );
                continue;
            }
        };

        build.register_type_override(&type_id, &definition.type_name)?;
        tracing::debug!(
            type_id = %type_id,
            database_type = %format!("{}.{}", namespace, name),
            schema_type = %definition.type_name,
            schema_type_known = build.has_type(&definition.type_name),
            "Registered upload type override"
        );
        overrides += 1;
    }

    Ok(overrides)
}
