//! Configuration module
//!
//! Upload field definitions are fixed configuration, loaded once before the
//! schema is built. Each entry names the transform that resolves uploads for
//! the matched columns; transforms themselves are registered in code.

use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{UploadError, UploadResult};

/// Environment variable holding the definitions as a JSON array
pub const DEFINITIONS_ENV_VAR: &str = "PG_UPLOAD_FIELD_DEFINITIONS";
/// Environment variable overriding the `Upload` scalar description
pub const SCALAR_DESCRIPTION_ENV_VAR: &str = "PG_UPLOAD_SCALAR_DESCRIPTION";

pub const DEFAULT_SCALAR_DESCRIPTION: &str = "The `Upload` scalar type represents a file upload.";

/// One upload field definition as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFieldSpec {
    /// Database type name (e.g., `bytea`); requires `namespace_name`
    #[serde(default)]
    pub name: Option<String>,
    /// Database type namespace (e.g., `pg_catalog`); requires `name`
    #[serde(default)]
    pub namespace_name: Option<String>,
    /// Marker tag matching any column that carries it
    #[serde(default)]
    pub tag: Option<String>,
    /// Schema type the upload resolves into
    #[serde(rename = "type")]
    pub type_name: String,
    /// Name of the registered transform
    pub resolve: String,
}

impl UploadFieldSpec {
    /// `(name, namespace)` when both are given
    pub fn qualified_type(&self) -> Option<(&str, &str)> {
        match (self.name.as_deref(), self.namespace_name.as_deref()) {
            (Some(name), Some(namespace)) if !name.is_empty() && !namespace.is_empty() => {
                Some((name, namespace))
            }
            _ => None,
        }
    }

    fn validate(&self, index: usize) -> UploadResult<()> {
        let has_tag = self.tag.as_deref().is_some_and(|tag| !tag.is_empty());
        if self.qualified_type().is_none() && !has_tag {
            return Err(UploadError::Config(format!(
                "Upload field definition #{} must set both name and namespaceName, or a tag",
                index
            )));
        }
        if self.type_name.is_empty() {
            return Err(UploadError::Config(format!(
                "Upload field definition #{} has an empty type",
                index
            )));
        }
        if self.resolve.is_empty() {
            return Err(UploadError::Config(format!(
                "Upload field definition #{} has an empty resolve transform name",
                index
            )));
        }
        Ok(())
    }
}

/// Plugin configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPluginConfig {
    /// Ordered definitions; order never decides between matches
    #[serde(default, alias = "uploadFieldDefinitions")]
    pub definitions: Vec<UploadFieldSpec>,
    #[serde(default = "default_scalar_description")]
    pub scalar_description: String,
}

fn default_scalar_description() -> String {
    DEFAULT_SCALAR_DESCRIPTION.to_string()
}

impl Default for UploadPluginConfig {
    fn default() -> Self {
        Self {
            definitions: Vec::new(),
            scalar_description: default_scalar_description(),
        }
    }
}

impl UploadPluginConfig {
    pub fn new(definitions: Vec<UploadFieldSpec>) -> Self {
        Self {
            definitions,
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> UploadResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the environment (a `.env` file is honoured)
    pub fn from_env() -> UploadResult<Self> {
        let _ = dotenvy::dotenv();

        let definitions = match env::var(DEFINITIONS_ENV_VAR) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(env::VarError::NotPresent) => Vec::new(),
            Err(e) => {
                return Err(UploadError::Config(format!(
                    "{} is not valid unicode: {}",
                    DEFINITIONS_ENV_VAR, e
                )))
            }
        };
        let scalar_description = env::var(SCALAR_DESCRIPTION_ENV_VAR)
            .unwrap_or_else(|_| default_scalar_description());

        let config = Self {
            definitions,
            scalar_description,
        };
        config.validate()?;
        tracing::debug!(
            definitions = config.definitions.len(),
            "Loaded upload field definitions from environment"
        );
        Ok(config)
    }

    pub fn validate(&self) -> UploadResult<()> {
        for (index, spec) in self.definitions.iter().enumerate() {
            spec.validate(index)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_str() {
        let config = UploadPluginConfig::from_json_str(
            r#"{
                "uploadFieldDefinitions": [
                    { "name": "bytea", "namespaceName": "pg_catalog", "type": "Upload", "resolve": "storeFile" },
                    { "tag": "upload", "type": "String", "resolve": "storeUrl" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.definitions.len(), 2);
        assert_eq!(
            config.definitions[0].qualified_type(),
            Some(("bytea", "pg_catalog"))
        );
        assert_eq!(config.definitions[1].tag.as_deref(), Some("upload"));
        assert_eq!(config.scalar_description, DEFAULT_SCALAR_DESCRIPTION);
    }

    #[test]
    fn test_validate_requires_type_or_tag() {
        let config = UploadPluginConfig::new(vec![UploadFieldSpec {
            name: Some("bytea".to_string()),
            namespace_name: None,
            tag: None,
            type_name: "Upload".to_string(),
            resolve: "storeFile".to_string(),
        }]);

        let err = config.validate().unwrap_err();
        assert!(matches!(err, UploadError::Config(msg) if msg.contains("#0")));
    }

    #[test]
    fn test_validate_requires_resolve() {
        let config = UploadPluginConfig::new(vec![UploadFieldSpec {
            name: None,
            namespace_name: None,
            tag: Some("upload".to_string()),
            type_name: "String".to_string(),
            resolve: String::new(),
        }]);

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = UploadPluginConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, UploadError::Config(_)));
    }
}
