//! Resolves which upload definition, if any, applies to a column

use std::sync::Arc;

use pg_upload_core::{ColumnAttribute, UploadError, UploadResult};

use crate::definition::UploadFieldDefinition;

/// Matches columns against the configured definitions.
///
/// A column matches at most one definition. More than one match is a
/// configuration bug and is reported, never settled by list order.
#[derive(Debug, Clone)]
pub struct DefinitionMatcher {
    definitions: Arc<[UploadFieldDefinition]>,
}

impl DefinitionMatcher {
    pub fn new(definitions: Vec<UploadFieldDefinition>) -> Self {
        Self {
            definitions: definitions.into(),
        }
    }

    pub fn definitions(&self) -> &[UploadFieldDefinition] {
        &self.definitions
    }

    /// The single definition matching `attr`, or `None` if the column is not
    /// upload-capable
    pub fn match_attribute(
        &self,
        attr: &ColumnAttribute,
    ) -> UploadResult<Option<&UploadFieldDefinition>> {
        let mut matches = self.definitions.iter().filter(|def| def.matches(attr));

        let first = matches.next();
        let extra = matches.count();
        if extra > 0 {
            return Err(UploadError::AmbiguousUploadDefinition {
                attribute: attr.describe(),
                count: extra + 1,
            });
        }

        Ok(first)
    }
}
