//! Upload Field Plugin
//!
//! This crate adds file-upload capability to the mutation inputs of a schema
//! generated from database introspection. Columns matched by an upload
//! definition gain a `<column>Upload` input field of the `Upload` scalar, and
//! CRUD mutation resolvers are wrapped so pending uploads are resolved by the
//! definition's transform and substituted before the original resolver runs.

pub mod definition;
pub mod input_fields;
pub mod matcher;
pub mod mutation;
pub mod naming;
pub mod plugin;
pub mod registry;
pub mod scalar;
pub mod transform;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_helpers;

// Re-export commonly used types
pub use definition::{bind_definitions, UploadFieldDefinition};
pub use input_fields::inject_upload_fields;
pub use matcher::DefinitionMatcher;
pub use mutation::{
    resolve_uploads, upload_resolvers_for_table, wrap_mutation_field, DefaultFieldResolver,
    UploadFieldResolver, UploadMutationResolver, UploadResolvers,
};
pub use naming::{upload_column, UPLOAD_COLUMN_INFLECTION, UPLOAD_FIELD_SUFFIX};
pub use plugin::{UploadPlugin, PLUGIN_NAME};
pub use registry::TransformRegistry;
pub use scalar::{register_upload_types, UploadScalar, UPLOAD_TYPE_NAME};
pub use transform::{FnTransform, UploadInfo, UploadResolveInfo, UploadTransform};
