//! Upload Core Library
//!
//! This crate provides the error type, configuration, introspection and value
//! models, and the host schema-builder hook traits shared by the upload
//! field plugin.

pub mod config;
pub mod error;
pub mod hooks;
pub mod models;

// Re-export commonly used types
pub use config::{UploadFieldSpec, UploadPluginConfig};
pub use error::{ErrorMetadata, ErrorPhase, LogLevel, PayloadError, UploadError, UploadResult};
pub use hooks::{
    ColumnAction, FieldConfig, FieldResolver, InflectionExtensions, InflectionFn, Inflector,
    InputField, InputFieldMap, InputObjectScope, ObjectFieldScope, RequestContext, ResolveInfo,
    ScalarCodec, SchemaBuild, SchemaPlugin,
};
pub use models::{
    ArgObject, ArgValue, ClassKind, ColumnAttribute, ColumnIdentity, DeferredUpload,
    IntrospectionCatalog, PendingUpload, PgType, PgTypeRef, Table, UploadPayload, ValueKind,
};
