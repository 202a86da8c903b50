//! Wraps generated CRUD mutation resolvers so pending uploads in the
//! arguments are resolved and substituted before the original resolver runs.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use std::collections::{BTreeSet, HashMap};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use pg_upload_core::{
    ArgObject, ArgValue, ErrorMetadata, FieldConfig, FieldResolver, LogLevel, PendingUpload,
    RequestContext, ResolveInfo, SchemaBuild, Table, UploadError, UploadResult, ValueKind,
};

use crate::matcher::DefinitionMatcher;
use crate::naming::upload_field_name;
use crate::transform::{UploadInfo, UploadResolveInfo, UploadTransform};

/// How to resolve one upload field of a mutation's target table
#[derive(Debug, Clone)]
pub struct UploadFieldResolver {
    pub transform: Arc<dyn UploadTransform>,
    pub tags: BTreeSet<String>,
    /// Database type name of the column
    pub type_name: String,
    /// Field name of the column the resolved value is written to
    pub original_field_name: String,
}

/// Upload resolvers keyed by upload field name (e.g., `contentUpload`)
pub type UploadResolvers = HashMap<String, UploadFieldResolver>;

/// Build the upload resolvers for every matched column of `table`
pub fn upload_resolvers_for_table(
    build: &dyn SchemaBuild,
    table: &Table,
    matcher: &DefinitionMatcher,
) -> UploadResult<UploadResolvers> {
    let mut resolvers = UploadResolvers::new();
    for attr in build.catalog().attributes_for_class(&table.id) {
        if let Some(definition) = matcher.match_attribute(attr)? {
            resolvers.insert(
                upload_field_name(build, attr),
                UploadFieldResolver {
                    transform: Arc::clone(&definition.resolve),
                    tags: attr.tags.clone(),
                    type_name: attr.type_.name.clone(),
                    original_field_name: build.inflector().column(attr),
                },
            );
        }
    }
    Ok(resolvers)
}

/// Resolver used when a field declares none: reads the field from the source
#[derive(Debug, Clone)]
pub struct DefaultFieldResolver {
    field_name: String,
}

impl DefaultFieldResolver {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
        }
    }
}

#[async_trait]
impl FieldResolver for DefaultFieldResolver {
    async fn resolve(
        &self,
        source: &ArgValue,
        _args: ArgObject,
        _context: &RequestContext,
        _info: &ResolveInfo,
    ) -> UploadResult<ArgValue> {
        Ok(source
            .as_object()
            .and_then(|obj| obj.get(&self.field_name))
            .cloned()
            .unwrap_or(ArgValue::Null))
    }
}

/// Step from a value to one of its children
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Key(String),
    Index(usize),
}

fn value_at<'a>(root: &'a ArgObject, path: &[PathSegment]) -> Option<&'a ArgValue> {
    let (PathSegment::Key(key), rest) = path.split_first()? else {
        return None;
    };

    let mut current = root.get(key)?;
    for segment in rest {
        current = match (segment, current) {
            (PathSegment::Key(key), ArgValue::Object(obj)) => obj.get(key)?,
            (PathSegment::Index(index), ArgValue::List(items)) => items.get(*index)?,
            _ => return None,
        };
    }
    Some(current)
}

fn object_at<'a>(root: &'a ArgObject, path: &[PathSegment]) -> Option<&'a ArgObject> {
    if path.is_empty() {
        return Some(root);
    }
    value_at(root, path)?.as_object()
}

fn object_at_mut<'a>(root: &'a mut ArgObject, path: &[PathSegment]) -> Option<&'a mut ArgObject> {
    let Some((first, rest)) = path.split_first() else {
        return Some(root);
    };
    let PathSegment::Key(key) = first else {
        return None;
    };

    let mut current = root.get_mut(key)?;
    for segment in rest {
        current = match (segment, current) {
            (PathSegment::Key(key), ArgValue::Object(obj)) => obj.get_mut(key)?,
            (PathSegment::Index(index), ArgValue::List(items)) => items.get_mut(*index)?,
            _ => return None,
        };
    }
    current.as_object_mut()
}

/// One depth-first pass over a call's argument tree.
///
/// The walk holds a path rather than a borrow of the current node, so each
/// transform can be handed the whole live tree. Keys of an object are
/// enumerated when the walk enters it; each value is read when its key is
/// reached, so a value replaced by an earlier substitution is seen in its
/// replaced form.
struct UploadWalk<'a> {
    resolvers: &'a UploadResolvers,
    context: &'a RequestContext,
    info: &'a ResolveInfo,
}

impl UploadWalk<'_> {
    fn visit_object<'s>(
        &'s self,
        root: &'s mut ArgObject,
        path: &'s mut Vec<PathSegment>,
    ) -> BoxFuture<'s, UploadResult<usize>> {
        async move {
            let keys: Vec<String> = match object_at(root, path) {
                Some(obj) => obj.keys().map(str::to_string).collect(),
                None => return Ok(0),
            };

            let mut resolved = 0;
            for key in keys {
                path.push(PathSegment::Key(key));
                resolved += self.visit_value(root, path).await?;
                path.pop();
            }
            Ok(resolved)
        }
        .boxed()
    }

    fn visit_value<'s>(
        &'s self,
        root: &'s mut ArgObject,
        path: &'s mut Vec<PathSegment>,
    ) -> BoxFuture<'s, UploadResult<usize>> {
        async move {
            let kind = match value_at(root, path) {
                Some(value) => value.kind(),
                None => return Ok(0),
            };

            match kind {
                ValueKind::Scalar => Ok(0),
                ValueKind::PendingFuture => self.substitute(root, path).await,
                ValueKind::Map => self.visit_object(root, path).await,
                ValueKind::Sequence => {
                    let len = value_at(root, path)
                        .and_then(ArgValue::as_list)
                        .map_or(0, |items| items.len());

                    let mut resolved = 0;
                    for index in 0..len {
                        path.push(PathSegment::Index(index));
                        resolved += self.visit_value(root, path).await?;
                        path.pop();
                    }
                    Ok(resolved)
                }
            }
        }
        .boxed()
    }

    /// Resolve the pending upload at `path` and write the transform's result
    /// next to it under the column's field name
    async fn substitute(&self, root: &mut ArgObject, path: &[PathSegment]) -> UploadResult<usize> {
        // list elements have no field name, so a pending element is never an upload site
        let Some((PathSegment::Key(key), parent)) = path.split_last() else {
            return Ok(0);
        };
        let Some(resolver) = self.resolvers.get(key) else {
            return Ok(0);
        };
        let pending: PendingUpload = match value_at(root, path) {
            Some(ArgValue::Pending(pending)) => pending.clone(),
            _ => return Ok(0),
        };

        let upload = pending.payload().await?;
        let upload_info = UploadResolveInfo {
            info: self.info.clone(),
            upload: UploadInfo {
                tags: resolver.tags.clone(),
                type_name: resolver.type_name.clone(),
            },
        };
        tracing::debug!(
            field = %self.info.field_name,
            upload_field = %key,
            target_field = %resolver.original_field_name,
            filename = %upload.filename,
            size = upload.size(),
            "Resolving upload"
        );

        let value = resolver
            .transform
            .resolve(upload, root, self.context, &upload_info)
            .await
            .map_err(UploadError::Transform)?;

        match object_at_mut(root, parent) {
            Some(parent) => {
                parent.insert(resolver.original_field_name.clone(), value);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

/// Resolve every pending upload in `args` and write each transform result
/// under the column's original field name.
///
/// A single depth-first pass with sibling keys in enumeration order; uploads
/// are awaited one after another as the walk reaches them. The upload field
/// key itself is left untouched.
pub async fn resolve_uploads(
    args: &mut ArgObject,
    resolvers: &UploadResolvers,
    context: &RequestContext,
    info: &ResolveInfo,
) -> UploadResult<usize> {
    let walk = UploadWalk {
        resolvers,
        context,
        info,
    };
    walk.visit_object(args, &mut Vec::new()).await
}

fn log_upload_failure(field_name: &str, err: &UploadError) {
    let code = err.error_code();
    match err.log_level() {
        LogLevel::Debug => {
            tracing::debug!(field = %field_name, code, error = %err, "Upload resolution failed")
        }
        LogLevel::Warn => {
            tracing::warn!(field = %field_name, code, error = %err, "Upload resolution failed")
        }
        LogLevel::Error => {
            tracing::error!(field = %field_name, code, error = %err, "Upload resolution failed")
        }
    }
}

/// Mutation resolver that resolves uploads before delegating
pub struct UploadMutationResolver {
    inner: Arc<dyn FieldResolver>,
    resolvers: Arc<UploadResolvers>,
}

impl UploadMutationResolver {
    pub fn new(inner: Arc<dyn FieldResolver>, resolvers: UploadResolvers) -> Self {
        Self {
            inner,
            resolvers: Arc::new(resolvers),
        }
    }

    pub fn upload_fields(&self) -> impl Iterator<Item = &str> {
        self.resolvers.keys().map(String::as_str)
    }
}

impl Debug for UploadMutationResolver {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("UploadMutationResolver")
            .field("upload_fields", &self.upload_fields().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl FieldResolver for UploadMutationResolver {
    async fn resolve(
        &self,
        source: &ArgValue,
        mut args: ArgObject,
        context: &RequestContext,
        info: &ResolveInfo,
    ) -> UploadResult<ArgValue> {
        let resolved = match resolve_uploads(&mut args, &self.resolvers, context, info).await {
            Ok(resolved) => resolved,
            Err(err) => {
                log_upload_failure(&info.field_name, &err);
                return Err(err);
            }
        };
        if resolved > 0 {
            tracing::debug!(field = %info.field_name, uploads = resolved, "Resolved uploads");
        }

        self.inner.resolve(source, args, context, info).await
    }
}

/// Wrap the resolver of a CRUD mutation field targeting `table`
pub fn wrap_mutation_field(
    field: FieldConfig,
    field_name: &str,
    resolvers: UploadResolvers,
) -> FieldConfig {
    let inner = field.resolver.clone().unwrap_or_else(|| {
        Arc::new(DefaultFieldResolver::new(field_name)) as Arc<dyn FieldResolver>
    });

    FieldConfig {
        resolver: Some(Arc::new(UploadMutationResolver::new(inner, resolvers))),
        ..field
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::UploadFieldDefinition;
    use crate::naming::{upload_column, UPLOAD_COLUMN_INFLECTION};
    use crate::test_helpers::{
        documents_catalog, documents_table, failing_transform, ready_pending, rejected_pending,
        MockSchemaBuilder, RecordingResolver, RecordingTransform,
    };
    use pg_upload_core::{ColumnAttribute, Inflector};
    use serde_json::json;

    fn resolvers_with(transform: Arc<dyn UploadTransform>) -> UploadResolvers {
        let matcher = DefinitionMatcher::new(vec![UploadFieldDefinition::for_type(
            "bytea",
            "pg_catalog",
            "Upload",
            transform,
        )]);
        let build = MockSchemaBuilder::new(documents_catalog());
        upload_resolvers_for_table(&build, &documents_table(), &matcher).unwrap()
    }

    fn wrapped_resolver(
        transform: Arc<dyn UploadTransform>,
        original: &RecordingResolver,
    ) -> Arc<dyn FieldResolver> {
        let field = FieldConfig {
            name: "createDocument".to_string(),
            resolver: Some(original.shared()),
            ..Default::default()
        };
        wrap_mutation_field(field, "createDocument", resolvers_with(transform))
            .resolver
            .unwrap()
    }

    fn info() -> ResolveInfo {
        ResolveInfo {
            field_name: "createDocument".to_string(),
            parent_type_name: "Mutation".to_string(),
            return_type_name: "CreateDocumentPayload".to_string(),
        }
    }

    #[test]
    fn test_upload_resolvers_for_table() {
        let resolvers = resolvers_with(RecordingTransform::new().shared());

        assert_eq!(resolvers.len(), 1);
        let resolver = &resolvers["contentUpload"];
        assert_eq!(resolver.original_field_name, "content");
        assert_eq!(resolver.type_name, "bytea");
    }

    #[tokio::test]
    async fn test_substitutes_under_original_field_name() {
        let transform = RecordingTransform::new();
        let resolvers = resolvers_with(transform.shared());
        let mut args = ArgObject::new().with(
            "input",
            ArgObject::new().with(
                "document",
                ArgObject::new()
                    .with("title", json!("Report"))
                    .with("contentUpload", ready_pending("report.pdf", "%PDF")),
            ),
        );

        let resolved = resolve_uploads(&mut args, &resolvers, &RequestContext::default(), &info())
            .await
            .unwrap();

        assert_eq!(resolved, 1);
        let document = args
            .get("input")
            .and_then(|input| input.as_object())
            .and_then(|input| input.get("document"))
            .and_then(|document| document.as_object())
            .unwrap();
        assert_eq!(document.get("content").unwrap().as_str(), Some("stored:report.pdf"));
        // stale upload key stays as it was
        assert_eq!(
            document.get("contentUpload").unwrap().kind(),
            ValueKind::PendingFuture
        );
        assert_eq!(transform.calls(), vec!["report.pdf".to_string()]);
        assert_eq!(transform.seen_type_names(), vec!["bytea".to_string()]);
    }

    #[test]
    fn test_upload_resolvers_follow_replaced_inflection() {
        fn file_column(inflector: &dyn Inflector, attr: &ColumnAttribute) -> String {
            format!("{}File", inflector.column(attr))
        }

        let mut build = MockSchemaBuilder::new(documents_catalog());
        build
            .register_inflection(UPLOAD_COLUMN_INFLECTION, upload_column)
            .unwrap();
        build
            .replace_inflection(UPLOAD_COLUMN_INFLECTION, file_column)
            .unwrap();
        let matcher = DefinitionMatcher::new(vec![UploadFieldDefinition::for_type(
            "bytea",
            "pg_catalog",
            "Upload",
            RecordingTransform::new().shared(),
        )]);

        let resolvers = upload_resolvers_for_table(&build, &documents_table(), &matcher).unwrap();
        assert_eq!(resolvers.keys().collect::<Vec<_>>(), vec!["contentFile"]);
        assert_eq!(resolvers["contentFile"].original_field_name, "content");
    }

    #[tokio::test]
    async fn test_subtree_replaced_by_substitution_is_not_walked() {
        let transform = RecordingTransform::new();
        let resolvers = resolvers_with(transform.shared());
        let mut args = ArgObject::new()
            .with("contentUpload", ready_pending("a.pdf", "a"))
            .with(
                "content",
                ArgObject::new().with(
                    "nested",
                    ArgObject::new().with("contentUpload", ready_pending("b.pdf", "b")),
                ),
            );

        let resolved = resolve_uploads(&mut args, &resolvers, &RequestContext::default(), &info())
            .await
            .unwrap();

        assert_eq!(resolved, 1);
        assert_eq!(transform.calls(), vec!["a.pdf".to_string()]);
        assert_eq!(args.get("content").unwrap().as_str(), Some("stored:a.pdf"));
    }

    #[tokio::test]
    async fn test_upload_nested_two_levels_deep_is_resolved() {
        let transform = RecordingTransform::new();
        let resolvers = resolvers_with(transform.shared());
        let mut args = ArgObject::new().with(
            "input",
            ArgObject::new().with(
                "patch",
                ArgObject::new().with("contentUpload", ready_pending("deep.pdf", "d")),
            ),
        );

        let resolved = resolve_uploads(&mut args, &resolvers, &RequestContext::default(), &info())
            .await
            .unwrap();

        assert_eq!(resolved, 1);
        assert_eq!(transform.calls(), vec!["deep.pdf".to_string()]);
    }

    #[tokio::test]
    async fn test_walks_lists_of_row_inputs() {
        let transform = RecordingTransform::new();
        let resolvers = resolvers_with(transform.shared());
        let mut args = ArgObject::new().with(
            "documents",
            ArgValue::List(vec![
                ArgValue::from(ArgObject::new().with("contentUpload", ready_pending("a.pdf", "a"))),
                ArgValue::from(json!({"title": "no file"})),
                ArgValue::from(ArgObject::new().with("contentUpload", ready_pending("b.pdf", "b"))),
            ]),
        );

        let resolved = resolve_uploads(&mut args, &resolvers, &RequestContext::default(), &info())
            .await
            .unwrap();

        assert_eq!(resolved, 2);
        assert_eq!(transform.calls(), vec!["a.pdf".to_string(), "b.pdf".to_string()]);
        let items = args.get("documents").unwrap().as_list().unwrap();
        assert_eq!(
            items[0].as_object().unwrap().get("content").unwrap().as_str(),
            Some("stored:a.pdf")
        );
        assert!(items[1].as_object().unwrap().get("content").is_none());
        assert_eq!(
            items[2].as_object().unwrap().get("content").unwrap().as_str(),
            Some("stored:b.pdf")
        );
    }

    #[tokio::test]
    async fn test_ignores_pending_values_under_unknown_keys() {
        let transform = RecordingTransform::new();
        let resolvers = resolvers_with(transform.shared());
        let mut args = ArgObject::new()
            .with("attachment", ready_pending("x.bin", "x"))
            .with("title", json!("plain"));

        let resolved = resolve_uploads(&mut args, &resolvers, &RequestContext::default(), &info())
            .await
            .unwrap();

        assert_eq!(resolved, 0);
        assert!(transform.calls().is_empty());
        assert_eq!(args.keys().collect::<Vec<_>>(), vec!["attachment", "title"]);
    }

    #[tokio::test]
    async fn test_transform_failure_propagates_verbatim() {
        let resolvers = resolvers_with(failing_transform("bucket unavailable"));
        let mut args = ArgObject::new().with("contentUpload", ready_pending("a.pdf", "a"));

        let err = resolve_uploads(&mut args, &resolvers, &RequestContext::default(), &info())
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Transform(_)));
        assert_eq!(err.to_string(), "bucket unavailable");
        assert!(args.get("content").is_none());
    }

    #[tokio::test]
    async fn test_wrapped_resolver_calls_original_after_substitution() {
        let transform = RecordingTransform::new();
        let original = RecordingResolver::new(json!({"document": {"id": 1}}));
        let field = FieldConfig {
            name: "createDocument".to_string(),
            type_name: "CreateDocumentPayload".to_string(),
            description: None,
            resolver: Some(original.shared()),
        };
        let wrapped =
            wrap_mutation_field(field, "createDocument", resolvers_with(transform.shared()));
        let args = ArgObject::new().with(
            "input",
            ArgObject::new().with("contentUpload", ready_pending("a.pdf", "a")),
        );

        let result = wrapped
            .resolver
            .unwrap()
            .resolve(&ArgValue::Null, args, &RequestContext::default(), &info())
            .await
            .unwrap();

        assert_eq!(result.to_json().unwrap(), json!({"document": {"id": 1}}));
        let seen = original.calls();
        assert_eq!(seen.len(), 1);
        let input = seen[0].get("input").unwrap().as_object().unwrap();
        assert_eq!(input.get("content").unwrap().as_str(), Some("stored:a.pdf"));
    }

    #[tokio::test]
    async fn test_payload_failure_skips_original_resolver() {
        let transform = RecordingTransform::new();
        let original = RecordingResolver::new(json!(true));
        let resolver = wrapped_resolver(transform.shared(), &original);
        let args = ArgObject::new().with(
            "input",
            ArgObject::new().with("contentUpload", rejected_pending("connection reset")),
        );

        let err = resolver
            .resolve(&ArgValue::Null, args, &RequestContext::default(), &info())
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Payload(_)));
        assert!(err.to_string().contains("connection reset"));
        assert!(transform.calls().is_empty());
        assert!(original.calls().is_empty());
    }

    #[tokio::test]
    async fn test_transform_failure_skips_original_resolver() {
        let original = RecordingResolver::new(json!(true));
        let resolver = wrapped_resolver(failing_transform("bucket unavailable"), &original);
        let args = ArgObject::new().with(
            "input",
            ArgObject::new().with("contentUpload", ready_pending("a.pdf", "a")),
        );

        let err = resolver
            .resolve(&ArgValue::Null, args, &RequestContext::default(), &info())
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Transform(_)));
        assert_eq!(err.to_string(), "bucket unavailable");
        assert!(original.calls().is_empty());
    }

    #[tokio::test]
    async fn test_original_resolver_failure_is_returned() {
        let transform = RecordingTransform::new();
        let original = RecordingResolver::failing("insert violates not-null constraint");
        let resolver = wrapped_resolver(transform.shared(), &original);
        let args = ArgObject::new().with(
            "input",
            ArgObject::new().with("contentUpload", ready_pending("a.pdf", "a")),
        );

        let err = resolver
            .resolve(&ArgValue::Null, args, &RequestContext::default(), &info())
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Resolver(_)));
        assert_eq!(err.to_string(), "insert violates not-null constraint");
        assert_eq!(transform.calls(), vec!["a.pdf".to_string()]);
        assert_eq!(original.calls().len(), 1);
    }

    #[test]
    fn test_mutation_resolver_lists_upload_fields() {
        let resolver = UploadMutationResolver::new(
            RecordingResolver::new(json!(null)).shared(),
            resolvers_with(RecordingTransform::new().shared()),
        );

        assert_eq!(resolver.upload_fields().collect::<Vec<_>>(), vec!["contentUpload"]);
        assert!(format!("{resolver:?}").contains("contentUpload"));
    }

    #[tokio::test]
    async fn test_default_resolver_reads_source_field() {
        let field = FieldConfig {
            name: "createDocument".to_string(),
            ..Default::default()
        };
        let wrapped = wrap_mutation_field(field, "createDocument", UploadResolvers::new());
        let source = ArgValue::from(json!({"createDocument": {"ok": true}}));

        let result = wrapped
            .resolver
            .unwrap()
            .resolve(&source, ArgObject::new(), &RequestContext::default(), &info())
            .await
            .unwrap();

        assert_eq!(result.to_json().unwrap(), json!({"ok": true}));
    }
}
