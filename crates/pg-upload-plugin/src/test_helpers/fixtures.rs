//! Fixtures: a `documents` table, uploads, transforms and resolvers

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use pg_upload_core::{
    ArgObject, ArgValue, ClassKind, ColumnAttribute, ColumnIdentity, DeferredUpload,
    FieldResolver, InputObjectScope, IntrospectionCatalog, PayloadError, PendingUpload, PgType,
    PgTypeRef, RequestContext, ResolveInfo, Table, UploadError, UploadPayload, UploadResult,
};

use crate::transform::{FnTransform, UploadInfo, UploadResolveInfo, UploadTransform};

pub const DOCUMENTS_CLASS_ID: &str = "42";
pub const BYTEA_TYPE_ID: &str = "17";

fn column(name: &str, type_name: &str) -> ColumnAttribute {
    ColumnAttribute {
        name: name.to_string(),
        namespace_name: "public".to_string(),
        type_: PgTypeRef::new(type_name, "pg_catalog"),
        tags: BTreeSet::new(),
        identity: ColumnIdentity::None,
        class_id: DOCUMENTS_CLASS_ID.to_string(),
        class_name: "documents".to_string(),
        description: None,
    }
}

pub fn bytea_column(name: &str) -> ColumnAttribute {
    column(name, "bytea")
}

pub fn text_column(name: &str) -> ColumnAttribute {
    column(name, "text")
}

/// `public.documents (id int4 identity, content bytea, title text)`
pub fn documents_table() -> Table {
    let mut id = column("id", "int4");
    id.identity = ColumnIdentity::Always;
    let mut content = bytea_column("content");
    content.description = Some("Document body".to_string());

    Table {
        id: DOCUMENTS_CLASS_ID.to_string(),
        name: "documents".to_string(),
        namespace_name: "public".to_string(),
        kind: ClassKind::Table,
        attributes: vec![id, content, text_column("title")],
        description: None,
    }
}

pub fn documents_catalog() -> IntrospectionCatalog {
    let pg_type = |id: &str, name: &str| PgType {
        id: id.to_string(),
        name: name.to_string(),
        namespace_name: "pg_catalog".to_string(),
    };

    IntrospectionCatalog {
        types: vec![
            pg_type(BYTEA_TYPE_ID, "bytea"),
            pg_type("23", "int4"),
            pg_type("25", "text"),
        ],
        classes: vec![documents_table()],
    }
}

/// Scope of the create input type generated for `table`
pub fn row_input_scope(type_name: &str, table: Table) -> InputObjectScope {
    InputObjectScope {
        type_name: type_name.to_string(),
        is_pg_row_type: true,
        is_pg_patch: false,
        is_pg_base_input: false,
        table: Some(table),
    }
}

pub fn deferred_upload(filename: &str, content: &'static str) -> DeferredUpload {
    DeferredUpload::ready(UploadPayload::new(filename, "application/octet-stream", content))
}

pub fn ready_pending(filename: &str, content: &'static str) -> PendingUpload {
    deferred_upload(filename, content).into_pending()
}

/// Pending upload whose transfer fails with `message`
pub fn rejected_pending(message: &str) -> PendingUpload {
    let message = message.to_string();
    PendingUpload::new(async move { Err::<UploadPayload, _>(PayloadError::new(message)) })
}

/// Transform returning `"stored:<filename>"`
pub fn store_file_transform() -> Arc<dyn UploadTransform> {
    Arc::new(FnTransform::new(
        "storeFile",
        |upload: UploadPayload, _info: UploadInfo| async move {
            Ok::<_, anyhow::Error>(ArgValue::from(json!(format!("stored:{}", upload.filename))))
        },
    ))
}

/// Transform that always fails with `message`
pub fn failing_transform(message: &str) -> Arc<dyn UploadTransform> {
    let message = message.to_string();
    Arc::new(FnTransform::new(
        "failing",
        move |_upload: UploadPayload, _info: UploadInfo| {
            let message = message.clone();
            async move { Err::<ArgValue, _>(anyhow::Error::msg(message)) }
        },
    ))
}

/// Transform recording every call, returning `"stored:<filename>"`
#[derive(Debug, Clone, Default)]
pub struct RecordingTransform {
    calls: Arc<Mutex<Vec<String>>>,
    type_names: Arc<Mutex<Vec<String>>>,
    tags: Arc<Mutex<Vec<BTreeSet<String>>>>,
}

impl RecordingTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(&self) -> Arc<dyn UploadTransform> {
        Arc::new(self.clone())
    }

    /// Filenames of the payloads received, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn seen_type_names(&self) -> Vec<String> {
        self.type_names.lock().unwrap().clone()
    }

    pub fn seen_tags(&self) -> Vec<BTreeSet<String>> {
        self.tags.lock().unwrap().clone()
    }
}

#[async_trait]
impl UploadTransform for RecordingTransform {
    async fn resolve(
        &self,
        upload: UploadPayload,
        _args: &ArgObject,
        _context: &RequestContext,
        info: &UploadResolveInfo,
    ) -> Result<ArgValue> {
        self.calls.lock().unwrap().push(upload.filename.clone());
        self.type_names
            .lock()
            .unwrap()
            .push(info.upload.type_name.clone());
        self.tags.lock().unwrap().push(info.upload.tags.clone());
        Ok(ArgValue::from(json!(format!("stored:{}", upload.filename))))
    }
}

/// Resolver recording the arguments of every call and returning `result`
#[derive(Debug, Clone)]
pub struct RecordingResolver {
    result: serde_json::Value,
    failure: Option<String>,
    calls: Arc<Mutex<Vec<ArgObject>>>,
}

impl RecordingResolver {
    pub fn new(result: serde_json::Value) -> Self {
        Self {
            result,
            failure: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Resolver that records its call, then fails with `message`
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(serde_json::Value::Null)
        }
    }

    pub fn shared(&self) -> Arc<dyn FieldResolver> {
        Arc::new(self.clone())
    }

    pub fn calls(&self) -> Vec<ArgObject> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FieldResolver for RecordingResolver {
    async fn resolve(
        &self,
        _source: &ArgValue,
        args: ArgObject,
        _context: &RequestContext,
        _info: &ResolveInfo,
    ) -> UploadResult<ArgValue> {
        self.calls.lock().unwrap().push(args);
        match &self.failure {
            Some(message) => Err(UploadError::Resolver(anyhow::Error::msg(message.clone()))),
            None => Ok(ArgValue::from(self.result.clone())),
        }
    }
}
