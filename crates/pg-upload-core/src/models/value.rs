//! Argument values flowing through mutation resolvers.
//!
//! Client-submitted files arrive as [`DeferredUpload`] handles. The `Upload`
//! scalar turns them into [`PendingUpload`]s which stay in the argument tree
//! until the mutation wrapper awaits them.

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::future::Future;

use crate::error::{PayloadError, UploadError};

/// A materialized file upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPayload {
    pub filename: String,
    pub mime_type: String,
    pub encoding: String,
    pub content: Bytes,
}

impl UploadPayload {
    pub fn new(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            encoding: "7bit".to_string(),
            content: content.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}

type PayloadFuture = BoxFuture<'static, Result<UploadPayload, PayloadError>>;

/// An upload held in the argument tree, not yet awaited.
///
/// Cloning shares the underlying future: it is polled once and every clone
/// observes the same outcome, so awaiting does not consume the tree value.
#[derive(Clone)]
pub struct PendingUpload {
    inner: Shared<PayloadFuture>,
}

impl PendingUpload {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<UploadPayload, PayloadError>> + Send + 'static,
    {
        Self {
            inner: future.boxed().shared(),
        }
    }

    /// Wait for the upload to materialize
    pub async fn payload(&self) -> Result<UploadPayload, PayloadError> {
        self.inner.clone().await
    }
}

impl Debug for PendingUpload {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PendingUpload").finish_non_exhaustive()
    }
}

/// Opaque handle for a client-submitted file produced by the transport layer
#[derive(Clone)]
pub struct DeferredUpload {
    pending: PendingUpload,
}

impl DeferredUpload {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<UploadPayload, PayloadError>> + Send + 'static,
    {
        Self {
            pending: PendingUpload::new(future),
        }
    }

    /// A handle whose payload is already available
    pub fn ready(payload: UploadPayload) -> Self {
        Self::new(futures::future::ready(Ok(payload)))
    }

    /// The deferred value yielding the eventual payload
    pub fn into_pending(self) -> PendingUpload {
        self.pending
    }
}

impl Debug for DeferredUpload {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DeferredUpload").finish_non_exhaustive()
    }
}

/// Classification of a value node, computed once per node during traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Scalar,
    PendingFuture,
    Map,
    Sequence,
}

/// A value in a resolver's argument tree
#[derive(Debug, Clone)]
pub enum ArgValue {
    Null,
    Scalar(serde_json::Value),
    /// Client-submitted upload, not yet accepted by the `Upload` scalar
    Upload(DeferredUpload),
    /// Accepted upload awaiting materialization
    Pending(PendingUpload),
    List(Vec<ArgValue>),
    Object(ArgObject),
}

impl ArgValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ArgValue::Pending(_) => ValueKind::PendingFuture,
            ArgValue::Object(_) => ValueKind::Map,
            ArgValue::List(_) => ValueKind::Sequence,
            ArgValue::Null | ArgValue::Scalar(_) | ArgValue::Upload(_) => ValueKind::Scalar,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ArgValue::Null)
    }

    pub fn as_object(&self) -> Option<&ArgObject> {
        match self {
            ArgValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ArgObject> {
        match self {
            ArgValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ArgValue]> {
        match self {
            ArgValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&serde_json::Value> {
        match self {
            ArgValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(|value| value.as_str())
    }

    /// Output representation. Uploads have none.
    pub fn to_json(&self) -> Result<serde_json::Value, UploadError> {
        match self {
            ArgValue::Null => Ok(serde_json::Value::Null),
            ArgValue::Scalar(value) => Ok(value.clone()),
            ArgValue::Upload(_) | ArgValue::Pending(_) => {
                Err(UploadError::UnsupportedSerialization)
            }
            ArgValue::List(items) => items
                .iter()
                .map(ArgValue::to_json)
                .collect::<Result<Vec<_>, _>>()
                .map(serde_json::Value::Array),
            ArgValue::Object(obj) => {
                let mut map = serde_json::Map::new();
                for (key, value) in obj.iter() {
                    map.insert(key.clone(), value.to_json()?);
                }
                Ok(serde_json::Value::Object(map))
            }
        }
    }
}

impl From<serde_json::Value> for ArgValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ArgValue::Null,
            serde_json::Value::Array(items) => {
                ArgValue::List(items.into_iter().map(ArgValue::from).collect())
            }
            serde_json::Value::Object(map) => ArgValue::Object(
                map.into_iter()
                    .map(|(key, value)| (key, ArgValue::from(value)))
                    .collect(),
            ),
            scalar => ArgValue::Scalar(scalar),
        }
    }
}

impl From<ArgObject> for ArgValue {
    fn from(obj: ArgObject) -> Self {
        ArgValue::Object(obj)
    }
}

impl From<DeferredUpload> for ArgValue {
    fn from(upload: DeferredUpload) -> Self {
        ArgValue::Upload(upload)
    }
}

impl From<PendingUpload> for ArgValue {
    fn from(pending: PendingUpload) -> Self {
        ArgValue::Pending(pending)
    }
}

/// Object-shaped argument value; keys keep insertion order
#[derive(Debug, Clone, Default)]
pub struct ArgObject {
    entries: Vec<(String, ArgValue)>,
}

impl ArgObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ArgValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Set `key`, replacing in place if present, otherwise appending.
    /// Returns the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: ArgValue) -> Option<ArgValue> {
        let key = key.into();
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.insert(key, value.into());
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ArgValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl FromIterator<(String, ArgValue)> for ArgObject {
    fn from_iter<T: IntoIterator<Item = (String, ArgValue)>>(iter: T) -> Self {
        let mut obj = ArgObject::new();
        for (key, value) in iter {
            obj.insert(key, value);
        }
        obj
    }
}
