//! Upload transforms
//!
//! A transform turns a materialized upload into the value the original
//! mutation stores (e.g., a storage URL or the raw bytes). Storage and
//! transfer live entirely inside the transform; the plugin only awaits it.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::future::Future;
use std::ops::Deref;

use pg_upload_core::{ArgObject, ArgValue, RequestContext, ResolveInfo, UploadPayload};

/// Column details handed to a transform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadInfo {
    /// Marker tags of the column
    pub tags: BTreeSet<String>,
    /// Database type name of the column (e.g., `bytea`)
    pub type_name: String,
}

/// Resolve info of the mutation call, extended with the upload column details
#[derive(Debug, Clone)]
pub struct UploadResolveInfo {
    pub info: ResolveInfo,
    pub upload: UploadInfo,
}

impl Deref for UploadResolveInfo {
    type Target = ResolveInfo;

    fn deref(&self) -> &Self::Target {
        &self.info
    }
}

/// Trait that all upload transforms must implement
#[async_trait]
pub trait UploadTransform: Send + Sync + Debug {
    /// Convert the payload into the value stored under the original column field.
    ///
    /// `args` is the full argument tree of the mutation call, including any
    /// substitutions already made earlier in the same call.
    async fn resolve(
        &self,
        upload: UploadPayload,
        args: &ArgObject,
        context: &RequestContext,
        info: &UploadResolveInfo,
    ) -> Result<ArgValue>;
}

/// Transform backed by an async closure over the payload and column details
pub struct FnTransform<F> {
    name: String,
    func: F,
}

impl<F> FnTransform<F> {
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnTransform<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FnTransform")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<F, Fut> UploadTransform for FnTransform<F>
where
    F: Fn(UploadPayload, UploadInfo) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ArgValue>> + Send,
{
    async fn resolve(
        &self,
        upload: UploadPayload,
        _args: &ArgObject,
        _context: &RequestContext,
        info: &UploadResolveInfo,
    ) -> Result<ArgValue> {
        (self.func)(upload, info.upload.clone()).await
    }
}
