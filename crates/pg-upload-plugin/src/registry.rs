//! Transform registry for binding configured definitions to code

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use pg_upload_core::{UploadError, UploadResult};

use crate::transform::UploadTransform;

/// Registry for managing and retrieving upload transforms by name.
///
/// Configuration refers to transforms by name; the registry resolves those
/// names when definitions are bound. Cloning shares the underlying map.
#[derive(Clone)]
pub struct TransformRegistry {
    transforms: Arc<RwLock<HashMap<String, Arc<dyn UploadTransform>>>>,
}

impl TransformRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            transforms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a transform under `name`, replacing any previous one
    pub async fn register(&self, name: impl Into<String>, transform: Arc<dyn UploadTransform>) {
        let name = name.into();
        let mut transforms = self.transforms.write().await;

        if transforms.insert(name.clone(), transform).is_some() {
            tracing::warn!(transform = %name, "Replaced previously registered upload transform");
        }
    }

    /// Get a transform by name
    pub async fn get(&self, name: &str) -> UploadResult<Arc<dyn UploadTransform>> {
        let transforms = self.transforms.read().await;

        transforms
            .get(name)
            .cloned()
            .ok_or_else(|| UploadError::TransformNotFound(name.to_string()))
    }

    /// List registered transform names, sorted
    pub async fn list(&self) -> Vec<String> {
        let transforms = self.transforms.read().await;

        let mut names: Vec<String> = transforms.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a transform is registered
    pub async fn contains(&self, name: &str) -> bool {
        self.transforms.read().await.contains_key(name)
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{FnTransform, UploadInfo};
    use pg_upload_core::{ArgValue, UploadPayload};

    fn transform(name: &str) -> Arc<dyn UploadTransform> {
        Arc::new(FnTransform::new(name, |upload: UploadPayload, _info: UploadInfo| async move {
            Ok::<_, anyhow::Error>(ArgValue::from(serde_json::json!(upload.filename)))
        }))
    }

    #[tokio::test]
    async fn test_new_registry_is_empty() {
        let registry = TransformRegistry::new();
        assert!(registry.list().await.is_empty());
        assert!(!registry.contains("storeFile").await);
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let registry = TransformRegistry::default();
        registry.register("storeFile", transform("storeFile")).await;

        assert!(registry.contains("storeFile").await);
        assert!(registry.get("storeFile").await.is_ok());
        assert_eq!(registry.list().await, vec!["storeFile".to_string()]);
    }

    #[tokio::test]
    async fn test_get_unknown_transform() {
        let registry = TransformRegistry::new();
        let err = registry.get("missing").await.unwrap_err();
        assert!(matches!(err, UploadError::TransformNotFound(name) if name == "missing"));
    }

    #[tokio::test]
    async fn test_clone_registry_shares_transforms() {
        let registry = TransformRegistry::new();
        let cloned = registry.clone();
        registry.register("b", transform("b")).await;
        registry.register("a", transform("a")).await;

        assert_eq!(cloned.list().await, vec!["a".to_string(), "b".to_string()]);
    }
}
