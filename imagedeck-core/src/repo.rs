use crate::{collection, CoreError, ImageRecord, KeyValueStore, MalformedPolicy, StoreConfig};
use async_trait::async_trait;
use std::sync::Arc;

/// The single named slot holding the whole collection.
#[async_trait]
pub trait CollectionRepository: Send + Sync {
    async fn load(&self) -> Result<Vec<ImageRecord>, CoreError>;
    async fn save(&self, images: &[ImageRecord]) -> Result<(), CoreError>;
}

/// Stores the collection as one JSON array under a configured key.
pub struct KvCollectionRepo {
    kv: Arc<dyn KeyValueStore>,
    key: String,
    on_malformed: MalformedPolicy,
}

impl KvCollectionRepo {
    pub fn new(kv: Arc<dyn KeyValueStore>, config: &StoreConfig) -> Self {
        Self {
            kv,
            key: config.key.clone(),
            on_malformed: config.on_malformed,
        }
    }
}

#[async_trait]
impl CollectionRepository for KvCollectionRepo {
    async fn load(&self) -> Result<Vec<ImageRecord>, CoreError> {
        let Some(raw) = self.kv.get(&self.key).await? else {
            tracing::debug!(key = %self.key, "no stored collection");
            return Ok(Vec::new());
        };
        match collection::decode(&raw) {
            Ok(images) => {
                tracing::debug!(key = %self.key, count = images.len(), "collection loaded");
                Ok(images)
            }
            Err(e) => match self.on_malformed {
                MalformedPolicy::FallBackEmpty => {
                    tracing::warn!(key = %self.key, error = %e, "stored collection unreadable, using empty");
                    Ok(Vec::new())
                }
                MalformedPolicy::Fail => Err(e),
            },
        }
    }

    async fn save(&self, images: &[ImageRecord]) -> Result<(), CoreError> {
        let json = collection::encode(images)?;
        self.kv.set(&self.key, &json).await?;
        tracing::debug!(key = %self.key, count = images.len(), "collection saved");
        Ok(())
    }
}
