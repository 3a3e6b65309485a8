use crate::CoreError;
use async_trait::async_trait;

pub mod memory;

/// A durable string slot per key. Backends replace the whole value on `set`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;
}
