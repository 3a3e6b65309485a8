use crate::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Key the collection lives under unless configured otherwise.
pub const DEFAULT_COLLECTION_KEY: &str = "non_customer_flash_card";

/// What `load` does when the stored value cannot be parsed.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Log a warning and treat the slot as empty.
    #[default]
    FallBackEmpty,
    /// Surface the error and put the screen into a failed state.
    Fail,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    pub key: String,
    pub on_malformed: MalformedPolicy,
    pub retry: RetryPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_COLLECTION_KEY.to_string(),
            on_malformed: MalformedPolicy::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl StoreConfig {
    pub fn with_key(key: impl Into<String>) -> Self {
        Self { key: key.into(), ..Self::default() }
    }
}
