use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{DraftError, DraftStore};

/// Process-local store. Drafts are lost on restart.
#[derive(Default)]
pub struct MemoryDraftStore {
    entries: RwLock<HashMap<String, Value>>,
}

#[async_trait]
impl DraftStore for MemoryDraftStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, DraftError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &Value) -> Result<(), DraftError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), DraftError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
