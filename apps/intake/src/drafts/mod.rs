//! Browser-profile-local key/value storage for wizard drafts and the
//! logged-in organization session.
//!
//! Every store holds JSON values under string keys. A [`ProfileDraftStore`]
//! narrows a shared store to one profile so that profiles never see each
//! other's keys. Writes are last-writer-wins.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

mod file;
mod memory;
mod redis_store;

pub use file::FileDraftStore;
pub use memory::MemoryDraftStore;
pub use redis_store::RedisDraftStore;

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid profile id '{0}'")]
    InvalidProfile(String),
}

#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, DraftError>;
    async fn set(&self, key: &str, value: &Value) -> Result<(), DraftError>;
    async fn remove(&self, key: &str) -> Result<(), DraftError>;
}

/// A view of a shared store restricted to one browser profile.
#[derive(Clone)]
pub struct ProfileDraftStore {
    inner: Arc<dyn DraftStore>,
    profile: String,
}

impl ProfileDraftStore {
    pub fn new(inner: Arc<dyn DraftStore>, profile: &str) -> Result<Self, DraftError> {
        let valid = !profile.is_empty()
            && profile.len() <= 64
            && profile
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(DraftError::InvalidProfile(profile.to_string()));
        }
        Ok(Self {
            inner,
            profile: profile.to_string(),
        })
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}:{}", self.profile, key)
    }
}

#[async_trait]
impl DraftStore for ProfileDraftStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, DraftError> {
        self.inner.get(&self.scoped(key)).await
    }

    async fn set(&self, key: &str, value: &Value) -> Result<(), DraftError> {
        self.inner.set(&self.scoped(key), value).await
    }

    async fn remove(&self, key: &str) -> Result<(), DraftError> {
        self.inner.remove(&self.scoped(key)).await
    }
}
