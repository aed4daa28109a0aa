use async_trait::async_trait;
use redis::AsyncCommands;
use serde_json::Value;

use super::{DraftError, DraftStore};

const KEY_PREFIX: &str = "intake:draft:";

fn redis_key(key: &str) -> String {
    format!("{KEY_PREFIX}{key}")
}

/// Drafts kept in Redis, for deployments running more than one instance.
pub struct RedisDraftStore {
    client: redis::Client,
}

impl RedisDraftStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, DraftError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl DraftStore for RedisDraftStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, DraftError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(redis_key(key)).await?;
        raw.map(|r| serde_json::from_str(&r))
            .transpose()
            .map_err(DraftError::from)
    }

    async fn set(&self, key: &str, value: &Value) -> Result<(), DraftError> {
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(redis_key(key), value.to_string())
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), DraftError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(redis_key(key)).await?;
        Ok(())
    }
}
