use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::{DraftError, DraftStore};

/// One JSON file per key under a directory.
pub struct FileDraftStore {
    dir: PathBuf,
}

impl FileDraftStore {
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, DraftError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

/// Keeps `[A-Za-z0-9_-]` and percent-encodes every other byte, so distinct
/// keys always map to distinct file names.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

async fn write_then_rename(tmp: &Path, path: &Path, value: &Value) -> Result<(), DraftError> {
    tokio::fs::write(tmp, serde_json::to_vec(value)?).await?;
    tokio::fs::rename(tmp, path).await?;
    Ok(())
}

#[async_trait]
impl DraftStore for FileDraftStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, DraftError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &Value) -> Result<(), DraftError> {
        let path = self.path_for(key);
        // Each write gets its own temp file; the last rename wins.
        let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        if let Err(e) = write_then_rename(&tmp, &path, value).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        debug!("Draft '{}' written to {}", key, path.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), DraftError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
