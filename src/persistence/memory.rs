use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::Backend;

/// Process-local backend. Contents vanish with the value.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    blobs: Mutex<BTreeMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let blobs = self.blobs.lock().map_err(|_| anyhow!("memory backend lock poisoned"))?;
        Ok(blobs.get(key).cloned())
    }

    fn write(&self, key: &str, blob: &str, _written_at: DateTime<Utc>) -> Result<()> {
        let mut blobs = self.blobs.lock().map_err(|_| anyhow!("memory backend lock poisoned"))?;
        blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut blobs = self.blobs.lock().map_err(|_| anyhow!("memory backend lock poisoned"))?;
        blobs.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let blobs = self.blobs.lock().map_err(|_| anyhow!("memory backend lock poisoned"))?;
        Ok(blobs.keys().cloned().collect())
    }

    fn clear(&self) -> Result<()> {
        let mut blobs = self.blobs.lock().map_err(|_| anyhow!("memory backend lock poisoned"))?;
        blobs.clear();
        Ok(())
    }
}
