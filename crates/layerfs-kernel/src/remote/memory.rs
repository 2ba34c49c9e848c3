//! In-memory origin. Used for testing and for inline manifests.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::origin::{Fetched, Origin, OriginError, guess_content_type, slice_range};
use crate::index::Locator;

/// Origin backed by a map from target to bytes.
#[derive(Debug, Default)]
pub struct MemoryOrigin {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(self, target: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(target, bytes);
        self
    }

    pub fn insert(&self, target: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        if let Ok(mut objects) = self.objects.write() {
            objects.insert(target.into(), bytes.into());
        }
    }

    /// Drop an object, simulating an origin that lost it.
    pub fn remove(&self, target: &str) {
        if let Ok(mut objects) = self.objects.write() {
            objects.remove(target);
        }
    }
}

#[async_trait]
impl Origin for MemoryOrigin {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn fetch(&self, locator: &Locator) -> Result<Fetched, OriginError> {
        let objects = self
            .objects
            .read()
            .map_err(|_| OriginError::Transport {
                target: locator.target.clone(),
                message: "lock poisoned".to_string(),
            })?;
        let data = objects
            .get(&locator.target)
            .ok_or_else(|| OriginError::NotFound(locator.target.clone()))?;

        let bytes = match locator.range {
            Some(range) => slice_range(data, range).to_vec(),
            None => data.clone(),
        };
        Ok(Fetched {
            bytes,
            content_type: guess_content_type(&locator.target).map(str::to_string),
        })
    }
}
