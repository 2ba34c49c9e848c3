//! Ephemeral write store. All records are lost when dropped.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use layerfs_types::{FsError, FsResult};

use super::Record;
use crate::layer::{Layer, LayerChild, Presence};
use crate::vpath::VPath;

/// In-memory write store.
///
/// Thread-safe via internal `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<VPath, Record>>,
}

fn poisoned<T>(_: T) -> FsError {
    FsError::Store("lock poisoned".to_string())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw record at `path`, tombstones included.
    pub fn record(&self, path: &VPath) -> FsResult<Option<Record>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.get(path).cloned())
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn put(&self, path: &VPath, record: Record) -> FsResult<()> {
        let mut records = self.records.write().map_err(poisoned)?;
        records.insert(path.clone(), record);
        Ok(())
    }
}

#[async_trait]
impl Layer for MemoryStore {
    fn label(&self) -> &'static str {
        "memory"
    }

    fn read_only(&self) -> bool {
        false
    }

    async fn lookup(&self, path: &VPath) -> FsResult<Option<Presence>> {
        Ok(self.record(path)?.map(|record| record.presence()))
    }

    async fn read(&self, path: &VPath) -> FsResult<Vec<u8>> {
        match self.record(path)? {
            Some(Record::File(data)) => Ok(data),
            Some(Record::Directory { .. }) => Err(FsError::NotAFile(path.to_string())),
            Some(Record::Tombstone) | None => Err(FsError::NotFound(path.to_string())),
        }
    }

    async fn list(&self, dir: &VPath) -> FsResult<Vec<LayerChild>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records
            .range(dir.clone()..)
            .filter(|(path, _)| dir.is_parent_of(path))
            .filter_map(|(path, record)| {
                path.file_name().map(|name| LayerChild {
                    name: name.to_string(),
                    presence: record.presence(),
                })
            })
            .collect())
    }

    async fn write(&self, path: &VPath, data: &[u8]) -> FsResult<()> {
        self.put(path, Record::File(data.to_vec()))
    }

    async fn mkdir(&self, path: &VPath, opaque: bool) -> FsResult<()> {
        self.put(path, Record::Directory { opaque })
    }

    async fn whiteout(&self, path: &VPath) -> FsResult<()> {
        self.put(path, Record::Tombstone)
    }

    async fn purge(&self, path: &VPath) -> FsResult<()> {
        let mut records = self.records.write().map_err(poisoned)?;
        records.retain(|key, _| key != path && !path.is_ancestor_of(key));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> VPath {
        VPath::parse(s).unwrap()
    }

    #[tokio::test]
    async fn write_then_read() {
        let store = MemoryStore::new();
        store.write(&p("/a.txt"), b"data").await.unwrap();
        assert_eq!(store.read(&p("/a.txt")).await.unwrap(), b"data");
    }

    #[tokio::test]
    async fn whiteout_replaces_file() {
        let store = MemoryStore::new();
        store.write(&p("/a.txt"), b"data").await.unwrap();
        store.whiteout(&p("/a.txt")).await.unwrap();
        assert_eq!(store.lookup(&p("/a.txt")).await.unwrap(), Some(Presence::Whiteout));
        assert!(!store.exists(&p("/a.txt")).await);
        assert!(matches!(
            store.read(&p("/a.txt")).await.unwrap_err(),
            FsError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn list_returns_direct_children_only() {
        let store = MemoryStore::new();
        store.mkdir(&p("/d"), false).await.unwrap();
        store.write(&p("/d/b.txt"), b"b").await.unwrap();
        store.whiteout(&p("/d/a.txt")).await.unwrap();
        store.write(&p("/d/sub/c.txt"), b"c").await.unwrap();
        store.write(&p("/d-other"), b"x").await.unwrap();

        let names: Vec<String> = store
            .list(&p("/d"))
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn purge_removes_subtree() {
        let store = MemoryStore::new();
        store.mkdir(&p("/d"), false).await.unwrap();
        store.write(&p("/d/a"), b"a").await.unwrap();
        store.whiteout(&p("/d/b")).await.unwrap();
        store.write(&p("/dx"), b"keep").await.unwrap();

        store.purge(&p("/d")).await.unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.exists(&p("/dx")).await);
    }
}
