//! Durable write store backed by SQLite.
//!
//! The cache lives at `$XDG_CACHE_HOME/layerfs/cache.db` by default and
//! survives process restarts. Each record is one row keyed by its normalized
//! path, so every put and delete is a single-row statement.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use tracing::debug;

use layerfs_types::{FsError, FsResult};

use super::Record;
use crate::layer::{Layer, LayerChild, Presence};
use crate::vpath::VPath;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS records (
    path       TEXT PRIMARY KEY NOT NULL,
    parent     TEXT NOT NULL,
    kind       TEXT NOT NULL CHECK (kind IN ('file', 'directory', 'tombstone')),
    opaque     INTEGER NOT NULL DEFAULT 0,
    data       BLOB,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS records_parent ON records (parent);
";

fn store_err(context: &str) -> impl FnOnce(rusqlite::Error) -> FsError + '_ {
    move |e| FsError::Store(format!("{context}: {e}"))
}

/// SQLite-backed write store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path.
    ///
    /// Creates parent directories and initializes the schema if needed.
    pub fn open(path: impl AsRef<Path>) -> FsResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                FsError::Store(format!("creating cache directory {}: {e}", parent.display()))
            })?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| FsError::Store(format!("opening cache {}: {e}", path.display())))?;

        debug!(path = %path.display(), "opened sqlite store");
        Self::with_connection(conn)
    }

    /// Create an in-memory store (for tests).
    pub fn in_memory() -> FsResult<Self> {
        let conn = Connection::open_in_memory().map_err(store_err("creating in-memory cache"))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> FsResult<Self> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(store_err("initializing cache schema"))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> FsResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| FsError::Store("connection lock poisoned".to_string()))
    }

    /// The raw record at `path`, tombstones included.
    pub fn record(&self, path: &VPath) -> FsResult<Option<Record>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT kind, opaque, data FROM records WHERE path = ?1",
                params![path.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, bool>(1)?,
                        row.get::<_, Option<Vec<u8>>>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(store_err("loading record"))?;

        row.map(|(kind, opaque, data)| decode(path, &kind, opaque, data))
            .transpose()
    }

    /// Number of rows, tombstones included.
    pub fn len(&self) -> FsResult<usize> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
            .map_err(store_err("counting records"))?;
        Ok(count as usize)
    }

    fn put(&self, path: &VPath, record: &Record) -> FsResult<()> {
        let parent = path
            .parent()
            .map(|p| p.as_str().to_string())
            .unwrap_or_default();
        let (opaque, data) = match record {
            Record::File(data) => (false, Some(data.as_slice())),
            Record::Directory { opaque } => (*opaque, None),
            Record::Tombstone => (false, None),
        };
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO records (path, parent, kind, opaque, data, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))",
            params![path.as_str(), parent, record.tag(), opaque, data],
        )
        .map_err(store_err("saving record"))?;
        Ok(())
    }
}

fn decode(path: &VPath, kind: &str, opaque: bool, data: Option<Vec<u8>>) -> FsResult<Record> {
    match kind {
        "file" => Ok(Record::File(data.unwrap_or_default())),
        "directory" => Ok(Record::Directory { opaque }),
        "tombstone" => Ok(Record::Tombstone),
        other => Err(FsError::Store(format!("unknown record kind {other:?} at {path}"))),
    }
}

#[async_trait]
impl Layer for SqliteStore {
    fn label(&self) -> &'static str {
        "sqlite"
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
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT path, kind, opaque, data FROM records WHERE parent = ?1 ORDER BY path",
            )
            .map_err(store_err("listing records"))?;
        let rows = stmt
            .query_map(params![dir.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, Option<Vec<u8>>>(3)?,
                ))
            })
            .map_err(store_err("listing records"))?;

        let mut children = Vec::new();
        for row in rows {
            let (raw, kind, opaque, data) = row.map_err(store_err("listing records"))?;
            let path = VPath::parse(&raw)?;
            let Some(name) = path.file_name() else {
                continue;
            };
            let record = decode(&path, &kind, opaque, data)?;
            children.push(LayerChild {
                name: name.to_string(),
                presence: record.presence(),
            });
        }
        Ok(children)
    }

    async fn write(&self, path: &VPath, data: &[u8]) -> FsResult<()> {
        self.put(path, &Record::File(data.to_vec()))
    }

    async fn mkdir(&self, path: &VPath, opaque: bool) -> FsResult<()> {
        self.put(path, &Record::Directory { opaque })
    }

    async fn whiteout(&self, path: &VPath) -> FsResult<()> {
        self.put(path, &Record::Tombstone)
    }

    async fn purge(&self, path: &VPath) -> FsResult<()> {
        let prefix = path.child_prefix();
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM records WHERE path = ?1 OR substr(path, 1, length(?2)) = ?2",
            params![path.as_str(), prefix],
        )
        .map_err(store_err("purging records"))?;
        Ok(())
    }

    async fn flush(&self) -> FsResult<()> {
        let conn = self.conn()?;
        conn.cache_flush().map_err(store_err("flushing cache"))?;
        Ok(())
    }
}
