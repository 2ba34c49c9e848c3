//! The writable local cache.
//!
//! A store is a key-value map from normalized path to [`Record`]. It knows
//! nothing about the remote side; shadowing and copy-up are the overlay's
//! job. Both stores implement [`Layer`](crate::layer::Layer) with the
//! mutating operations enabled.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use layerfs_types::EntryKind;

use crate::layer::{Metadata, Presence};

/// What a store holds at one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    File(Vec<u8>),
    Directory { opaque: bool },
    Tombstone,
}

impl Record {
    /// Kind tag persisted alongside the record.
    pub fn tag(&self) -> &'static str {
        match self {
            Record::File(_) => "file",
            Record::Directory { .. } => "directory",
            Record::Tombstone => "tombstone",
        }
    }

    pub fn kind(&self) -> Option<EntryKind> {
        match self {
            Record::File(_) => Some(EntryKind::File),
            Record::Directory { .. } => Some(EntryKind::Directory),
            Record::Tombstone => None,
        }
    }

    pub fn presence(&self) -> Presence {
        match self {
            Record::File(data) => Presence::Node(Metadata::file(data.len() as u64)),
            Record::Directory { opaque } => Presence::Node(Metadata {
                opaque: *opaque,
                ..Metadata::directory()
            }),
            Record::Tombstone => Presence::Whiteout,
        }
    }
}
