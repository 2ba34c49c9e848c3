//! layerfs kernel: a layered virtual filesystem.
//!
//! A read-only remote source, described by a JSON manifest, sits under a
//! persistent writable cache. The merged namespace is exposed through
//! [`OverlayFs`] and driven by shell-style commands through [`Kernel`].
//!
//! # Layers
//!
//! ```text
//! Kernel::execute("cp /simple.txt /Desktop")
//!     │
//!     ▼
//! tools (ls, cp, mv, rm, cat, stat, cd, pwd, mkdir, help)
//!     │
//!     ▼
//! OverlayFs ──► upper: MemoryStore | SqliteStore   (writes, tombstones)
//!           └─► lower: RemoteSource                (Index + Origin)
//! ```
//!
//! Both sides implement [`Layer`]; the overlay only ever talks to that trait.

pub mod index;
pub mod kernel;
pub mod layer;
pub mod line;
pub mod overlay;
pub mod paths;
pub mod remote;
pub mod store;
pub mod tools;
pub mod vpath;

pub use index::{Index, IndexEntry, IndexError, Locator};
pub use kernel::{
    DEFAULT_MACRO, Kernel, KernelConfig, ManifestSource, OriginConfig, StartupError, StoreConfig,
};
pub use layer::{Layer, Metadata, Presence};
pub use overlay::{CopyOutcome, OverlayEntry, OverlayFs, OverlayOptions, Stat};
pub use remote::{DirOrigin, HttpOrigin, MemoryOrigin, Origin, OriginError, RemoteSource};
pub use store::{MemoryStore, SqliteStore};
pub use vpath::VPath;

pub use layerfs_types::{
    DirEntry, DisplayHint, EntryKind, ExecResult, FsError, FsResult, Provenance,
};
