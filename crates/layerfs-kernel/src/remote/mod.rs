//! The read-only remote side of the overlay.
//!
//! An [`Origin`] fetches raw bytes for a [`Locator`](crate::index::Locator);
//! [`RemoteSource`] pairs one with the [`Index`](crate::index::Index) and
//! exposes the result as a read-only [`Layer`](crate::layer::Layer).

mod dir;
mod http;
mod memory;
mod origin;
mod source;

pub use dir::DirOrigin;
pub use http::HttpOrigin;
pub use memory::MemoryOrigin;
pub use origin::{Fetched, Origin, OriginError, guess_content_type};
pub use source::RemoteSource;
