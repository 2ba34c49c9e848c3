//! Pure data types for layerfs: entry kinds, errors and command results.
//!
//! This crate is a leaf dependency with no async runtime and no I/O. The
//! kernel, the shell, and anything embedding the overlay share these types
//! without pulling in the kernel's storage and network stack.

pub mod dir_entry;
pub mod error;
pub mod result;

pub use dir_entry::*;
pub use error::*;
pub use result::*;
