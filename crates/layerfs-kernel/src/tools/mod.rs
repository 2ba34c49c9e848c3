//! Shell commands.
//!
//! Every command the shell understands is a [`Tool`]: it receives parsed
//! [`ToolArgs`] and a mutable [`ExecContext`] (the overlay plus the working
//! directory) and returns an `ExecResult`. Failures come back as results,
//! never as panics or early exits, so one bad command cannot end a session.

mod builtin;
mod context;
mod registry;
mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use builtin::register_builtins;
pub use context::ExecContext;
pub use registry::ToolRegistry;
pub use traits::{ParamSchema, Tool, ToolArgs, ToolSchema};
