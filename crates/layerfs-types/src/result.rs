//! ExecResult, the structured result of every shell command.
//!
//! Commands never abort the session: success and failure both come back as
//! an `ExecResult`, and the shell decides how to print it.
//!
//! # Display Hints
//!
//! - `DisplayHint::None`: use raw `out` as-is
//! - `DisplayHint::Table`: tabular data, the shell handles column layout

use crate::dir_entry::EntryKind;

/// Display hint for command output.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DisplayHint {
    /// No special formatting - use raw `out` as-is.
    #[default]
    None,

    /// Tabular data - the shell handles column layout.
    Table {
        /// Optional column headers.
        headers: Option<Vec<String>>,
        /// Table rows (each row is a vector of cell values).
        rows: Vec<Vec<String>>,
        /// Per-row entry kinds for coloring.
        entry_kinds: Option<Vec<EntryKind>>,
    },
}

/// The result of executing a command.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecResult {
    /// Exit code. 0 means success.
    pub code: i64,
    /// Plain-text output, always populated (one line per row for tables).
    pub out: String,
    /// Error message if the command failed.
    pub err: String,
    /// Display hint for formatting output.
    pub hint: DisplayHint,
}

impl ExecResult {
    /// Create a successful result with output.
    pub fn success(out: impl Into<String>) -> Self {
        Self {
            code: 0,
            out: out.into(),
            err: String::new(),
            hint: DisplayHint::None,
        }
    }

    /// Create a failed result with an error message.
    pub fn failure(code: i64, err: impl Into<String>) -> Self {
        Self {
            code,
            out: String::new(),
            err: err.into(),
            hint: DisplayHint::None,
        }
    }

    /// Create a successful tabular result.
    ///
    /// `out` carries the last column of each row (the entry name), one per
    /// line, so non-interactive consumers see a plain listing.
    pub fn success_table(
        headers: Option<Vec<String>>,
        rows: Vec<Vec<String>>,
        entry_kinds: Option<Vec<EntryKind>>,
    ) -> Self {
        let out = rows
            .iter()
            .filter_map(|row| row.last().cloned())
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            code: 0,
            out,
            err: String::new(),
            hint: DisplayHint::Table {
                headers,
                rows,
                entry_kinds,
            },
        }
    }

    /// True if the exit code is 0.
    pub fn ok(&self) -> bool {
        self.code == 0
    }
}
