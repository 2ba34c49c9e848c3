//! Output formatting for the shell.
//!
//! Tables become columns (plain `ls`) or aligned rows (`ls -l`) on a
//! terminal, with directory names colored. When stdout is piped the plain
//! `out` text is printed unchanged, one entry per line.

use std::io::IsTerminal;

use layerfs_types::{DisplayHint, EntryKind, ExecResult};

/// Where output is going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputContext {
    /// A human at a terminal.
    Interactive,
    /// A pipe or file.
    Piped,
}

/// Format an ExecResult's output for the given context.
pub fn format_output(result: &ExecResult, context: OutputContext) -> String {
    match &result.hint {
        DisplayHint::None => result.out.clone(),
        DisplayHint::Table {
            headers,
            rows,
            entry_kinds,
        } => match context {
            OutputContext::Interactive => {
                format_table_interactive(headers, rows, entry_kinds.as_deref())
            }
            OutputContext::Piped => result.out.clone(),
        },
    }
}

/// Detect the output context based on terminal state.
pub fn detect_context() -> OutputContext {
    if std::io::stdout().is_terminal() {
        OutputContext::Interactive
    } else {
        OutputContext::Piped
    }
}

fn format_table_interactive(
    headers: &Option<Vec<String>>,
    rows: &[Vec<String>],
    entry_kinds: Option<&[EntryKind]>,
) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let term_width = terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80);

    if rows.iter().all(|r| r.len() == 1) {
        format_columns(rows, entry_kinds, term_width)
    } else {
        format_rows_aligned(headers, rows, entry_kinds)
    }
}

/// Lay names out across the terminal like `ls` does.
fn format_columns(rows: &[Vec<String>], entry_kinds: Option<&[EntryKind]>, term_width: usize) -> String {
    let items: Vec<&String> = rows.iter().filter_map(|r| r.first()).collect();
    if items.is_empty() {
        return String::new();
    }

    let max_len = items.iter().map(|s| s.chars().count()).max().unwrap_or(0);
    let col_width = max_len + 2;
    let num_cols = (term_width / col_width).max(1);

    let mut output = String::new();
    for (i, item) in items.iter().enumerate() {
        let col = i % num_cols;
        if i > 0 && col == 0 {
            output.push('\n');
        }
        if col > 0 {
            let prev_len = items[i - 1].chars().count();
            output.push_str(&" ".repeat(col_width.saturating_sub(prev_len)));
        }
        let kind = entry_kinds.and_then(|kinds| kinds.get(i).copied());
        output.push_str(&colorize_entry(item, kind));
    }

    output
}

/// Aligned rows with an optional header line (for `ls -l`).
fn format_rows_aligned(
    headers: &Option<Vec<String>>,
    rows: &[Vec<String>],
    entry_kinds: Option<&[EntryKind]>,
) -> String {
    let num_cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut col_widths = vec![0; num_cols];

    let all_rows = headers.iter().chain(rows.iter());
    for row in all_rows {
        for (i, cell) in row.iter().enumerate().take(num_cols) {
            col_widths[i] = col_widths[i].max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    if let Some(h) = headers {
        lines.push(join_padded(h, &col_widths, |cell, _| cell.to_string()));
    }
    for (row_idx, row) in rows.iter().enumerate() {
        let kind = entry_kinds.and_then(|kinds| kinds.get(row_idx).copied());
        let last = row.len().saturating_sub(1);
        lines.push(join_padded(row, &col_widths, |cell, i| {
            if i == last {
                colorize_entry(cell, kind)
            } else {
                cell.to_string()
            }
        }));
    }

    lines.join("\n")
}

/// Join cells with two spaces, padding every column but the last.
fn join_padded(
    row: &[String],
    widths: &[usize],
    render: impl Fn(&str, usize) -> String,
) -> String {
    let mut line = String::new();
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        line.push_str(&render(cell, i));
        if i + 1 < row.len() {
            let width = widths.get(i).copied().unwrap_or(0);
            line.push_str(&" ".repeat(width.saturating_sub(cell.chars().count())));
        }
    }
    line
}

fn colors_enabled() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    !std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false)
}

/// Colorize an entry name based on its kind.
fn colorize_entry(name: &str, kind: Option<EntryKind>) -> String {
    use owo_colors::OwoColorize;

    match kind {
        Some(EntryKind::Directory) if colors_enabled() => name.blue().bold().to_string(),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_format_output_none_hint() {
        let result = ExecResult::success("hello world");
        let output = format_output(&result, OutputContext::Interactive);
        assert_eq!(output, "hello world");
    }

    #[test]
    fn test_format_output_table_piped() {
        let rows = vec![row(&["file1.txt"]), row(&["file2.txt"])];
        let result = ExecResult::success_table(None, rows, None);
        let output = format_output(&result, OutputContext::Piped);
        assert_eq!(output, "file1.txt\nfile2.txt");
    }

    #[test]
    fn test_detect_context_not_terminal() {
        // In test environment, stdout is typically not a terminal
        assert_eq!(detect_context(), OutputContext::Piped);
    }

    #[test]
    fn test_colorize_plain_file() {
        assert_eq!(colorize_entry("test.txt", Some(EntryKind::File)), "test.txt");
        assert_eq!(colorize_entry("test.txt", None), "test.txt");
    }

    #[test]
    fn test_columns_wrap_to_width() {
        let rows = vec![row(&["aa"]), row(&["bb"]), row(&["cc"])];
        let output = format_columns(&rows, None, 8);
        assert_eq!(output, "aa  bb\ncc");
    }

    #[test]
    fn test_columns_single_per_line_when_narrow() {
        let rows = vec![row(&["alpha.txt"]), row(&["beta.txt"])];
        let output = format_columns(&rows, None, 4);
        assert_eq!(output, "alpha.txt\nbeta.txt");
    }

    #[test]
    fn test_rows_aligned_with_headers() {
        let headers = Some(row(&["KIND", "SIZE", "NAME"]));
        let rows = vec![
            row(&["-", "5", "simple.txt"]),
            row(&["-", "1024", "big.bin"]),
        ];
        let kinds = [EntryKind::File, EntryKind::File];
        let output = format_rows_aligned(&headers, &rows, Some(&kinds));
        assert_eq!(
            output,
            "KIND  SIZE  NAME\n-     5     simple.txt\n-     1024  big.bin"
        );
    }

    #[test]
    fn test_format_output_table_interactive() {
        let rows = vec![row(&["alpha.txt"]), row(&["beta.txt"]), row(&["gamma.txt"])];
        let result = ExecResult::success_table(None, rows, None);
        let output = format_output(&result, OutputContext::Interactive);
        assert!(output.contains("alpha.txt"));
        assert!(output.contains("beta.txt"));
        assert!(output.contains("gamma.txt"));
    }

    #[test]
    fn test_empty_table_is_empty() {
        let result = ExecResult::success_table(None, Vec::new(), None);
        assert_eq!(format_output(&result, OutputContext::Interactive), "");
    }
}
