//! Core tool traits and types.

use std::collections::HashSet;

use async_trait::async_trait;

use layerfs_types::ExecResult;

use super::context::ExecContext;

/// Schema for a tool parameter or flag.
#[derive(Debug, Clone)]
pub struct ParamSchema {
    /// Parameter name, or the flag spelling (`-l`) for flags.
    pub name: String,
    /// Whether this parameter is required.
    pub required: bool,
    /// Whether this is a boolean flag rather than a positional.
    pub flag: bool,
    /// Description for help text.
    pub description: String,
    /// Other spellings of a flag (`-R`, `--recursive`).
    pub aliases: Vec<String>,
}

impl ParamSchema {
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            flag: false,
            description: description.into(),
            aliases: Vec::new(),
        }
    }

    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            flag: false,
            description: description.into(),
            aliases: Vec::new(),
        }
    }

    pub fn flag(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            flag: true,
            description: description.into(),
            aliases: Vec::new(),
        }
    }

    /// Builder-style alternate spelling for a flag.
    pub fn alias(mut self, spelling: impl Into<String>) -> Self {
        self.aliases.push(spelling.into());
        self
    }

    /// Flag names as `ToolArgs` stores them, without dashes.
    fn flag_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(&self.name)
            .chain(self.aliases.iter())
            .map(|spelling| spelling.trim_start_matches('-'))
    }
}

/// Schema describing a tool's interface.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSchema>,
    /// `(description, command line)` pairs shown by `help <tool>`.
    pub examples: Vec<(String, String)>,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
            examples: Vec::new(),
        }
    }

    pub fn example(mut self, description: impl Into<String>, command: impl Into<String>) -> Self {
        self.examples.push((description.into(), command.into()));
        self
    }

    /// Add a parameter to the schema.
    pub fn param(mut self, param: ParamSchema) -> Self {
        self.params.push(param);
        self
    }

    /// The first flag in `args` this schema does not declare, with dashes.
    pub fn unknown_flag(&self, args: &ToolArgs) -> Option<String> {
        let mut unknown: Vec<&String> = args
            .flags
            .iter()
            .filter(|flag| {
                !self
                    .params
                    .iter()
                    .filter(|p| p.flag)
                    .any(|p| p.flag_names().any(|name| name == flag.as_str()))
            })
            .collect();
        unknown.sort();
        unknown.first().map(|flag| {
            if flag.chars().count() == 1 {
                format!("-{flag}")
            } else {
                format!("--{flag}")
            }
        })
    }

    /// One-line usage: `cp <source> <destDir>`.
    pub fn usage(&self) -> String {
        let mut usage = self.name.clone();
        for param in &self.params {
            let shown = match (param.flag, param.required) {
                (true, _) => format!(" [{}]", param.name),
                (false, true) => format!(" <{}>", param.name),
                (false, false) => format!(" [{}]", param.name),
            };
            usage.push_str(&shown);
        }
        usage
    }

    /// Multi-line help: usage, description, then one line per parameter.
    pub fn help(&self) -> String {
        let mut text = format!("{}\n  {}", self.usage(), self.description);
        if !self.params.is_empty() {
            let spellings: Vec<String> = self
                .params
                .iter()
                .map(|p| {
                    let names: Vec<&str> = std::iter::once(&p.name)
                        .chain(&p.aliases)
                        .map(String::as_str)
                        .collect();
                    names.join(", ")
                })
                .collect();
            let width = spellings.iter().map(String::len).max().unwrap_or(0);
            text.push('\n');
            for (param, shown) in self.params.iter().zip(&spellings) {
                text.push_str(&format!(
                    "\n  {:<width$}  {}",
                    shown,
                    param.description,
                    width = width
                ));
            }
        }
        if !self.examples.is_empty() {
            text.push_str("\n\nExamples:");
            for (description, command) in &self.examples {
                text.push_str(&format!("\n  {command}    # {description}"));
            }
        }
        text
    }
}

/// Parsed arguments ready for tool execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolArgs {
    /// Positional arguments in order.
    pub positional: Vec<String>,
    /// Boolean flags without their dashes (`-l` and `--long` give `l`, `long`).
    pub flags: HashSet<String>,
}

impl ToolArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split command words into flags and positionals.
    ///
    /// `-abc` sets `a`, `b` and `c`; `--name` sets `name`; a lone `-` is a
    /// positional (as in `cd -`); everything after `--` is positional.
    pub fn parse<S: AsRef<str>>(words: &[S]) -> Self {
        let mut args = Self::new();
        let mut flags_done = false;
        for word in words {
            let word = word.as_ref();
            if flags_done || word == "-" || !word.starts_with('-') {
                args.positional.push(word.to_string());
            } else if word == "--" {
                flags_done = true;
            } else if let Some(long) = word.strip_prefix("--") {
                args.flags.insert(long.to_string());
            } else {
                for c in word.chars().skip(1) {
                    args.flags.insert(c.to_string());
                }
            }
        }
        args
    }

    pub fn get_positional(&self, index: usize) -> Option<&str> {
        self.positional.get(index).map(String::as_str)
    }

    /// True if any of the given flag spellings is set.
    pub fn has_flag(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.flags.contains(*name))
    }
}

/// A command the shell can run.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's name (used for lookup).
    fn name(&self) -> &str;

    fn schema(&self) -> ToolSchema;

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_flags_and_positionals() {
        let args = ToolArgs::parse(&["-la", "--recursive", "/docs", "-", "--", "-x"]);
        assert_eq!(args.positional, vec!["/docs", "-", "-x"]);
        assert!(args.has_flag(&["l"]));
        assert!(args.has_flag(&["a"]));
        assert!(args.has_flag(&["r", "recursive"]));
        assert!(!args.has_flag(&["x"]));
    }

    #[test]
    fn usage_marks_required_and_optional() {
        let schema = ToolSchema::new("cp", "Copy a file")
            .param(ParamSchema::required("source", "File to copy"))
            .param(ParamSchema::required("destDir", "Existing directory"));
        assert_eq!(schema.usage(), "cp <source> <destDir>");

        let schema = ToolSchema::new("ls", "List")
            .param(ParamSchema::optional("dir", "Directory"))
            .param(ParamSchema::flag("-l", "Long format"));
        assert_eq!(schema.usage(), "ls [dir] [-l]");
        assert!(schema.help().contains("Long format"));
    }

    #[test]
    fn undeclared_flags_are_reported() {
        let schema = ToolSchema::new("rm", "Remove")
            .param(ParamSchema::required("path", "Path"))
            .param(ParamSchema::flag("-r", "Recursive").alias("-R").alias("--recursive"));

        assert_eq!(schema.unknown_flag(&ToolArgs::parse(&["-rR", "--recursive", "/x"])), None);
        assert_eq!(schema.unknown_flag(&ToolArgs::parse(&["-rx", "/x"])), Some("-x".to_string()));
        assert_eq!(schema.unknown_flag(&ToolArgs::parse(&["--force", "/x"])), Some("--force".to_string()));
        assert_eq!(schema.unknown_flag(&ToolArgs::parse(&["--", "-x"])), None);
        assert!(schema.help().contains("-r, -R, --recursive  Recursive"));
    }
}
