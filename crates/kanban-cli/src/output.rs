//! Shared output layer: pretty output for humans, compact text for pipes,
//! stable JSON for scripts.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins), resolved in `kanban_core::config`:
//! 1. `--format` / hidden `--json` flag
//! 2. `FORMAT` env var (`pretty` | `text` | `json`)
//! 3. `output` in the user config file
//! 4. Default: [`OutputMode::Pretty`] if stdout is a TTY, [`OutputMode::Text`] if piped.

use clap::ValueEnum;
use kanban_core::KanbanError;
use serde::Serialize;
use std::io::{self, Write};

/// Shared width for pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (sections, rules, card summaries).
    Pretty,
    /// Plain rows for pipes and scripts.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Text => "text",
            Self::Json => "json",
        }
    }

    /// Map a resolved config value back to a mode. Unknown values are pretty.
    pub fn from_resolved(value: &str) -> Self {
        match value {
            "json" => Self::Json,
            "text" => Self::Text,
            _ => Self::Pretty,
        }
    }
}

/// Trait implemented by result rows that render in every mode.
pub trait Renderable: Serialize {
    /// Render for humans.
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()>;

    /// Render as a single text row (no header; see [`Renderable::table_headers`]).
    fn render_table(&self, w: &mut dyn Write) -> io::Result<()>;

    /// Column headers for text mode, in the same order as
    /// [`Renderable::render_table`] fields.
    fn table_headers() -> &'static [&'static str]
    where
        Self: Sized,
    {
        &[]
    }
}

/// Render one [`Renderable`] into `w`.
pub fn render_item_to<R: Renderable>(w: &mut dyn Write, item: &R, mode: OutputMode) -> anyhow::Result<()> {
    match mode {
        OutputMode::Pretty => item.render_human(w)?,
        OutputMode::Text => item.render_table(w)?,
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *w, item)?;
            writeln!(w)?;
        }
    }
    Ok(())
}

/// Render one [`Renderable`] to stdout.
pub fn render_item<R: Renderable>(item: &R, mode: OutputMode) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_item_to(&mut out, item, mode)
}

/// Render a list of [`Renderable`] rows into `w`.
///
/// JSON mode emits one array; text mode prints the header row once.
pub fn render_list_to<R: Renderable>(
    w: &mut dyn Write,
    items: &[R],
    mode: OutputMode,
) -> anyhow::Result<()> {
    match mode {
        OutputMode::Pretty => {
            for item in items {
                item.render_human(w)?;
            }
        }
        OutputMode::Text => {
            if !items.is_empty() && !R::table_headers().is_empty() {
                writeln!(w, "{}", R::table_headers().join("  "))?;
            }
            for item in items {
                item.render_table(w)?;
            }
        }
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *w, items)?;
            writeln!(w)?;
        }
    }
    Ok(())
}

/// Render a list of [`Renderable`] rows to stdout.
pub fn render_list<R: Renderable>(items: &[R], mode: OutputMode) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_list_to(&mut out, items, mode)
}

/// Render a serializable value: JSON in JSON mode, `human_fn` otherwise.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => human_fn(value, &mut out)?,
    }
    Ok(())
}

/// Render a one-line confirmation.
pub fn render_success(mode: OutputMode, message: &str) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "ok": true,
                "message": message,
            });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty => writeln!(out, "✓ {message}")?,
        OutputMode::Text => writeln!(out, "{message}")?,
    }
    Ok(())
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (`E####`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }

    pub fn with_details(
        message: impl Into<String>,
        suggestion: impl Into<String>,
        error_code: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            suggestion: Some(suggestion.into()),
            error_code: Some(error_code.into()),
        }
    }
}

impl From<&KanbanError> for CliError {
    fn from(err: &KanbanError) -> Self {
        Self {
            message: err.to_string(),
            suggestion: err.hint().map(str::to_string),
            error_code: Some(err.code().code().to_string()),
        }
    }
}

/// Render an error into `w`.
pub fn render_error_to(w: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut *w, &wrapper)?;
            writeln!(w)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            writeln!(w, "error: {}", error.message)?;
            if let Some(ref suggestion) = error.suggestion {
                writeln!(w, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// Render an error to stderr.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    render_error_to(&mut out, mode, error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanban_core::error::Entity;

    #[derive(Serialize)]
    struct Row {
        name: String,
        count: u32,
    }

    impl Renderable for Row {
        fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
            writeln!(w, "{}: {}", self.name, self.count)
        }

        fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
            writeln!(w, "{}  {}", self.name, self.count)
        }

        fn table_headers() -> &'static [&'static str] {
            &["NAME", "COUNT"]
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                name: "a".into(),
                count: 1,
            },
            Row {
                name: "b".into(),
                count: 2,
            },
        ]
    }

    fn captured(f: impl FnOnce(&mut dyn Write) -> anyhow::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).expect("render");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn resolved_values_map_to_modes() {
        assert_eq!(OutputMode::from_resolved("json"), OutputMode::Json);
        assert_eq!(OutputMode::from_resolved("text"), OutputMode::Text);
        assert_eq!(OutputMode::from_resolved("pretty"), OutputMode::Pretty);
        for mode in [OutputMode::Pretty, OutputMode::Text, OutputMode::Json] {
            assert_eq!(OutputMode::from_resolved(mode.as_str()), mode);
        }
    }

    #[test]
    fn text_list_prints_header_once() {
        let out = captured(|w| render_list_to(w, &rows(), OutputMode::Text));
        assert_eq!(out, "NAME  COUNT\na  1\nb  2\n");
    }

    #[test]
    fn empty_text_list_prints_nothing() {
        let out = captured(|w| render_list_to::<Row>(w, &[], OutputMode::Text));
        assert!(out.is_empty());
    }

    #[test]
    fn json_list_is_one_array() {
        let out = captured(|w| render_list_to(w, &rows(), OutputMode::Json));
        let value: serde_json::Value = serde_json::from_str(&out).expect("valid json");
        assert_eq!(value[1]["name"], "b");
        assert_eq!(value.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn pretty_item_uses_human_renderer() {
        let out = captured(|w| render_item_to(w, &rows()[0], OutputMode::Pretty));
        assert_eq!(out, "a: 1\n");
    }

    #[test]
    fn cli_error_from_kanban_error_carries_code_and_hint() {
        let err = KanbanError::not_found(Entity::Task, 9);
        let cli_err = CliError::from(&err);
        assert_eq!(cli_err.message, "task not found: 9");
        assert_eq!(cli_err.error_code.as_deref(), Some("E2003"));
        assert!(cli_err.suggestion.is_some());
    }

    #[test]
    fn error_json_envelope() {
        let err = CliError::with_details("bad input", "try again", "E3002");
        let out = captured(|w| render_error_to(w, OutputMode::Json, &err));
        let value: serde_json::Value = serde_json::from_str(&out).expect("valid json");
        assert_eq!(value["error"]["error_code"], "E3002");
        assert_eq!(value["error"]["suggestion"], "try again");
    }

    #[test]
    fn error_human_lines() {
        let err = CliError::with_details("bad input", "try again", "E3002");
        let out = captured(|w| render_error_to(w, OutputMode::Text, &err));
        assert_eq!(out, "error: bad input\n  suggestion: try again\n");

        let bare = captured(|w| render_error_to(w, OutputMode::Pretty, &CliError::new("x")));
        assert_eq!(bare, "error: x\n");
    }
}
