//! Output formatting: table, JSON, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::{Table, Tabled, settings::Style};

use hearth_core::model::ConnectionState;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

pub fn paint_state(state: &ConnectionState, color: bool) -> String {
    let text = state.to_string();
    if !color {
        return text;
    }
    match state {
        ConnectionState::Connected => text.green().to_string(),
        ConnectionState::Connecting | ConnectionState::Reconnecting { .. } => {
            text.yellow().to_string()
        }
        ConnectionState::Disconnected | ConnectionState::Failed => text.red().to_string(),
    }
}

pub fn favorite_marker(is_favorite: bool, color: bool) -> String {
    match (is_favorite, color) {
        (false, _) => String::new(),
        (true, false) => "*".into(),
        (true, true) => "*".yellow().to_string(),
    }
}

pub fn heading(text: &str, color: bool) -> String {
    if color {
        text.bold().to_string()
    } else {
        text.to_owned()
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    })
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item detail views don't
/// use the `Tabled` derive.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    Ok(match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Plain => id_fn(data),
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Scalar rendering shared by detail views: strings unquoted, null as "-".
pub fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "-".into(),
        Value::String(s) => s.clone(),
        Value::Object(map) if map.contains_key("min") && map.contains_key("max") => {
            format!("{}..{}", scalar(&map["min"]), scalar(&map["max"]))
        }
        other => other.to_string(),
    }
}

/// Aligned `key: value` lines for the fields of a JSON object.
pub fn key_values(value: &Value) -> String {
    let Value::Object(map) = value else {
        return scalar(value);
    };
    let width = map.keys().map(String::len).max().unwrap_or(0) + 1;
    map.iter()
        .map(|(key, value)| format!("{:<width$} {}", format!("{key}:"), scalar(value)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `key=value` pairs on one line, for scripting.
pub fn key_value_line(value: &Value) -> String {
    let Value::Object(map) = value else {
        return scalar(value);
    };
    map.iter()
        .map(|(key, value)| format!("{key}={}", scalar(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn key_values_align_and_flatten_ranges() {
        let value = json!({
            "value": 250.0,
            "range": { "min": 0.0, "max": 1000.0 },
            "daylight": null,
        });
        assert_eq!(
            key_values(&value),
            "daylight: -\nrange:    0.0..1000.0\nvalue:    250.0"
        );
        assert_eq!(key_value_line(&value), "daylight=- range=0.0..1000.0 value=250.0");
    }

    #[test]
    fn plain_list_is_one_id_per_line() {
        let ids = vec!["a".to_owned(), "b".to_owned()];
        let out = render_list(OutputFormat::Plain, &ids, |_| blank_row(), Clone::clone).unwrap();
        assert_eq!(out, "a\nb");
    }

    #[derive(Tabled)]
    struct Row {
        id: String,
    }

    fn blank_row() -> Row {
        Row { id: String::new() }
    }

    #[test]
    fn uncolored_markers_are_plain_text() {
        assert_eq!(favorite_marker(true, false), "*");
        assert_eq!(favorite_marker(false, true), "");
        assert_eq!(paint_state(&ConnectionState::Connected, false), "connected");
    }
}
