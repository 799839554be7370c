//! Output formatting: JSON, YAML, plain.
//!
//! Responses are untyped `serde_json::Value`s; structured formats go
//! through serde, plain emits scalars bare and one line per element.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Parse a config-file output name, falling back to JSON.
pub fn format_from_config(name: &str) -> OutputFormat {
    use clap::ValueEnum;
    OutputFormat::from_str(name, true).unwrap_or(OutputFormat::Json)
}

/// Render any serializable value in the chosen format.
pub fn render<T: Serialize + ?Sized>(format: OutputFormat, data: &T) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?.trim_end().to_owned(),
        OutputFormat::Plain => render_plain(&serde_json::to_value(data)?),
    })
}

fn render_plain(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_plain_inline)
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}\t{}", render_plain_inline(v)))
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

/// Nested values stay on one line.
fn render_plain_inline(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Status line on stderr, green check when stderr is a terminal.
pub fn print_success(message: &str, quiet: bool) {
    if quiet {
        return;
    }
    if io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none() {
        eprintln!("{} {message}", "✓".green());
    } else {
        eprintln!("✓ {message}");
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn plain_lists_one_value_per_line() {
        let data = json!(["Stretch", 3, { "id": 1 }]);
        assert_eq!(
            render(OutputFormat::Plain, &data).unwrap(),
            "Stretch\n3\n{\"id\":1}"
        );
    }

    #[test]
    fn plain_objects_are_tab_separated() {
        let data = json!({ "email": "ada@example.com", "id": 1 });
        assert_eq!(
            render(OutputFormat::Plain, &data).unwrap(),
            "email\tada@example.com\nid\t1"
        );
    }

    #[test]
    fn null_renders_nothing() {
        assert_eq!(render(OutputFormat::Plain, &Value::Null).unwrap(), "");
    }

    #[test]
    fn compact_json_is_single_line() {
        let data = json!({ "a": [1, 2] });
        assert_eq!(render(OutputFormat::JsonCompact, &data).unwrap(), r#"{"a":[1,2]}"#);
        assert!(render(OutputFormat::Json, &data).unwrap().contains('\n'));
    }

    #[test]
    fn yaml_has_no_trailing_newline() {
        let out = render(OutputFormat::Yaml, &json!({ "name": "Read" })).unwrap();
        assert_eq!(out, "name: Read");
    }

    #[test]
    fn unknown_config_format_falls_back_to_json() {
        assert_eq!(format_from_config("yaml"), OutputFormat::Yaml);
        assert_eq!(format_from_config("json-compact"), OutputFormat::JsonCompact);
        assert_eq!(format_from_config("table"), OutputFormat::Json);
    }
}
