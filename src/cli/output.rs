// Output formatting for CLI

use anyhow::Result;
use serde_json::Value;
use std::io::Write;

use crate::cli::OutputFormat;

/// Format and output data
pub struct OutputFormatter {
    format: OutputFormat,
    pub quiet: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    /// Write one file report
    pub fn output_report(&self, report: &Value, writer: &mut dyn Write) -> Result<()> {
        match self.format {
            OutputFormat::Pretty => writeln!(writer, "{}", serde_json::to_string_pretty(report)?)?,
            OutputFormat::Json => writeln!(writer, "{}", serde_json::to_string(report)?)?,
            OutputFormat::KeyValue => self.output_key_value(report, writer)?,
            OutputFormat::Table => self.output_table(report, writer)?,
        }
        Ok(())
    }

    /// Output as sorted `key: value` lines, nested objects flattened with dots
    fn output_key_value(&self, report: &Value, writer: &mut dyn Write) -> Result<()> {
        let mut items = flatten(report);
        items.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, value) in items {
            writeln!(writer, "{}: {}", key, value)?;
        }
        writeln!(writer)?;
        Ok(())
    }

    /// Output as table
    fn output_table(&self, report: &Value, writer: &mut dyn Write) -> Result<()> {
        let items = flatten(report);
        let max_key_len = items.iter().map(|(k, _)| k.len()).max().unwrap_or(0);

        writeln!(writer, "{}", "=".repeat(max_key_len + 30))?;
        for (key, value) in &items {
            writeln!(writer, "{:<width$}{}", format!("{}:", key), value, width = max_key_len + 2)?;
        }
        writeln!(writer, "{}", "=".repeat(max_key_len + 30))?;
        Ok(())
    }

    /// Print success message
    pub fn print_success(&self, message: &str) {
        if !self.quiet {
            eprintln!("✓ {}", message);
        }
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        if !self.quiet {
            eprintln!("  {}", message);
        }
    }
}

/// Leaf values of a JSON document keyed by their dotted path; nulls dropped
fn flatten(value: &Value) -> Vec<(String, String)> {
    let mut items = Vec::new();
    flatten_into(String::new(), value, &mut items);
    items
}

fn flatten_into(prefix: String, value: &Value, items: &mut Vec<(String, String)>) {
    match value {
        Value::Object(obj) => {
            for (key, child) in obj {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(path, child, items);
            }
        }
        Value::Null => {}
        other => {
            let text = format_value(other);
            if !text.is_empty() {
                items.push((prefix, text));
            }
        }
    }
}

/// Format a JSON value for display
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(arr) => arr
            .iter()
            .map(|item| match item {
                Value::Object(obj) => format!("{{{} fields}}", obj.len()),
                other => format_value(other),
            })
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}
